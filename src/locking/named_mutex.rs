// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::locking::recover;
use crate::locking::timed_mutex::TimedMutex;
use log::trace;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Map of [`TimedMutex`] instances created on first use for each key.
///
/// Entries live as long as the registry: a key's mutex can be locked and
/// unlocked any number of times. Keys only need `Eq + Hash + Clone`.
pub struct NamedMutex<K> {
    locks: Mutex<HashMap<K, Arc<TimedMutex>>>,
}

impl<K> NamedMutex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the mutex for `key`.
    ///
    /// Repeated calls with the same key return the same `Arc`.
    pub fn mutex(&self, key: &K) -> Arc<TimedMutex> {
        let mut locks = recover(self.locks.lock());
        Arc::clone(locks.entry(key.clone()).or_insert_with(|| {
            trace!("Creating mutex for a new key");
            Arc::new(TimedMutex::new())
        }))
    }

    pub fn lock(&self, key: &K) {
        self.mutex(key).lock();
    }

    pub fn try_lock(&self, key: &K) -> bool {
        self.mutex(key).try_lock()
    }

    pub fn try_lock_timeout(&self, key: &K, timeout: Duration) -> bool {
        self.mutex(key).try_lock_timeout(timeout)
    }

    /// Releases the mutex for `key`. Keys that were never locked are ignored
    /// and no entry is created for them.
    pub fn unlock(&self, key: &K) {
        let existing = recover(self.locks.lock()).get(key).cloned();
        match existing {
            Some(mutex) => mutex.unlock(),
            None => trace!("Ignoring unlock for a key that was never locked"),
        }
    }

    /// Number of keys that have a mutex.
    pub fn len(&self) -> usize {
        recover(self.locks.lock()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for NamedMutex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for NamedMutex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = recover(self.locks.lock()).len();
        f.debug_struct("NamedMutex").field("keys", &keys).finish()
    }
}
