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

//! Registry of single-use mutexes keyed by an arbitrary identifier.
//!
//! The first `lock` for a key creates a [`OnceMutex`], takes it and returns
//! `true`. Concurrent `lock` calls for the same key block until the holder
//! calls `unlock`, then return `false`. `unlock` evicts the mutex, so the next
//! `lock` for that key starts a new cycle and succeeds again.
//!
//! This lets a group of callers that all want to refresh the same cached value
//! elect one of them to do the work while the rest wait for it and skip it.

use crate::locking::once_mutex::OnceMutex;
use crate::locking::recover;
use crate::locking::scoped_guard::NamedOnceGuard;
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// Keys only need `Eq + Hash + Clone`; they are never formatted.
pub struct NamedOnceMutex<K> {
    locks: Mutex<HashMap<K, Arc<OnceMutex>>>,
}

impl<K> NamedOnceMutex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Attempts to become the holder for `key`.
    ///
    /// Returns `true` immediately when no cycle is in flight for `key`. Otherwise
    /// blocks until the current holder unlocks and returns `false`. The registry
    /// map is never held while blocking, so other keys stay available.
    pub fn lock(&self, key: &K) -> bool {
        let mut locks = recover(self.locks.lock());
        if let Some(existing) = locks.get(key) {
            let existing = Arc::clone(existing);
            drop(locks);
            trace!("Lock cycle in flight, waiting for its holder");
            return existing.lock();
        }

        let fresh = Arc::new(OnceMutex::new());
        // Nobody else can reach `fresh` before it is inserted.
        let acquired = fresh.lock();
        debug_assert!(acquired);
        locks.insert(key.clone(), fresh);
        debug!("Started lock cycle ({} in flight)", locks.len());
        true
    }

    /// Ends the cycle for `key`, waking every caller blocked in [`lock`].
    ///
    /// The entry is removed before its mutex is released: a caller arriving
    /// after this point starts a new cycle instead of joining the old one.
    /// Unlocking a key with no cycle in flight does nothing.
    ///
    /// [`lock`]: NamedOnceMutex::lock
    pub fn unlock(&self, key: &K) {
        let evicted = recover(self.locks.lock()).remove(key);
        match evicted {
            Some(mutex) => {
                mutex.unlock();
                debug!("Finished lock cycle");
            }
            None => trace!("Ignoring unlock: no lock cycle in flight for the key"),
        }
    }

    /// Like [`NamedOnceMutex::lock`] but returns a guard that unlocks the key
    /// when dropped. `None` means another caller held the key and has finished.
    pub fn lock_scoped(&self, key: K) -> Option<NamedOnceGuard<'_, K>> {
        if self.lock(&key) {
            Some(NamedOnceGuard::new(self, key))
        } else {
            None
        }
    }

    /// Number of keys with a lock cycle in flight.
    pub fn len(&self) -> usize {
        recover(self.locks.lock()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for NamedOnceMutex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for NamedOnceMutex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = recover(self.locks.lock()).len();
        f.debug_struct("NamedOnceMutex")
            .field("in_flight", &in_flight)
            .finish()
    }
}
