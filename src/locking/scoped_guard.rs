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

use crate::locking::named_once::NamedOnceMutex;
use log::debug;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// RAII guard for the holder of a [`NamedOnceMutex`] cycle.
///
/// Dropping the guard (or calling [`NamedOnceGuard::release`]) unlocks the key
/// and wakes every caller waiting on it.
pub struct NamedOnceGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    registry: &'a NamedOnceMutex<K>,
    key: K,
    acquired_at: Instant,
    released: bool,
}

impl<'a, K> NamedOnceGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(registry: &'a NamedOnceMutex<K>, key: K) -> Self {
        Self {
            registry,
            key,
            acquired_at: Instant::now(),
            released: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }

        debug!(
            "Releasing lock cycle after {:.3}s",
            self.acquired_at.elapsed().as_secs_f64()
        );
        self.registry.unlock(&self.key);
        self.released = true;
    }
}

impl<K> Drop for NamedOnceGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<K> fmt::Debug for NamedOnceGuard<'_, K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedOnceGuard")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}
