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

//! A mutex that grants its lock at most once.
//!
//! The first caller of [`OnceMutex::lock`] becomes the holder. Every caller that
//! arrives while the holder is still working blocks; once the holder calls
//! [`OnceMutex::unlock`] all of them wake up and observe `false`. The instance
//! never grants the lock again, a fresh `OnceMutex` is needed for a new cycle.

use crate::locking::recover;
use log::trace;
use std::sync::{Condvar, Mutex};

#[derive(Debug, Default)]
struct OnceState {
    held: bool,
    used: bool,
}

/// Mutex that can be successfully locked only once over its lifetime.
#[derive(Debug, Default)]
pub struct OnceMutex {
    state: Mutex<OnceState>,
    wake: Condvar,
}

impl OnceMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the mutex is free, then returns `true` if the caller is the
    /// first and only holder or `false` if the mutex has already been used.
    ///
    /// A `true` result obliges the caller to call [`OnceMutex::unlock`].
    pub fn lock(&self) -> bool {
        let mut state = recover(self.state.lock());
        if state.held {
            trace!("once mutex is held, waiting for the holder to finish");
        }
        while state.held {
            state = recover(self.wake.wait(state));
        }
        if state.used {
            return false;
        }
        state.held = true;
        true
    }

    /// Marks the mutex as used and releases it, waking every waiter.
    ///
    /// Must only be called by the caller that received `true` from `lock`.
    pub fn unlock(&self) {
        let mut state = recover(self.state.lock());
        state.used = true;
        state.held = false;
        drop(state);
        self.wake.notify_all();
    }

    /// Returns whether the single lock cycle has completed.
    pub fn is_used(&self) -> bool {
        recover(self.state.lock()).used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn first_lock_succeeds_once() {
        let mutex = OnceMutex::new();
        assert!(!mutex.is_used());
        assert!(mutex.lock());
        mutex.unlock();
        assert!(mutex.is_used());
        assert!(!mutex.lock());
        assert!(!mutex.lock());
    }

    #[test]
    fn failed_lock_leaves_state_untouched() {
        let mutex = OnceMutex::new();
        assert!(mutex.lock());
        mutex.unlock();
        assert!(!mutex.lock());
        // A failed attempt must not leave the mutex held.
        assert!(!mutex.lock());
        assert!(mutex.is_used());
    }

    #[test]
    fn waiters_block_until_unlock_and_then_fail() {
        let mutex = Arc::new(OnceMutex::new());
        assert!(mutex.lock());

        let barrier = Arc::new(Barrier::new(6));
        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    mutex.lock()
                })
            })
            .collect();

        barrier.wait();
        thread::sleep(Duration::from_millis(50));
        assert!(waiters.iter().all(|handle| !handle.is_finished()));

        mutex.unlock();
        for handle in waiters {
            assert!(!handle.join().unwrap());
        }
    }
}
