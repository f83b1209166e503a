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
use crate::locking::timeout::{LockTimeoutBudget, LockTimeoutValue};
use log::{trace, warn};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Mutex with non-blocking and deadline-bounded acquisition.
///
/// Unlike `std::sync::Mutex` the lock is not tied to a guard's lifetime, so it
/// can be taken in one call and released in another (or on another thread).
/// Use [`TimedMutex::guard`] and friends for scoped use.
#[derive(Debug, Default)]
pub struct TimedMutex {
    locked: Mutex<bool>,
    wake: Condvar,
}

impl TimedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the mutex is acquired.
    pub fn lock(&self) {
        let mut locked = recover(self.locked.lock());
        while *locked {
            locked = recover(self.wake.wait(locked));
        }
        *locked = true;
    }

    /// Acquires the mutex only if it is free right now.
    pub fn try_lock(&self) -> bool {
        let mut locked = recover(self.locked.lock());
        if *locked {
            false
        } else {
            *locked = true;
            true
        }
    }

    /// Waits at most `timeout` for the mutex. A zero timeout behaves like
    /// [`TimedMutex::try_lock`].
    pub fn try_lock_timeout(&self, timeout: Duration) -> bool {
        self.lock_with(LockTimeoutValue::Finite(timeout))
    }

    /// Acquires the mutex within the given budget; an infinite budget blocks
    /// like [`TimedMutex::lock`] and always returns `true`.
    pub fn lock_with(&self, timeout: LockTimeoutValue) -> bool {
        let budget = LockTimeoutBudget::new(timeout);
        let mut locked = recover(self.locked.lock());
        while *locked {
            match budget.remaining() {
                None => locked = recover(self.wake.wait(locked)),
                Some(remaining) if remaining.is_zero() => {
                    trace!(
                        "Timed out after {:.3}s waiting for mutex (budget {timeout})",
                        budget.elapsed().as_secs_f64()
                    );
                    return false;
                }
                Some(remaining) => {
                    let (guard, _) = recover(self.wake.wait_timeout(locked, remaining));
                    locked = guard;
                }
            }
        }
        // Still under the state mutex: the grant and the deadline check cannot interleave.
        *locked = true;
        true
    }

    /// Releases the mutex and wakes one waiter.
    pub fn unlock(&self) {
        let mut locked = recover(self.locked.lock());
        if !*locked {
            warn!("Ignoring unlock of a mutex that is not locked");
            return;
        }
        *locked = false;
        drop(locked);
        self.wake.notify_one();
    }

    pub fn is_locked(&self) -> bool {
        *recover(self.locked.lock())
    }

    pub fn guard(&self) -> TimedMutexGuard<'_> {
        self.lock();
        TimedMutexGuard { mutex: self }
    }

    pub fn try_guard(&self) -> Option<TimedMutexGuard<'_>> {
        if self.try_lock() {
            Some(TimedMutexGuard { mutex: self })
        } else {
            None
        }
    }

    pub fn try_guard_timeout(&self, timeout: Duration) -> Option<TimedMutexGuard<'_>> {
        if self.try_lock_timeout(timeout) {
            Some(TimedMutexGuard { mutex: self })
        } else {
            None
        }
    }
}

/// Unlocks the owning [`TimedMutex`] when dropped.
#[derive(Debug)]
pub struct TimedMutexGuard<'a> {
    mutex: &'a TimedMutex,
}

impl Drop for TimedMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn try_lock_reflects_state() {
        let mutex = TimedMutex::new();
        assert!(mutex.try_lock());
        assert!(!mutex.try_lock());
        assert!(mutex.is_locked());
        mutex.unlock();
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn unlock_when_unlocked_is_ignored() {
        let mutex = TimedMutex::new();
        mutex.unlock();
        assert!(!mutex.is_locked());
        assert!(mutex.try_lock());
        mutex.unlock();
    }

    #[test]
    fn try_lock_timeout_gives_up_after_deadline() {
        let mutex = TimedMutex::new();
        mutex.lock();
        let start = Instant::now();
        assert!(!mutex.try_lock_timeout(Duration::from_millis(60)));
        assert!(start.elapsed() >= Duration::from_millis(60));
        mutex.unlock();
    }

    #[test]
    fn zero_timeout_acts_like_try_lock() {
        let mutex = TimedMutex::new();
        assert!(mutex.try_lock_timeout(Duration::ZERO));
        assert!(!mutex.try_lock_timeout(Duration::ZERO));
        mutex.unlock();
    }

    #[test]
    fn try_lock_timeout_acquires_when_released_in_time() {
        let mutex = Arc::new(TimedMutex::new());
        mutex.lock();
        let releaser = {
            let mutex = Arc::clone(&mutex);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                mutex.unlock();
            })
        };
        assert!(mutex.try_lock_timeout(Duration::from_secs(5)));
        releaser.join().unwrap();
        mutex.unlock();
    }

    #[test]
    fn infinite_budget_blocks_until_available() {
        let mutex = TimedMutex::new();
        assert!(mutex.lock_with(LockTimeoutValue::Infinite));
        mutex.unlock();
    }

    #[test]
    fn guards_unlock_on_drop() {
        let mutex = TimedMutex::new();
        {
            let _guard = mutex.guard();
            assert!(mutex.try_guard().is_none());
            assert!(mutex.try_guard_timeout(Duration::from_millis(5)).is_none());
        }
        assert!(!mutex.is_locked());
        assert!(mutex.try_guard().is_some());
        assert!(!mutex.is_locked());
    }

    #[test]
    fn never_double_grants() {
        let mutex = Arc::new(TimedMutex::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    let mut granted = 0;
                    for _ in 0..200 {
                        if mutex.try_lock_timeout(Duration::from_micros(200)) {
                            assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                            inside.fetch_sub(1, Ordering::SeqCst);
                            mutex.unlock();
                            granted += 1;
                        }
                    }
                    granted
                })
            })
            .collect();
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(total > 0);
        assert!(!mutex.is_locked());
    }
}
