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

use crate::error::{NsyncError, Result};
use crate::locking::recover;
use crate::locking::timeout::{LockTimeoutBudget, LockTimeoutValue};
use log::{error, trace};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::Duration;

/// Counting semaphore allowing up to `capacity` concurrent holders.
///
/// A semaphore with capacity zero never grants a permit.
#[derive(Debug)]
pub struct Semaphore {
    outstanding: Mutex<usize>,
    available: Condvar,
    capacity: usize,
}

impl Semaphore {
    pub fn new(capacity: usize) -> Self {
        Self {
            outstanding: Mutex::new(0),
            available: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks until a permit is available and takes it.
    pub fn acquire(&self) {
        let mut outstanding = recover(self.outstanding.lock());
        while *outstanding >= self.capacity {
            outstanding = recover(self.available.wait(outstanding));
        }
        *outstanding += 1;
    }

    pub fn try_acquire(&self) -> bool {
        let mut outstanding = recover(self.outstanding.lock());
        if *outstanding >= self.capacity {
            return false;
        }
        *outstanding += 1;
        true
    }

    /// Waits at most `timeout` for a permit.
    pub fn try_acquire_timeout(&self, timeout: Duration) -> bool {
        let budget = LockTimeoutBudget::new(LockTimeoutValue::Finite(timeout));
        let mut outstanding = recover(self.outstanding.lock());
        while *outstanding >= self.capacity {
            let remaining = budget.remaining().unwrap_or(Duration::MAX);
            if remaining.is_zero() {
                trace!(
                    "Semaphore acquire timed out after {:.3}s ({} of {} permits held)",
                    budget.elapsed().as_secs_f64(),
                    *outstanding,
                    self.capacity
                );
                return false;
            }
            let (guard, _) = recover(self.available.wait_timeout(outstanding, remaining));
            outstanding = guard;
        }
        *outstanding += 1;
        true
    }

    /// Returns one permit.
    ///
    /// Releasing with no permit outstanding is a bug in the caller: the count is
    /// left unchanged and [`NsyncError::InvariantViolation`] is returned.
    pub fn release(&self) -> Result<()> {
        let mut outstanding = recover(self.outstanding.lock());
        if *outstanding == 0 {
            error!(
                "Semaphore released without a matching acquire (capacity {})",
                self.capacity
            );
            return Err(NsyncError::InvariantViolation(
                "semaphore released without a matching acquire".to_string(),
            ));
        }
        *outstanding -= 1;
        drop(outstanding);
        self.available.notify_one();
        Ok(())
    }

    /// Number of permits currently held. The value may be stale by the time
    /// the caller looks at it.
    pub fn value(&self) -> usize {
        *recover(self.outstanding.lock())
    }

    pub fn permit(&self) -> SemaphorePermit<'_> {
        self.acquire();
        SemaphorePermit { semaphore: self }
    }

    pub fn try_permit(&self) -> Option<SemaphorePermit<'_>> {
        if self.try_acquire() {
            Some(SemaphorePermit { semaphore: self })
        } else {
            None
        }
    }

    pub fn try_permit_timeout(&self, timeout: Duration) -> Option<SemaphorePermit<'_>> {
        if self.try_acquire_timeout(timeout) {
            Some(SemaphorePermit { semaphore: self })
        } else {
            None
        }
    }
}

/// A permit taken from a [`Semaphore`], returned on drop.
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        // A live permit guarantees a non-zero count unless something released
        // it behind our back.
        if let Err(err) = self.semaphore.release()
            && !thread::panicking()
        {
            panic!("{err}");
        }
    }
}
