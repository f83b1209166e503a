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

//! Contention workloads used by the `nsync-stress` binary.

use crate::error::{NsyncError, Result};
use crate::locking::{LockTimeoutValue, NamedOnceMutex, Semaphore};
use log::{debug, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DedupeOptions {
    pub threads: usize,
    pub keys: usize,
    pub rounds: usize,
    pub work: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeReport {
    /// Lock calls that won the cycle and did the work.
    pub performed: usize,
    /// Lock calls that waited for another holder and skipped the work.
    pub skipped: usize,
    /// Times two holders were observed inside the same key at once.
    pub overlaps: usize,
    pub elapsed: Duration,
}

/// Every thread walks the keys round-robin and asks the registry for each one.
/// Winners "refresh" the key by sleeping for `work`; losers skip it.
pub fn run_dedupe(options: &DedupeOptions) -> Result<DedupeReport> {
    if options.keys == 0 {
        return Err(NsyncError::InvalidConfig(
            "dedupe needs at least one key".to_string(),
        ));
    }

    let registry = NamedOnceMutex::new();
    let holders: Vec<AtomicUsize> = (0..options.keys).map(|_| AtomicUsize::new(0)).collect();
    let started = Instant::now();

    let reports = thread::scope(|scope| {
        let handles: Vec<_> = (0..options.threads)
            .map(|worker| {
                let registry = &registry;
                let holders = &holders;
                scope.spawn(move || {
                    let mut report = DedupeReport::default();
                    for round in 0..options.rounds {
                        let key = (worker + round) % options.keys;
                        if !registry.lock(&key) {
                            report.skipped += 1;
                            continue;
                        }
                        if holders[key].fetch_add(1, Ordering::SeqCst) != 0 {
                            report.overlaps += 1;
                        }
                        thread::sleep(options.work);
                        holders[key].fetch_sub(1, Ordering::SeqCst);
                        registry.unlock(&key);
                        report.performed += 1;
                    }
                    debug!("Dedupe worker {worker} finished: {report:?}");
                    report
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
    });

    let mut total = DedupeReport::default();
    for report in reports {
        let report = report.map_err(|_| {
            NsyncError::InvariantViolation("dedupe worker thread panicked".to_string())
        })?;
        total.performed += report.performed;
        total.skipped += report.skipped;
        total.overlaps += report.overlaps;
    }
    total.elapsed = started.elapsed();
    info!(
        "Dedupe finished in {:.3}s: {} performed, {} skipped",
        total.elapsed.as_secs_f64(),
        total.performed,
        total.skipped
    );

    check_dedupe(&total)?;
    Ok(total)
}

/// Fails when any key had more than one holder at a time.
pub fn check_dedupe(report: &DedupeReport) -> Result<()> {
    if report.overlaps > 0 {
        return Err(NsyncError::ExclusionBreach(format!(
            "{} overlapping holders observed for the same key",
            report.overlaps
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SemaphoreOptions {
    pub threads: usize,
    pub rounds: usize,
    pub capacity: usize,
    pub work: Duration,
    pub timeout: LockTimeoutValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemaphoreReport {
    pub acquired: usize,
    pub timed_out: usize,
    pub peak: usize,
    pub elapsed: Duration,
}

/// Threads repeatedly take a permit, hold it for `work` and give it back while
/// the peak number of simultaneous holders is tracked.
pub fn run_semaphore(options: &SemaphoreOptions) -> Result<SemaphoreReport> {
    if options.capacity == 0 {
        return Err(NsyncError::InvalidConfig(
            "semaphore capacity must be at least 1".to_string(),
        ));
    }

    let semaphore = Semaphore::new(options.capacity);
    let in_use = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let started = Instant::now();

    let results = thread::scope(|scope| {
        let handles: Vec<_> = (0..options.threads)
            .map(|_| {
                let semaphore = &semaphore;
                let in_use = &in_use;
                let peak = &peak;
                scope.spawn(move || -> Result<(usize, usize)> {
                    let (mut acquired, mut timed_out) = (0, 0);
                    for _ in 0..options.rounds {
                        let granted = match options.timeout {
                            LockTimeoutValue::Infinite => {
                                semaphore.acquire();
                                true
                            }
                            LockTimeoutValue::Finite(timeout) => {
                                semaphore.try_acquire_timeout(timeout)
                            }
                        };
                        if !granted {
                            timed_out += 1;
                            continue;
                        }
                        let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(options.work);
                        in_use.fetch_sub(1, Ordering::SeqCst);
                        semaphore.release()?;
                        acquired += 1;
                    }
                    Ok((acquired, timed_out))
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
    });

    let mut report = SemaphoreReport::default();
    for result in results {
        let (acquired, timed_out) = result.map_err(|_| {
            NsyncError::InvariantViolation("semaphore worker thread panicked".to_string())
        })??;
        report.acquired += acquired;
        report.timed_out += timed_out;
    }
    report.peak = peak.load(Ordering::SeqCst);
    report.elapsed = started.elapsed();
    info!(
        "Semaphore run finished in {:.3}s: peak {} of {}",
        report.elapsed.as_secs_f64(),
        report.peak,
        options.capacity
    );

    check_semaphore(&report, options.capacity)?;
    Ok(report)
}

/// Fails when more permits were held at once than the semaphore allows.
pub fn check_semaphore(report: &SemaphoreReport, capacity: usize) -> Result<()> {
    if report.peak > capacity {
        return Err(NsyncError::ExclusionBreach(format!(
            "{} concurrent permits observed with capacity {capacity}",
            report.peak
        )));
    }
    Ok(())
}
