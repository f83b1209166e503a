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

/// Helpers for spawning groups of threads that contend on the same primitive.
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Gives spawned contenders time to reach their blocking call.
#[allow(dead_code)]
pub fn settle() {
    thread::sleep(Duration::from_millis(100));
}

/// A batch of threads released together through a shared barrier.
pub struct Contenders<T> {
    handles: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> Contenders<T> {
    /// Spawns `count` threads running `body` and waits until all of them have
    /// passed the start barrier.
    pub fn spawn<F>(count: usize, body: F) -> Self
    where
        F: Fn(usize) -> T + Send + Sync + 'static,
    {
        let barrier = Arc::new(Barrier::new(count + 1));
        let body = Arc::new(body);
        let handles = (0..count)
            .map(|index| {
                let barrier = Arc::clone(&barrier);
                let body = Arc::clone(&body);
                thread::spawn(move || {
                    barrier.wait();
                    body(index)
                })
            })
            .collect();
        barrier.wait();
        Self { handles }
    }

    #[allow(dead_code)]
    pub fn all_running(&self) -> bool {
        self.handles.iter().all(|handle| !handle.is_finished())
    }

    pub fn join(self) -> Vec<T> {
        self.handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    }
}
