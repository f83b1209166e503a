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

//! Mutex extensions for threads sharing memory.
//!
//! - [`locking::OnceMutex`]: a lock granted at most once.
//! - [`locking::NamedOnceMutex`]: per-key single-use locks that elect one caller
//!   per cycle and make concurrent callers wait for it, then skip the work.
//! - [`locking::TimedMutex`] and [`locking::NamedMutex`]: mutexes with
//!   non-blocking and timed acquisition, plain or keyed.
//! - [`locking::Semaphore`]: a counting semaphore with the same acquisition modes.

pub mod config;
pub mod error;
pub mod locking;
pub mod logging;
pub mod stress;
