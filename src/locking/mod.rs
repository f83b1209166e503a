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

pub mod named_mutex;
pub mod named_once;
pub mod once_mutex;
pub mod scoped_guard;
pub mod semaphore;
pub mod timed_mutex;
pub mod timeout;

pub use named_mutex::NamedMutex;
pub use named_once::NamedOnceMutex;
pub use once_mutex::OnceMutex;
pub use scoped_guard::NamedOnceGuard;
pub use semaphore::{Semaphore, SemaphorePermit};
pub use timed_mutex::{TimedMutex, TimedMutexGuard};
pub use timeout::{
    LockTimeoutBudget, LockTimeoutResolution, LockTimeoutResolver, LockTimeoutSource,
    LockTimeoutValue, parse_timeout_override,
};

use std::sync::{LockResult, PoisonError};

// Every guarded state update in this module is a single assignment, so a
// panic while holding a std mutex cannot leave torn state behind.
pub(crate) fn recover<T>(result: LockResult<T>) -> T {
    result.unwrap_or_else(PoisonError::into_inner)
}
