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

mod exit_codes;
mod format;

pub use exit_codes::get_exit_code;
pub use format::format_error_chain;

use crate::locking::timeout::LockTimeoutParseError;
use thiserror::Error;

/// Errors surfaced by this crate.
///
/// Failing to get a lock because it is contended or because a timeout ran out
/// is not an error; those outcomes are reported as `false`.
#[derive(Error, Debug)]
pub enum NsyncError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A stress workload observed more simultaneous holders than allowed.
    #[error("Exclusion breached: {0}")]
    ExclusionBreach(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    InvalidTimeout(#[from] LockTimeoutParseError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NsyncError>;
