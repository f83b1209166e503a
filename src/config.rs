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
use crate::locking::timeout::{
    LockTimeoutResolution, LockTimeoutResolver, LockTimeoutValue, parse_timeout_override,
};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "nsync.toml";
pub const LOCK_TIMEOUT_ENV: &str = "NSYNC_LOCK_TIMEOUT";

const ENV_PREFIX: &str = "NSYNC";
const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SEMAPHORE_CAPACITY: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NsyncConfig {
    #[serde(default)]
    pub locking: LockingConfig,

    #[serde(default)]
    pub semaphore: SemaphoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockingConfig {
    /// Seconds, milliseconds with an `ms` suffix, or `infinite`.
    #[serde(default = "default_lock_timeout")]
    pub timeout: String,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            timeout: default_lock_timeout(),
        }
    }
}

impl LockingConfig {
    pub fn timeout_value(&self) -> Result<LockTimeoutValue> {
        Ok(parse_timeout_override(&self.timeout)?)
    }

    pub fn set_timeout_value(&mut self, value: LockTimeoutValue) {
        self.timeout = value.to_string();
    }
}

fn default_lock_timeout() -> String {
    DEFAULT_LOCK_TIMEOUT_SECS.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemaphoreConfig {
    #[serde(default = "default_semaphore_capacity")]
    pub capacity: usize,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_SEMAPHORE_CAPACITY,
        }
    }
}

fn default_semaphore_capacity() -> usize {
    DEFAULT_SEMAPHORE_CAPACITY
}

impl NsyncConfig {
    /// Loads defaults, then `<config_dir>/nsync.toml` if present, then
    /// `NSYNC_*` environment variables (`NSYNC_SEMAPHORE__CAPACITY=8`).
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            log::debug!("Config file not found at {config_path:?}, using defaults");
        }

        let settings = Config::builder()
            .add_source(
                File::from(config_path.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: NsyncConfig = settings.try_deserialize()?;
        config.validate()?;
        log::debug!("Loaded config from {config_path:?}");
        Ok(config)
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        fs::create_dir_all(config_dir)?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| NsyncError::InvalidConfig(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, contents)?;
        log::debug!("Saved config to {config_path:?}");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.locking.timeout_value()?;
        if self.semaphore.capacity == 0 {
            return Err(NsyncError::InvalidConfig(
                "semaphore.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves the effective lock timeout with CLI > `NSYNC_LOCK_TIMEOUT` >
    /// config file > built-in default precedence.
    pub fn resolve_timeout(&self, cli_override: Option<&str>) -> Result<LockTimeoutResolution> {
        let env_override = std::env::var(LOCK_TIMEOUT_ENV).ok();
        let resolution = LockTimeoutResolver::new(
            cli_override,
            env_override.as_deref(),
            self.locking.timeout_value()?,
            LockTimeoutValue::from_secs(DEFAULT_LOCK_TIMEOUT_SECS),
        )
        .resolve()?;
        log::debug!(
            "Lock timeout resolved to {} from {}",
            resolution.value,
            resolution.source
        );
        Ok(resolution)
    }
}
