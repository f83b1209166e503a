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

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn nsync_stress(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nsync-stress").unwrap();
    cmd.env_remove("NSYNC_LOCK_TIMEOUT")
        .env_remove("NSYNC_LOCKING__TIMEOUT")
        .env_remove("NSYNC_SEMAPHORE__CAPACITY")
        .timeout(Duration::from_secs(30))
        .arg("--config-dir")
        .arg(config_dir);
    cmd
}

#[test]
fn test_dedupe_reports_performed_and_skipped() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["dedupe", "--threads", "3", "--keys", "2", "--rounds", "4"])
        .args(["--work-ms", "1"])
        .assert()
        .success()
        .stdout(contains("performed"))
        .stdout(contains("across 2 keys"));
}

#[test]
fn test_semaphore_reports_peak_within_capacity() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["semaphore", "--threads", "3", "--rounds", "2", "--capacity", "2"])
        .args(["--work-ms", "1", "--lock-timeout", "infinite"])
        .assert()
        .success()
        .stdout(contains("acquired 6 / timed out 0"))
        .stdout(contains("timeout infinite from CLI flag"))
        .stdout(contains("of 2"));
}

#[test]
fn test_semaphore_uses_capacity_from_config_file() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("nsync.toml"),
        "[semaphore]\ncapacity = 3\n\n[locking]\ntimeout = \"infinite\"\n",
    )
    .unwrap();

    nsync_stress(temp.path())
        .args(["semaphore", "--threads", "2", "--rounds", "1", "--work-ms", "1"])
        .assert()
        .success()
        .stdout(contains("from configuration file"))
        .stdout(contains("of 3"));
}

#[test]
fn test_semaphore_rejects_zero_capacity_flag() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["semaphore", "--capacity", "0", "--lock-timeout", "infinite"])
        .args(["--threads", "1", "--rounds", "1"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("semaphore capacity must be at least 1"));
}

#[test]
fn test_zero_capacity_in_config_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("nsync.toml"), "[semaphore]\ncapacity = 0\n").unwrap();

    nsync_stress(temp.path())
        .args(["semaphore", "--threads", "1", "--rounds", "1"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("semaphore.capacity must be at least 1"));
}

#[test]
fn test_invalid_lock_timeout_is_rejected() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["semaphore", "--lock-timeout", "soon"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Lock timeout value 'soon' is invalid"));
}

#[test]
fn test_lock_timeout_is_semaphore_only() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["semaphore", "--help"])
        .assert()
        .success()
        .stdout(contains("--lock-timeout"));

    nsync_stress(temp.path())
        .args(["dedupe", "--lock-timeout", "5"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("--lock-timeout"));
}

#[test]
fn test_dedupe_rejects_zero_keys() {
    let temp = TempDir::new().unwrap();
    nsync_stress(temp.path())
        .args(["dedupe", "--keys", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("dedupe needs at least one key"));
}
