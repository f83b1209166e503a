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

use clap::{Parser, Subcommand};
use nsync::config::NsyncConfig;
use nsync::error::{Result, format_error_chain, get_exit_code};
use nsync::logging;
use nsync::stress::{self, DedupeOptions, SemaphoreOptions};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "nsync-stress")]
#[command(author, version, about = "Exercise nsync locks under contention", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory containing nsync.toml (defaults to the current directory)
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Elect one worker per key with a named once-mutex; the rest skip the work
    Dedupe {
        /// Number of worker threads
        #[arg(long, default_value_t = 8)]
        threads: usize,

        /// Number of distinct keys
        #[arg(long, default_value_t = 4)]
        keys: usize,

        /// Lock attempts per thread
        #[arg(long, default_value_t = 50)]
        rounds: usize,

        /// Simulated work per successful lock, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 2)]
        work_ms: u64,
    },

    /// Contend on a counting semaphore and report peak concurrency
    Semaphore {
        /// Number of worker threads
        #[arg(long, default_value_t = 8)]
        threads: usize,

        /// Acquire attempts per thread
        #[arg(long, default_value_t = 50)]
        rounds: usize,

        /// Permit count (overrides semaphore.capacity from the config)
        #[arg(long)]
        capacity: Option<usize>,

        /// Simulated work per permit, in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 2)]
        work_ms: u64,

        /// Acquire timeout: seconds, milliseconds with 'ms' suffix, or 'infinite'.
        /// Dedupe has no timeout; once-mutex attempts never wait.
        #[arg(long, value_name = "TIMEOUT")]
        lock_timeout: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", format_error_chain(&e));
        std::process::exit(get_exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir.unwrap_or_else(|| PathBuf::from("."));
    let config = NsyncConfig::load(&config_dir)?;

    match cli.command {
        Commands::Dedupe {
            threads,
            keys,
            rounds,
            work_ms,
        } => {
            let report = stress::run_dedupe(&DedupeOptions {
                threads,
                keys,
                rounds,
                work: Duration::from_millis(work_ms),
            })?;
            println!(
                "performed {} / skipped {} across {keys} keys in {:.3}s",
                report.performed,
                report.skipped,
                report.elapsed.as_secs_f64()
            );
            stress::check_dedupe(&report)?;
        }
        Commands::Semaphore {
            threads,
            rounds,
            capacity,
            work_ms,
            lock_timeout,
        } => {
            let resolution = config.resolve_timeout(lock_timeout.as_deref())?;
            let capacity = capacity.unwrap_or(config.semaphore.capacity);
            let report = stress::run_semaphore(&SemaphoreOptions {
                threads,
                rounds,
                capacity,
                work: Duration::from_millis(work_ms),
                timeout: resolution.value,
            })?;
            println!(
                "acquired {} / timed out {} (timeout {} from {}), peak {} of {capacity} in {:.3}s",
                report.acquired,
                report.timed_out,
                resolution.value,
                resolution.source,
                report.peak,
                report.elapsed.as_secs_f64()
            );
            stress::check_semaphore(&report, capacity)?;
        }
    }

    Ok(())
}
