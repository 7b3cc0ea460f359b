// SPDX-License-Identifier: GPL-3.0-only

//! Kinect Console - an interactive control console for Kinect depth cameras
//!
//! This library provides the console session, the frame hand-off between the
//! capture thread and the renderer, and the sensor drivers.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Console session, command grammar and handlers
//! - [`backends`]: Sensor driver abstraction and capture thread
//! - [`console`]: Console log, line formatter and command line
//! - [`frames`]: Double-buffered frame exchange and depth palette
//! - [`config`]: User configuration handling
//! - [`storage`]: Snapshot files
//! - [`terminal`]: Terminal front end
//!
//! # Example
//!
//! ```ignore
//! // Typically run via:
//! // kinect-console terminal
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod console;
pub mod constants;
pub mod errors;
pub mod frames;
pub mod storage;
pub mod terminal;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

// Re-export commonly used types
pub use app::{ConsoleApp, Key};
pub use config::Config;
pub use console::Console;
pub use errors::{AppError, AppResult};

/// `<state dir>/kinect-console/kinect-console.log`, used when a terminal UI
/// owns stderr
pub fn default_log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(constants::APP_DIR_NAME)
        .join("kinect-console.log")
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` controls the filter (default `warn`). Logs go to stderr, or
/// are appended to `log_file` when given.
pub fn init_logging(log_file: Option<&Path>) -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    let result = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    };

    result.map_err(|e| AppError::Other(format!("cannot install logger: {}", e)))
}
