// SPDX-License-Identifier: GPL-3.0-only

//! Console configuration, stored as JSON

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backends::{DriverKind, LedMode};
use crate::constants::{
    APP_DIR_NAME, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_COMMAND_MAX_LEN, DEFAULT_CONSOLE_ROWS,
    DEFAULT_SYNTHETIC_FPS, TILT_MAX_DEGREES, TILT_MIN_DEGREES,
};
use crate::errors::{AppError, AppResult};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Lines kept in the console scrollback
    pub console_rows: usize,
    /// Maximum command line length, in characters
    pub command_max_len: usize,
    /// Device opened by `open`
    pub device_index: usize,
    /// Sensor driver
    pub driver: DriverKind,
    /// LED mode applied after open
    pub initial_led: LedMode,
    /// Tilt applied after open, in degrees
    pub initial_tilt: i8,
    /// Upper bound for one render-side frame wait
    pub acquire_timeout_ms: u64,
    /// Frame rate of the synthetic sensor
    pub synthetic_fps: u32,
    /// Snapshot directory (defaults to the pictures directory)
    pub snapshot_dir: Option<PathBuf>,
    /// Run `open` when the console starts
    pub open_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            console_rows: DEFAULT_CONSOLE_ROWS,
            command_max_len: DEFAULT_COMMAND_MAX_LEN,
            device_index: 0,
            driver: DriverKind::default(),
            initial_led: LedMode::Green,
            initial_tilt: 0,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT.as_millis() as u64,
            synthetic_fps: DEFAULT_SYNTHETIC_FPS,
            snapshot_dir: None,
            open_on_start: false,
        }
    }
}

impl Config {
    /// `<config dir>/kinect-console/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from the default location, or defaults when there is none
    pub fn load_default() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => {
                warn!("No configuration directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_json(text: &str) -> AppResult<Self> {
        let config: Config = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Clamp values into their usable ranges
    pub fn sanitized(mut self) -> Self {
        self.console_rows = self.console_rows.max(1);
        self.command_max_len = self.command_max_len.max(1);
        self.initial_tilt = self.initial_tilt.clamp(TILT_MIN_DEGREES, TILT_MAX_DEGREES);
        self.acquire_timeout_ms = self.acquire_timeout_ms.max(1);
        self.synthetic_fps = self.synthetic_fps.clamp(1, 120);
        self
    }
}
