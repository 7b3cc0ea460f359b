// SPDX-License-Identifier: GPL-3.0-only

//! Sensor backends
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Console App                   │
//! └───────────────┬──────────────────────────────┘
//!                 │ Arc<dyn SensorDriver>
//! ┌───────────────┴──────────────────────────────┐
//! │  ┌─────────────┐        ┌─────────────────┐  │
//! │  │  Synthetic  │        │    freedepth    │  │
//! │  │  (patterns) │        │   (USB Kinect)  │  │
//! │  └─────────────┘        └─────────────────┘  │
//! └───────────────┬──────────────────────────────┘
//!                 │ process_events → FrameSink
//!          ┌──────┴───────┐
//!          │ Capture loop │ (dedicated thread)
//!          └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`capture_loop`]: capture thread lifecycle
//! - [`synthetic`]: hardware-free sensor for tests and demos
//! - `freedepth`: USB Kinect driver (x86_64, `freedepth` feature)

pub mod capture_loop;
#[cfg(all(target_arch = "x86_64", feature = "freedepth"))]
pub mod freedepth;
mod sensor;
pub mod synthetic;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, AppResult};

pub use sensor::{DeviceAttributes, DriverLogLevel, FrameSink, LedMode, SensorDriver, SubDevices};

/// Available sensor drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Synthetic,
    Freedepth,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverKind::Synthetic => write!(f, "synthetic"),
            DriverKind::Freedepth => write!(f, "freedepth"),
        }
    }
}

/// Instantiate a driver
///
/// `synthetic_fps` paces the synthetic sensor and is ignored otherwise.
pub fn create_driver(kind: DriverKind, synthetic_fps: u32) -> AppResult<Arc<dyn SensorDriver>> {
    info!(driver = %kind, "Creating sensor driver");
    match kind {
        DriverKind::Synthetic => Ok(Arc::new(synthetic::SyntheticSensor::new(synthetic_fps))),
        #[cfg(all(target_arch = "x86_64", feature = "freedepth"))]
        DriverKind::Freedepth => Ok(Arc::new(freedepth::FreedepthSensor::new())),
        #[cfg(not(all(target_arch = "x86_64", feature = "freedepth")))]
        DriverKind::Freedepth => Err(AppError::Config(
            "this build has no freedepth support; rebuild with --features freedepth".to_string(),
        )),
    }
}
