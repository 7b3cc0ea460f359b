// SPDX-License-Identifier: GPL-3.0-only

//! Tilt, LED and driver log level

use tracing::{info, warn};

use crate::app::ConsoleApp;
use crate::backends::{DriverLogLevel, LedMode};
use crate::console;
use crate::constants::{TILT_MAX_DEGREES, TILT_MIN_DEGREES};

impl ConsoleApp {
    // =========================================================================
    // Tilt
    // =========================================================================

    pub(crate) fn handle_set_angle(&mut self, angle: i64) {
        if angle > i64::from(TILT_MAX_DEGREES) {
            console!(self.console, "Maximum angle %d.", TILT_MAX_DEGREES);
            return;
        }
        if angle < i64::from(TILT_MIN_DEGREES) {
            console!(self.console, "Minimum angle %d.", TILT_MIN_DEGREES);
            return;
        }
        if !self.device.open {
            console!(self.console, "Kinect is not open.");
            return;
        }

        // Range checked above
        let degrees = angle as i8;
        match self.driver.set_tilt(degrees) {
            Ok(()) => {
                self.device.angle = degrees;
                info!(degrees, "Tilt set");
                console!(self.console, "Angle set to %d degrees", degrees);
            }
            Err(e) => {
                warn!(error = %e, degrees, "Failed to set tilt");
                console!(self.console, "Error setting angle: %s", &e.to_string());
            }
        }
    }

    // =========================================================================
    // LED
    // =========================================================================

    pub(crate) fn handle_set_led(&mut self, mode: LedMode) {
        if !self.device.open {
            console!(self.console, "Kinect is not open.");
            return;
        }

        let name = mode.to_string();
        match self.driver.set_led(mode) {
            Ok(()) => {
                self.device.led = Some(mode);
                info!(led = %mode, "LED set");
                console!(self.console, "LED set to %s", &name);
            }
            Err(e) => {
                warn!(error = %e, led = %mode, "Failed to set LED");
                console!(
                    self.console,
                    "Error setting LED to %s: %s",
                    &name,
                    &e.to_string()
                );
            }
        }
    }

    // =========================================================================
    // Driver log level
    // =========================================================================

    pub(crate) fn handle_set_log_level(&mut self, level: DriverLogLevel) {
        match self.driver.set_log_level(level) {
            Ok(()) => {
                self.device.log_level = Some(level);
                info!(level = %level, "Driver log level set");
                console!(self.console, "Log level set to %s", level.name());
            }
            Err(e) => {
                console!(self.console, "Error setting log level: %s", &e.to_string());
            }
        }
    }
}
