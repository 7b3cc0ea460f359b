// SPDX-License-Identifier: GPL-3.0-only

//! Device handlers
//!
//! Scanning, open/close and subdevice selection.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::app::ConsoleApp;
use crate::app::capture::{self, CAPTURE_THREAD_NAME, CaptureState};
use crate::backends::SubDevices;
use crate::backends::capture_loop::CaptureLoop;
use crate::console;

impl ConsoleApp {
    // =========================================================================
    // Discovery
    // =========================================================================

    pub(crate) fn handle_scan(&mut self) {
        console!(self.console, "Scanning for devices.");
        match self.driver.device_count() {
            Ok(0) => console!(self.console, "No Kinect found."),
            Ok(count) => console!(self.console, "Number of devices found: %d", count),
            Err(e) => console!(self.console, "Error scanning for devices: %s", &e.to_string()),
        }
    }

    pub(crate) fn handle_list_attributes(&mut self) {
        console!(self.console, "Getting attributes.");
        match self.driver.device_attributes() {
            Ok(devices) if devices.is_empty() => console!(self.console, "No Kinect found."),
            Ok(devices) => {
                for device in &devices {
                    console!(self.console, "Kinect serial: %s", &device.serial);
                }
            }
            Err(e) => console!(
                self.console,
                "Error in getting Kinect attributes: %s",
                &e.to_string()
            ),
        }
    }

    // =========================================================================
    // Subdevices
    // =========================================================================

    pub(crate) fn handle_list_supported_subdevices(&mut self) {
        console!(self.console, "Getting Subdevices.");
        let supported = self.driver.supported_subdevices();
        if supported.is_empty() {
            console!(self.console, "No subdevices are supported.");
        }
        for name in supported.names() {
            console!(self.console, "%s is supported.", name);
        }
    }

    pub(crate) fn handle_list_selected_subdevices(&mut self) {
        console!(self.console, "Getting selected Subdevices.");
        for name in self.driver.selected_subdevices().names() {
            console!(self.console, "%s is selected.", name);
        }
    }

    pub(crate) fn handle_select_subdevices(&mut self, subdevices: SubDevices) {
        console!(self.console, "Selecting subdevices.");
        if let Err(e) = self.driver.select_subdevices(subdevices) {
            console!(self.console, "Error selecting subdevices: %s", &e.to_string());
            return;
        }

        console!(self.console, "The following subdevices are selected:");
        for name in subdevices.names() {
            console!(self.console, "%s.", name);
        }
        console!(
            self.console,
            "Note: Only selected subdevices will be activated by the next open call"
        );
    }

    // =========================================================================
    // Open / Close
    // =========================================================================

    pub(crate) fn handle_open(&mut self) {
        if self.device.open {
            console!(self.console, "Kinect is already open.");
            return;
        }

        console!(self.console, "Opening Device.");
        if let Err(e) = self.driver.open(self.config.device_index) {
            console!(self.console, "Could not locate Kinect: %s", &e.to_string());
            return;
        }

        console!(self.console, "Starting Thread.");
        let Some(publisher) = self.publisher.take() else {
            error!("Frame publisher missing while no capture thread runs");
            return;
        };

        let state = CaptureState {
            driver: Arc::clone(&self.driver),
            publisher,
            control: self.control.clone(),
            console: self.console.clone(),
        };

        match CaptureLoop::start(
            CAPTURE_THREAD_NAME,
            state,
            CaptureState::pump,
            CaptureState::teardown,
        ) {
            Ok(capture) => self.capture = Some(capture),
            Err(e) => {
                error!(error = %e, "Failed to spawn capture thread");
                console!(self.console, "Could not create thread: %s", &e.to_string());
                self.rebuild_exchange();
                if let Err(e) = self.driver.close() {
                    warn!(error = %e, "Failed to close device after thread error");
                }
                return;
            }
        }

        self.device.open = true;
        info!(index = self.config.device_index, "Kinect opened");
        console!(self.console, "Kinect is open.");

        let led = self.config.initial_led;
        self.handle_set_led(led);
        let tilt = self.config.initial_tilt;
        self.handle_set_angle(tilt.into());
    }

    pub(crate) fn handle_close(&mut self) {
        if !self.device.open && self.capture.is_none() {
            console!(self.console, "Kinect is not open.");
            return;
        }
        self.close_device();
        if self.device.open {
            console!(self.console, "Kinect is still open.");
        } else {
            console!(self.console, "Kinect is closed.");
        }
    }

    /// Stop capture and close the device
    ///
    /// Teardown runs on the capture thread when it is alive, and inline
    /// otherwise.
    pub(crate) fn close_device(&mut self) {
        if self.capture.is_some() {
            self.stop_capture();
        } else if self.driver.is_open() {
            capture::teardown(self.driver.as_ref(), &self.control, &self.console);
        }

        self.device.open = self.driver.is_open();
        if !self.device.open {
            self.device.led = None;
            self.device.angle = 0;
        }
    }
}
