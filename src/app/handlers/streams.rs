// SPDX-License-Identifier: GPL-3.0-only

//! Stream triggers and snapshots

use tracing::{info, warn};

use crate::app::ConsoleApp;
use crate::console;
use crate::errors::DeviceError;
use crate::frames::StreamKind;
use crate::storage;

impl ConsoleApp {
    // =========================================================================
    // Feeds
    // =========================================================================

    /// Toggle a stream on the device and in the frame exchange
    ///
    /// The exchange only changes after the driver call succeeded.
    pub(crate) fn handle_trigger(&mut self, stream: StreamKind) {
        if !self.device.open {
            console!(self.console, "Kinect is not open.");
            return;
        }

        let enable = !self.control.enabled().contains(stream);
        let (result, action) = if enable {
            (self.driver.start_stream(stream), "starting")
        } else {
            (self.driver.stop_stream(stream), "stopping")
        };

        if let Err(e) = result {
            let e = match e {
                stream_error @ DeviceError::Stream { .. } => stream_error,
                other => DeviceError::stream(stream, action, other.to_string()),
            };
            warn!(error = %e, "Stream trigger failed");
            console!(self.console, "%s", &e.to_string());
            return;
        }

        self.control.set_enabled(stream, enable);
        info!(stream = %stream, enabled = enable, "Stream toggled");

        let feed = match stream {
            StreamKind::Depth => "Depth",
            StreamKind::Color => "RGB",
        };
        let state = if enable { "started" } else { "stopped" };
        console!(self.console, "%s feed %s", feed, state);
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Save the current front buffer of every enabled stream
    pub(crate) fn handle_snapshot(&mut self) {
        let enabled = self.control.enabled();
        if enabled.is_empty() {
            console!(
                self.console,
                "No stream is active; trigger depth or rgb first."
            );
            return;
        }

        for stream in enabled.iter() {
            let layout = self.receiver.layout(stream);
            let front = self.receiver.front(stream);
            match storage::save_snapshot(&self.snapshot_dir, stream, layout, front) {
                Ok(path) => {
                    console!(self.console, "Snapshot saved: %s", &path.display().to_string());
                }
                Err(e) => {
                    warn!(error = %e, stream = %stream, "Snapshot failed");
                    console!(self.console, "Error saving snapshot: %s", &e.to_string());
                }
            }
        }
    }
}
