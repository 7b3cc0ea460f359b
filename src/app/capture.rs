// SPDX-License-Identifier: GPL-3.0-only

//! State owned by the capture thread

use std::sync::Arc;

use tracing::warn;

use crate::backends::SensorDriver;
use crate::backends::capture_loop::LoopAction;
use crate::console;
use crate::console::Console;
use crate::frames::{FrameControl, FramePublisher, StreamKind};

pub(crate) const CAPTURE_THREAD_NAME: &str = "kinect-capture";

/// Everything the capture thread touches; returned to the app on join
pub(crate) struct CaptureState {
    pub driver: Arc<dyn SensorDriver>,
    pub publisher: FramePublisher,
    pub control: FrameControl,
    pub console: Console,
}

impl CaptureState {
    /// One event-processing iteration
    pub fn pump(&mut self) -> LoopAction {
        match self.driver.process_events(&mut self.publisher) {
            Ok(_) => LoopAction::Continue,
            Err(e) => {
                warn!(error = %e, "Event processing failed");
                console!(self.console, "Capture stopped: %s", &e.to_string());
                LoopAction::Stop
            }
        }
    }

    pub fn teardown(&mut self) {
        teardown(self.driver.as_ref(), &self.control, &self.console);
    }
}

/// Stop active streams, disable them in the exchange and close the device
pub(crate) fn teardown(driver: &dyn SensorDriver, control: &FrameControl, console: &Console) {
    console!(console, "Shutting Down Streams...");

    let active = driver.active_streams();
    for stream in active.iter() {
        match stream {
            StreamKind::Depth => console!(console, "Stopping depth stream."),
            StreamKind::Color => console!(console, "Stopping rgb stream."),
        }
        if let Err(e) = driver.stop_stream(stream) {
            console!(console, "%s", &e.to_string());
        }
    }
    control.disable_all();

    console!(console, "Closing device.");
    if let Err(e) = driver.close() {
        console!(console, "Error closing device: %s", &e.to_string());
    }
}
