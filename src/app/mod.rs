// SPDX-License-Identifier: GPL-3.0-only

//! Console application
//!
//! `ConsoleApp` owns the session: the console log, the command line, the
//! sensor driver, the render-side frame receiver and the capture thread.
//! Front ends feed keys in and read frames and console lines out.
//!
//! # Architecture
//!
//! - `state`: device state, keys and frame refresh outcomes
//! - `commands`: command grammar and help table
//! - `handlers`: command handlers grouped by domain
//! - `capture`: state owned by the capture thread

mod capture;
pub mod commands;
mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backends::SensorDriver;
use crate::backends::capture_loop::CaptureLoop;
use crate::config::Config;
use crate::console;
use crate::console::{CommandLine, Console, InputRejected};
use crate::frames::{
    Acquire, FrameControl, FrameLayout, FramePublisher, FrameReceiver, StreamKind, StreamSet,
    frame_exchange,
};
use crate::storage;

use capture::CaptureState;
use commands::{Command, CommandError};

pub use state::{DeviceState, FrameStatus, Key};

/// Interactive Kinect control session
pub struct ConsoleApp {
    config: Config,
    console: Console,
    command_line: CommandLine,
    driver: Arc<dyn SensorDriver>,
    control: FrameControl,
    receiver: FrameReceiver,
    /// Parked here while no capture thread runs
    publisher: Option<FramePublisher>,
    capture: Option<CaptureLoop<CaptureState>>,
    device: DeviceState,
    snapshot_dir: PathBuf,
    quit: bool,
}

impl ConsoleApp {
    pub fn new(config: Config, driver: Arc<dyn SensorDriver>) -> Self {
        let (publisher, receiver, control) =
            frame_exchange(FrameLayout::KINECT_RGB, FrameLayout::KINECT_RGB);
        let snapshot_dir = config
            .snapshot_dir
            .clone()
            .unwrap_or_else(storage::default_snapshot_dir);

        info!(
            driver = driver.name(),
            console_rows = config.console_rows,
            "Console application created"
        );

        let mut app = Self {
            console: Console::new(config.console_rows),
            command_line: CommandLine::new(config.command_max_len),
            driver,
            control,
            receiver,
            publisher: Some(publisher),
            capture: None,
            device: DeviceState::default(),
            snapshot_dir,
            quit: false,
            config,
        };

        console!(app.console, "Console is ready.");
        if app.config.open_on_start {
            app.handle_open();
        }
        app
    }

    /// Feed one keystroke
    pub fn handle_key(&mut self, key: Key) {
        match key {
            Key::Char(ch) => match self.command_line.push(ch) {
                Ok(()) => {}
                Err(InputRejected::LimitReached { limit }) => {
                    console!(
                        self.console,
                        "Command line limit of %d characters reached.",
                        limit
                    );
                }
                Err(rejected) => debug!(%rejected, "Key ignored"),
            },
            Key::Backspace => {
                self.command_line.backspace();
            }
            Key::Enter => {
                let mut line = std::mem::take(&mut self.command_line);
                line.submit(|text| self.execute(text));
                self.command_line = line;
            }
            Key::Escape => self.handle_quit(),
        }
    }

    /// Parse and run one command line
    pub fn execute(&mut self, line: &str) {
        debug!(line, "Processing command");
        console!(self.console, "> %s", line);

        match Command::parse(line) {
            Ok(command) => self.dispatch(command),
            Err(CommandError::Usage(usage)) => self.console.push_line(usage),
            Err(CommandError::InvalidAngle(value)) => {
                console!(self.console, "Invalid angle: %s", &value);
            }
            Err(CommandError::Unknown(name)) => {
                console!(
                    self.console,
                    "Invalid command: %s. Type help for a list of commands.",
                    &name
                );
            }
        }
    }

    fn dispatch(&mut self, command: Command) {
        self.reap_capture();

        match command {
            Command::Help => self.handle_help(),
            Command::Scan => self.handle_scan(),
            Command::Open => self.handle_open(),
            Command::Close => self.handle_close(),
            Command::Quit => self.handle_quit(),
            Command::Trigger(stream) => self.handle_trigger(stream),
            Command::SetAngle(angle) => self.handle_set_angle(angle),
            Command::SetLed(mode) => self.handle_set_led(mode),
            Command::SetLogLevel(level) => self.handle_set_log_level(level),
            Command::ListKinectAttribute => self.handle_list_attributes(),
            Command::ListSupportedSubDevices => self.handle_list_supported_subdevices(),
            Command::ListSelectedSubDevices => self.handle_list_selected_subdevices(),
            Command::SelectSubDevices(subdevices) => self.handle_select_subdevices(subdevices),
            Command::Snapshot => self.handle_snapshot(),
        }
    }

    /// Wait for fresh frames and swap them to the front
    pub fn refresh_frames(&mut self) -> FrameStatus {
        self.reap_capture();

        match self.receiver.acquire_timeout(self.config.acquire_timeout()) {
            Acquire::Ready(front) => FrameStatus::Updated(front.updated),
            Acquire::Idle => FrameStatus::Idle,
            Acquire::TimedOut => FrameStatus::Pending,
            Acquire::Closed => FrameStatus::Closed,
        }
    }

    /// Front buffer of a stream as of the last refresh
    pub fn front(&self, stream: StreamKind) -> &[u8] {
        self.receiver.front(stream)
    }

    pub fn layout(&self, stream: StreamKind) -> FrameLayout {
        self.receiver.layout(stream)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn command_text(&self) -> &str {
        self.command_line.as_str()
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn enabled_streams(&self) -> StreamSet {
        self.control.enabled()
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Stop capture and close the device; safe to call repeatedly
    pub fn shutdown(&mut self) {
        if self.capture.is_some() || self.driver.is_open() {
            self.close_device();
        }
        self.control.close();
    }

    /// Pick up a capture thread that ended on its own
    fn reap_capture(&mut self) {
        let finished = self.capture.as_ref().is_some_and(|c| !c.is_running());
        if finished {
            warn!("Capture thread ended unexpectedly");
            self.stop_capture();
            self.device.open = self.driver.is_open();
            if !self.device.open {
                self.device.led = None;
                self.device.angle = 0;
            }
        }
    }

    /// Stop the capture thread and park its publisher
    fn stop_capture(&mut self) {
        let Some(mut capture) = self.capture.take() else {
            return;
        };
        match capture.stop() {
            Some(state) => self.publisher = Some(state.publisher),
            None => self.rebuild_exchange(),
        }
    }

    /// Replace the exchange after its publisher was lost
    fn rebuild_exchange(&mut self) {
        warn!("Frame publisher lost, rebuilding frame exchange");
        self.control.close();
        let (publisher, receiver, control) =
            frame_exchange(FrameLayout::KINECT_RGB, FrameLayout::KINECT_RGB);
        self.publisher = Some(publisher);
        self.receiver = receiver;
        self.control = control;
    }
}

impl Drop for ConsoleApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests;
