// SPDX-License-Identifier: GPL-3.0-only

//! Help and quit

use tracing::info;

use crate::app::ConsoleApp;
use crate::app::commands::COMMANDS;
use crate::console;

impl ConsoleApp {
    pub(crate) fn handle_help(&mut self) {
        console!(self.console, "Available commands:");
        for &(name, description) in COMMANDS {
            console!(self.console, "%s : %s", name, description);
        }
    }

    pub(crate) fn handle_quit(&mut self) {
        if self.quit {
            return;
        }
        if self.device.open || self.capture.is_some() {
            info!("Kinect is open, closing before quit");
            self.close_device();
        }
        console!(self.console, "Time to quit. Have a good night.");
        self.quit = true;
    }
}
