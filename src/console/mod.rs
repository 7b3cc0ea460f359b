// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-depth scrollback console
//!
//! The console is the only user-visible output of the application. Lines are
//! rendered with [`format_line`] and pushed into a FIFO that always holds
//! exactly `depth` lines, oldest first.

pub mod command_line;
mod format;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::constants::FORMAT_ERROR_LINE;

pub use command_line::{CommandLine, InputRejected};
pub use format::{FormatArg, format_line};

/// Print a formatted line to a [`Console`]
///
/// ```ignore
/// console!(console, "Angle set to %d degrees", angle);
/// ```
#[macro_export]
macro_rules! console {
    ($console:expr, $template:expr $(,)?) => {
        $console.print($template, &[])
    };
    ($console:expr, $template:expr, $($arg:expr),+ $(,)?) => {
        $console.print(
            $template,
            &[$($crate::console::FormatArg::from($arg)),+],
        )
    };
}

/// K most recent lines, oldest at index 0
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    lines: VecDeque<String>,
    pushed: u64,
}

impl ConsoleLog {
    /// Log of `depth` empty placeholder lines
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            lines: std::iter::repeat_with(String::new).take(depth).collect(),
            pushed: 0,
        }
    }

    /// Append a line, evicting the oldest
    pub fn push(&mut self, line: String) {
        self.lines.pop_front();
        self.lines.push_back(line);
        self.pushed += 1;
    }

    pub fn depth(&self) -> usize {
        self.lines.len()
    }

    /// Total lines pushed since creation
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// Shared handle to the console log
#[derive(Debug, Clone)]
pub struct Console {
    log: Arc<Mutex<ConsoleLog>>,
}

impl Console {
    pub fn new(depth: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(ConsoleLog::new(depth))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConsoleLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push an already rendered line
    pub fn push_line(&self, line: impl Into<String>) {
        let line = line.into();
        debug!(target: "console", "{}", line);
        self.lock().push(line);
    }

    /// Render and push a line; formatting failures push a diagnostic instead
    pub fn print(&self, template: &str, args: &[FormatArg<'_>]) {
        match format_line(template, args) {
            Ok(line) => self.push_line(line),
            Err(e) => {
                warn!(error = %e, template, "Console line formatting failed");
                self.push_line(FORMAT_ERROR_LINE);
            }
        }
    }

    /// Copy of all lines, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    pub fn pushed(&self) -> u64 {
        self.lock().pushed()
    }

    /// Lines pushed after sequence number `seen`, and the new sequence number
    ///
    /// Lines already evicted from the log are skipped.
    pub fn lines_since(&self, seen: u64) -> (Vec<String>, u64) {
        let log = self.lock();
        let fresh = log.pushed.saturating_sub(seen).min(log.depth() as u64) as usize;
        let lines = log.lines.iter().skip(log.depth() - fresh).cloned().collect();
        (lines, log.pushed)
    }
}
