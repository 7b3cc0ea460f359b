// SPDX-License-Identifier: GPL-3.0-only

//! Session state shared by the handlers and the front ends

use crate::backends::{DriverLogLevel, LedMode};
use crate::frames::StreamSet;

/// Device-control state as last applied through the console
///
/// Stream enablement is not stored here; the frame exchange owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub open: bool,
    /// Last LED mode applied successfully
    pub led: Option<LedMode>,
    /// Last tilt applied successfully, in degrees
    pub angle: i8,
    pub log_level: Option<DriverLogLevel>,
}

/// Keystrokes understood by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
}

/// Outcome of one render-side frame refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Front buffers of these streams were replaced
    Updated(StreamSet),
    /// No stream is enabled
    Idle,
    /// Enabled streams did not all deliver within the wait bound
    Pending,
    /// The exchange has shut down
    Closed,
}
