// SPDX-License-Identifier: GPL-3.0-only

//! Sensor driver interface
//!
//! A driver owns the device connection. All methods take `&self` so the
//! capture thread can pump events while the command thread adjusts tilt or
//! LED state; implementations guard their state internally.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DeviceError;
use crate::frames::{FramePublisher, StreamKind, StreamSet};

/// Receiver of decoded frames delivered by [`SensorDriver::process_events`]
pub trait FrameSink {
    /// 11-bit depth samples, row-major
    fn depth_ready(&mut self, samples: &[u16]);
    /// RGB24 pixels, row-major
    fn color_ready(&mut self, rgb: &[u8], timestamp: u32);
}

impl FrameSink for FramePublisher {
    fn depth_ready(&mut self, samples: &[u16]) {
        self.publish_depth(samples);
    }

    fn color_ready(&mut self, rgb: &[u8], _timestamp: u32) {
        self.publish_color(rgb);
    }
}

/// LED modes supported by the Kinect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedMode {
    Off,
    Green,
    Red,
    Yellow,
    BlinkGreen,
    BlinkRedYellow,
}

impl LedMode {
    /// Parse the words following `set led`
    pub fn from_words(words: &[&str]) -> Option<Self> {
        match words {
            ["off"] => Some(LedMode::Off),
            ["green"] => Some(LedMode::Green),
            ["red"] => Some(LedMode::Red),
            ["yellow"] => Some(LedMode::Yellow),
            ["blink", "green"] => Some(LedMode::BlinkGreen),
            ["blink", "red"] => Some(LedMode::BlinkRedYellow),
            _ => None,
        }
    }
}

impl fmt::Display for LedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedMode::Off => "off",
            LedMode::Green => "green",
            LedMode::Red => "red",
            LedMode::Yellow => "yellow",
            LedMode::BlinkGreen => "blinking green",
            LedMode::BlinkRedYellow => "blinking red and yellow",
        };
        write!(f, "{}", name)
    }
}

/// Driver-side log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DriverLogLevel {
    Fatal,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    Spew,
    Flood,
}

impl DriverLogLevel {
    pub const ALL: [DriverLogLevel; 8] = [
        DriverLogLevel::Fatal,
        DriverLogLevel::Error,
        DriverLogLevel::Warning,
        DriverLogLevel::Notice,
        DriverLogLevel::Info,
        DriverLogLevel::Debug,
        DriverLogLevel::Spew,
        DriverLogLevel::Flood,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DriverLogLevel::Fatal => "fatal",
            DriverLogLevel::Error => "error",
            DriverLogLevel::Warning => "warning",
            DriverLogLevel::Notice => "notice",
            DriverLogLevel::Info => "info",
            DriverLogLevel::Debug => "debug",
            DriverLogLevel::Spew => "spew",
            DriverLogLevel::Flood => "flood",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.name() == name)
    }
}

impl fmt::Display for DriverLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Bitmask of Kinect subdevices (motor = 1, camera = 2, audio = 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubDevices(u8);

impl SubDevices {
    pub const MOTOR: SubDevices = SubDevices(1);
    pub const CAMERA: SubDevices = SubDevices(2);
    pub const AUDIO: SubDevices = SubDevices(4);
    pub const NONE: SubDevices = SubDevices(0);
    pub const ALL: SubDevices = SubDevices(7);

    /// Accepts 1..=7; anything else selects nothing and is rejected
    pub fn from_bits(bits: u8) -> Option<Self> {
        (1..=7).contains(&bits).then_some(SubDevices(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: SubDevices) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn union(self, other: SubDevices) -> Self {
        SubDevices(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Display names of the contained subdevices, motor first
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (SubDevices::MOTOR, "Angle Motor"),
            (SubDevices::CAMERA, "Camera"),
            (SubDevices::AUDIO, "Audio"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }
}

/// Per-device attributes reported by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAttributes {
    pub index: usize,
    pub serial: String,
}

/// Sensor driver used by the console
pub trait SensorDriver: Send + Sync {
    /// Short driver name for logs and status
    fn name(&self) -> &str;

    /// Number of connected devices
    fn device_count(&self) -> Result<usize, DeviceError>;

    fn device_attributes(&self) -> Result<Vec<DeviceAttributes>, DeviceError>;

    fn supported_subdevices(&self) -> SubDevices;

    /// Select subdevices for the next `open`
    fn select_subdevices(&self, subdevices: SubDevices) -> Result<(), DeviceError>;

    fn selected_subdevices(&self) -> SubDevices;

    fn open(&self, index: usize) -> Result<(), DeviceError>;

    fn close(&self) -> Result<(), DeviceError>;

    fn is_open(&self) -> bool;

    fn start_stream(&self, stream: StreamKind) -> Result<(), DeviceError>;

    fn stop_stream(&self, stream: StreamKind) -> Result<(), DeviceError>;

    /// Streams currently started on the device
    fn active_streams(&self) -> StreamSet;

    fn set_tilt(&self, degrees: i8) -> Result<(), DeviceError>;

    fn set_led(&self, mode: LedMode) -> Result<(), DeviceError>;

    fn set_log_level(&self, level: DriverLogLevel) -> Result<(), DeviceError>;

    /// Deliver pending frames to `sink`
    ///
    /// Blocks for at most a short bounded interval and returns the number
    /// of frames delivered. An error ends the capture loop.
    fn process_events(&self, sink: &mut dyn FrameSink) -> Result<usize, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_words() {
        assert_eq!(LedMode::from_words(&["green"]), Some(LedMode::Green));
        assert_eq!(
            LedMode::from_words(&["blink", "red"]),
            Some(LedMode::BlinkRedYellow)
        );
        assert_eq!(LedMode::from_words(&["blink"]), None);
        assert_eq!(LedMode::from_words(&["purple"]), None);
    }

    #[test]
    fn test_log_level_names_round_trip() {
        for level in DriverLogLevel::ALL {
            assert_eq!(DriverLogLevel::from_name(level.name()), Some(level));
        }
        assert_eq!(DriverLogLevel::from_name("loud"), None);
    }

    #[test]
    fn test_subdevice_bits() {
        assert_eq!(SubDevices::from_bits(0), None);
        assert_eq!(SubDevices::from_bits(8), None);
        let sel = SubDevices::from_bits(5).unwrap();
        assert!(sel.contains(SubDevices::MOTOR));
        assert!(!sel.contains(SubDevices::CAMERA));
        assert!(sel.contains(SubDevices::AUDIO));
        assert_eq!(sel.names().collect::<Vec<_>>(), vec!["Angle Motor", "Audio"]);
        assert!(!SubDevices::ALL.contains(SubDevices::NONE));
    }
}
