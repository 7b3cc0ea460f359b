// SPDX-License-Identifier: GPL-3.0-only

//! Console command grammar

use crate::backends::{DriverLogLevel, LedMode, SubDevices};
use crate::frames::StreamKind;

/// Help table, in display order
pub const COMMANDS: &[(&str, &str)] = &[
    ("set", "Set properties: angle <int>, led <color>, log level <level>."),
    ("trigger", "Trigger feeds on/off: depth, rgb."),
    ("quit", "Exit the console."),
    ("listKinectAttribute", "Get and display Kinect serial number."),
    ("open", "Open selected subdevices, all by default."),
    ("close", "Close all open subdevices."),
    ("scan", "Scan for connected Kinect."),
    ("listSupportedSubDevices", "List subdevices supported by the driver."),
    ("listSelectedSubDevices", "List subdevices that will be activated by next open call."),
    ("selectSubDevices", "Choose subdevices for next open call: Motor 1, Camera 2, Audio 4, or a sum."),
    ("snapshot", "Save the active feeds as PNG files."),
    ("help", "Display this message."),
];

pub const SET_USAGE: &str =
    "Invalid set command: angle <int> led <{off, green, red, yellow, blink green, blink red}>";
pub const TRIGGER_USAGE: &str = "Invalid trigger option: depth, rgb.";
pub const LED_USAGE: &str = "Invalid LED color: off, green, red, yellow, blink green, blink red.";
pub const BLINK_USAGE: &str = "Invalid blink option: green, red.";
pub const LOG_LEVEL_USAGE: &str =
    "Unknown log level, please select between fatal, error, warning, notice, info, debug, spew, flood";
pub const SUBDEVICES_USAGE: &str = "Sub Devices flags: 1(Motor), 2(Camera), 3, 4(Audio), 5, 6, 7";

/// A parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Scan,
    Open,
    Close,
    Quit,
    Trigger(StreamKind),
    /// Unvalidated angle; range checks report their own messages
    SetAngle(i64),
    SetLed(LedMode),
    SetLogLevel(DriverLogLevel),
    ListKinectAttribute,
    ListSupportedSubDevices,
    ListSelectedSubDevices,
    SelectSubDevices(SubDevices),
    Snapshot,
}

/// Why a line did not parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Known command with bad arguments
    Usage(&'static str),
    InvalidAngle(String),
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Err(CommandError::Unknown(String::new()));
        };

        match name {
            "help" => Ok(Command::Help),
            "scan" => Ok(Command::Scan),
            "open" => Ok(Command::Open),
            "close" => Ok(Command::Close),
            "quit" => Ok(Command::Quit),
            "snapshot" => Ok(Command::Snapshot),
            "listKinectAttribute" => Ok(Command::ListKinectAttribute),
            "listSupportedSubDevices" => Ok(Command::ListSupportedSubDevices),
            "listSelectedSubDevices" => Ok(Command::ListSelectedSubDevices),
            "selectSubDevices" => args
                .first()
                .and_then(|flags| flags.parse::<u8>().ok())
                .and_then(SubDevices::from_bits)
                .map(Command::SelectSubDevices)
                .ok_or(CommandError::Usage(SUBDEVICES_USAGE)),
            "trigger" => match args {
                ["depth", ..] => Ok(Command::Trigger(StreamKind::Depth)),
                ["rgb", ..] => Ok(Command::Trigger(StreamKind::Color)),
                _ => Err(CommandError::Usage(TRIGGER_USAGE)),
            },
            "set" => parse_set(args),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_set(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        ["angle", value, ..] => value
            .parse::<i64>()
            .map(Command::SetAngle)
            .map_err(|_| CommandError::InvalidAngle(value.to_string())),
        ["led", "blink", rest @ ..] => LedMode::from_words(&["blink", rest.first().copied().unwrap_or("")])
            .map(Command::SetLed)
            .ok_or(CommandError::Usage(BLINK_USAGE)),
        ["led", color, ..] => LedMode::from_words(&[*color])
            .map(Command::SetLed)
            .ok_or(CommandError::Usage(LED_USAGE)),
        ["log", "level", level, ..] => DriverLogLevel::from_name(level)
            .map(Command::SetLogLevel)
            .ok_or(CommandError::Usage(LOG_LEVEL_USAGE)),
        ["log", "level"] => Err(CommandError::Usage(LOG_LEVEL_USAGE)),
        _ => Err(CommandError::Usage(SET_USAGE)),
    }
}
