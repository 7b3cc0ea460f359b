// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the console application

use std::fmt;

use crate::frames::StreamKind;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Sensor driver errors
    Device(DeviceError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Terminal setup or drawing errors
    Terminal(String),
    /// Generic error with message
    Other(String),
}

/// Sensor driver errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Operation needs an open device
    NotOpen,
    /// Device is already open
    AlreadyOpen,
    /// No device is connected
    NoDevice,
    /// Device index out of range
    DeviceNotFound(usize),
    /// Start or stop of a stream failed
    Stream {
        stream: StreamKind,
        action: &'static str,
        reason: String,
    },
    /// Driver does not implement this operation
    Unsupported(String),
    /// Backend-specific failure
    Backend(String),
}

/// Console line formatting errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Directive has no matching argument
    MissingArgument { directive: char, position: usize },
    /// Argument kind does not match its directive
    ArgumentMismatch { directive: char, position: usize },
    /// Growing the line buffer failed
    Allocation,
    /// Rendered line exceeds the line limit
    TooLong,
}

impl DeviceError {
    pub fn stream(stream: StreamKind, action: &'static str, reason: impl Into<String>) -> Self {
        DeviceError::Stream {
            stream,
            action,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Device(e) => write!(f, "Device error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotOpen => write!(f, "Kinect is not open"),
            DeviceError::AlreadyOpen => write!(f, "Kinect is already open"),
            DeviceError::NoDevice => write!(f, "No Kinect found"),
            DeviceError::DeviceNotFound(index) => write!(f, "Could not locate Kinect #{}", index),
            DeviceError::Stream {
                stream,
                action,
                reason,
            } => write!(f, "Error {} {} stream: {}", action, stream, reason),
            DeviceError::Unsupported(what) => write!(f, "Unsupported by driver: {}", what),
            DeviceError::Backend(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::MissingArgument {
                directive,
                position,
            } => write!(f, "missing argument for %{} at {}", directive, position),
            FormatError::ArgumentMismatch {
                directive,
                position,
            } => write!(f, "argument does not match %{} at {}", directive, position),
            FormatError::Allocation => write!(f, "out of memory"),
            FormatError::TooLong => write!(f, "line too long"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for FormatError {}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        AppError::Device(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}
