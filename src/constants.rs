// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Kinect depth and video frame width (medium resolution)
pub const FRAME_WIDTH: usize = 640;

/// Kinect depth and video frame height (medium resolution)
pub const FRAME_HEIGHT: usize = 480;

/// Pixels per frame
pub const FRAME_PIXELS: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Bytes per display pixel (RGB24)
pub const DISPLAY_BYTES_PER_PIXEL: usize = 3;

/// Entries in the depth gamma table (11-bit raw depth)
pub const DEPTH_TABLE_SIZE: usize = 2048;

/// Default number of rows kept in the console scrollback
pub const DEFAULT_CONSOLE_ROWS: usize = 23;

/// Default maximum length of the command line, in characters
pub const DEFAULT_COMMAND_MAX_LEN: usize = 64;

/// Upper bound for one rendered console line, in bytes
pub const MAX_LINE_BYTES: usize = 4096;

/// Line pushed when a console line cannot be formatted
pub const FORMAT_ERROR_LINE: &str = "formatting error";

/// Tilt angle limits accepted by `set angle` (in degrees)
pub const TILT_MIN_DEGREES: i8 = -28;
pub const TILT_MAX_DEGREES: i8 = 28;

/// Default frame rate for the synthetic sensor
pub const DEFAULT_SYNTHETIC_FPS: u32 = 30;

/// Default bound on a single render-side frame wait
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(50);

/// Upper bound on one blocking driver event call
pub const DRIVER_EVENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Key polling interval for the terminal loop when no stream is active
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Application directory name used for config and snapshots
pub const APP_DIR_NAME: &str = "kinect-console";
