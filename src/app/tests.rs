// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;
use crate::backends::synthetic::{SyntheticOp, SyntheticSensor};
use crate::backends::{DriverLogLevel, LedMode, SubDevices};
use crate::frames::StreamKind;

fn test_config() -> Config {
    Config {
        console_rows: 64,
        acquire_timeout_ms: 200,
        ..Config::default()
    }
}

fn app_with(sensor: &Arc<SyntheticSensor>, config: Config) -> ConsoleApp {
    let driver: Arc<dyn SensorDriver> = sensor.clone();
    ConsoleApp::new(config, driver)
}

fn new_app() -> (ConsoleApp, Arc<SyntheticSensor>) {
    let sensor = Arc::new(SyntheticSensor::new(200));
    (app_with(&sensor, test_config()), sensor)
}

fn type_line(app: &mut ConsoleApp, line: &str) {
    for ch in line.chars() {
        app.handle_key(Key::Char(ch));
    }
    app.handle_key(Key::Enter);
}

fn last_line(app: &ConsoleApp) -> String {
    app.console().snapshot().pop().unwrap_or_default()
}

fn has_line(app: &ConsoleApp, expected: &str) -> bool {
    app.console().snapshot().iter().any(|line| line == expected)
}

/// Refresh until `stream` has been updated
fn wait_for_frame(app: &mut ConsoleApp, stream: StreamKind) -> bool {
    for _ in 0..50 {
        if let FrameStatus::Updated(updated) = app.refresh_frames() {
            if updated.contains(stream) {
                return true;
            }
        }
    }
    false
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "kinect-console-app-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn test_startup_banner() {
    let (app, _sensor) = new_app();
    assert_eq!(last_line(&app), "Console is ready.");
    assert_eq!(app.console().snapshot().len(), 64);
    assert!(!app.device().open);
}

#[test]
fn test_help_lists_every_command() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "help");
    assert!(has_line(&app, "> help"));
    assert!(has_line(&app, "Available commands:"));
    assert!(has_line(&app, "help : Display this message."));
    assert!(
        app.console()
            .snapshot()
            .iter()
            .any(|line| line.starts_with("selectSubDevices : "))
    );
}

#[test]
fn test_scan_reports_device_count() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "scan");
    assert_eq!(last_line(&app), "Number of devices found: 1");

    let empty = Arc::new(SyntheticSensor::with_devices(200, 0));
    let mut app = app_with(&empty, test_config());
    type_line(&mut app, "scan");
    assert_eq!(last_line(&app), "No Kinect found.");
}

#[test]
fn test_scan_failure_is_reported() {
    let (mut app, sensor) = new_app();
    sensor.inject_failure(SyntheticOp::Scan);
    type_line(&mut app, "scan");
    assert_eq!(
        last_line(&app),
        "Error scanning for devices: injected failure in Scan"
    );
}

#[test]
fn test_unknown_command() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "dance");
    assert_eq!(
        last_line(&app),
        "Invalid command: dance. Type help for a list of commands."
    );
}

#[test]
fn test_usage_lines() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "trigger ir");
    assert_eq!(last_line(&app), commands::TRIGGER_USAGE);
    type_line(&mut app, "set angle up");
    assert_eq!(last_line(&app), "Invalid angle: up");
}

#[test]
fn test_open_applies_initial_led_and_tilt() {
    let sensor = Arc::new(SyntheticSensor::new(200));
    let config = Config {
        initial_led: LedMode::Yellow,
        initial_tilt: 10,
        ..test_config()
    };
    let mut app = app_with(&sensor, config);

    type_line(&mut app, "open");
    assert!(has_line(&app, "Opening Device."));
    assert!(has_line(&app, "Starting Thread."));
    assert!(has_line(&app, "Kinect is open."));
    assert!(has_line(&app, "LED set to yellow"));
    assert_eq!(last_line(&app), "Angle set to 10 degrees");
    assert!(app.device().open);
    assert_eq!(app.device().led, Some(LedMode::Yellow));
    assert_eq!(sensor.tilt(), 10);
    assert_eq!(sensor.led(), LedMode::Yellow);
}

#[test]
fn test_open_twice() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "open");
    assert_eq!(last_line(&app), "Kinect is already open.");
    assert!(app.device().open);
}

#[test]
fn test_open_without_device() {
    let sensor = Arc::new(SyntheticSensor::with_devices(200, 0));
    let mut app = app_with(&sensor, test_config());
    type_line(&mut app, "open");
    assert_eq!(last_line(&app), "Could not locate Kinect: No Kinect found");
    assert!(!app.device().open);
}

#[test]
fn test_angle_bounds() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "set angle 29");
    assert_eq!(last_line(&app), "Maximum angle 28.");
    type_line(&mut app, "set angle -29");
    assert_eq!(last_line(&app), "Minimum angle -28.");
    type_line(&mut app, "set angle 15");
    assert_eq!(last_line(&app), "Kinect is not open.");

    type_line(&mut app, "open");
    type_line(&mut app, "set angle 15");
    assert_eq!(last_line(&app), "Angle set to 15 degrees");
    assert_eq!(app.device().angle, 15);
    assert_eq!(sensor.tilt(), 15);

    type_line(&mut app, "set angle -28");
    assert_eq!(sensor.tilt(), -28);
}

#[test]
fn test_failed_tilt_keeps_state() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "set angle 5");
    sensor.inject_failure(SyntheticOp::SetTilt);
    type_line(&mut app, "set angle 20");
    assert_eq!(
        last_line(&app),
        "Error setting angle: injected failure in SetTilt"
    );
    assert_eq!(app.device().angle, 5);
    assert_eq!(sensor.tilt(), 5);
}

#[test]
fn test_led_and_log_level() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "set led red");
    assert_eq!(last_line(&app), "Kinect is not open.");

    type_line(&mut app, "open");
    type_line(&mut app, "set led blink green");
    assert_eq!(last_line(&app), "LED set to blinking green");
    assert_eq!(sensor.led(), LedMode::BlinkGreen);

    sensor.inject_failure(SyntheticOp::SetLed);
    type_line(&mut app, "set led off");
    assert_eq!(
        last_line(&app),
        "Error setting LED to off: injected failure in SetLed"
    );
    assert_eq!(app.device().led, Some(LedMode::BlinkGreen));

    type_line(&mut app, "set log level debug");
    assert_eq!(last_line(&app), "Log level set to debug");
    assert_eq!(sensor.log_level(), DriverLogLevel::Debug);
    assert_eq!(app.device().log_level, Some(DriverLogLevel::Debug));
}

#[test]
fn test_trigger_requires_open_device() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "trigger depth");
    assert_eq!(last_line(&app), "Kinect is not open.");
    assert!(app.enabled_streams().is_empty());
    assert_eq!(app.refresh_frames(), FrameStatus::Idle);
}

#[test]
fn test_trigger_toggles_feeds_and_delivers_frames() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");

    type_line(&mut app, "trigger depth");
    assert_eq!(last_line(&app), "Depth feed started");
    assert!(app.enabled_streams().contains(StreamKind::Depth));
    assert!(wait_for_frame(&mut app, StreamKind::Depth));
    assert!(app.front(StreamKind::Depth).iter().any(|&b| b != 0));
    assert!(app.front(StreamKind::Color).iter().all(|&b| b == 0));

    type_line(&mut app, "trigger rgb");
    assert_eq!(last_line(&app), "RGB feed started");
    assert!(wait_for_frame(&mut app, StreamKind::Color));
    assert!(sensor.active_streams().contains(StreamKind::Color));

    type_line(&mut app, "trigger depth");
    assert_eq!(last_line(&app), "Depth feed stopped");
    type_line(&mut app, "trigger rgb");
    assert_eq!(last_line(&app), "RGB feed stopped");
    assert!(sensor.active_streams().is_empty());
    assert_eq!(app.refresh_frames(), FrameStatus::Idle);
}

#[test]
fn test_failed_stream_start_keeps_state() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");
    sensor.inject_failure(SyntheticOp::Start(StreamKind::Color));
    type_line(&mut app, "trigger rgb");
    assert_eq!(
        last_line(&app),
        "Error starting RGB stream: injected failure in Start(Color)"
    );
    assert!(app.enabled_streams().is_empty());
    assert!(sensor.active_streams().is_empty());
}

#[test]
fn test_close_and_reopen() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "close");
    assert_eq!(last_line(&app), "Kinect is not open.");

    type_line(&mut app, "open");
    type_line(&mut app, "trigger depth");
    type_line(&mut app, "close");
    assert!(has_line(&app, "Shutting Down Streams..."));
    assert!(has_line(&app, "Stopping depth stream."));
    assert!(has_line(&app, "Closing device."));
    assert_eq!(last_line(&app), "Kinect is closed.");
    assert!(!app.device().open);
    assert!(!sensor.is_open());
    assert!(app.enabled_streams().is_empty());

    type_line(&mut app, "open");
    assert!(app.device().open);
    type_line(&mut app, "trigger rgb");
    assert!(wait_for_frame(&mut app, StreamKind::Color));
}

#[test]
fn test_close_resets_tilt_and_led() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "set angle 12");
    assert_eq!(app.device().angle, 12);
    assert!(app.device().led.is_some());

    type_line(&mut app, "close");
    assert!(!app.device().open);
    assert_eq!(app.device().angle, 0);
    assert_eq!(app.device().led, None);
}

#[test]
fn test_capture_failure_closes_device() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "trigger depth");
    sensor.inject_failure(SyntheticOp::ProcessEvents);

    for _ in 0..200 {
        app.refresh_frames();
        if !app.device().open {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!app.device().open);
    assert!(!sensor.is_open());
    assert!(
        app.console()
            .snapshot()
            .iter()
            .any(|line| line.starts_with("Capture stopped: "))
    );

    type_line(&mut app, "open");
    assert!(app.device().open);
}

#[test]
fn test_subdevice_selection() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "selectSubDevices 5");
    assert!(has_line(&app, "The following subdevices are selected:"));
    assert!(has_line(&app, "Angle Motor."));
    assert!(has_line(&app, "Audio."));
    assert_eq!(
        last_line(&app),
        "Note: Only selected subdevices will be activated by the next open call"
    );
    assert_eq!(
        sensor.selected_subdevices(),
        SubDevices::MOTOR.union(SubDevices::AUDIO)
    );

    type_line(&mut app, "listSelectedSubDevices");
    assert_eq!(last_line(&app), "Audio is selected.");

    type_line(&mut app, "selectSubDevices 9");
    assert_eq!(last_line(&app), commands::SUBDEVICES_USAGE);
}

#[test]
fn test_list_attributes() {
    let (mut app, _sensor) = new_app();
    type_line(&mut app, "listKinectAttribute");
    assert_eq!(last_line(&app), "Kinect serial: SYNTH00000000001");
}

#[test]
fn test_command_line_limit() {
    let sensor = Arc::new(SyntheticSensor::new(200));
    let config = Config {
        command_max_len: 4,
        ..test_config()
    };
    let mut app = app_with(&sensor, config);

    for ch in "scans".chars() {
        app.handle_key(Key::Char(ch));
    }
    assert_eq!(app.command_text(), "scan");
    assert_eq!(last_line(&app), "Command line limit of 4 characters reached.");

    app.handle_key(Key::Backspace);
    assert_eq!(app.command_text(), "sca");
    app.handle_key(Key::Char('n'));
    app.handle_key(Key::Enter);
    assert_eq!(app.command_text(), "");
    assert_eq!(last_line(&app), "Number of devices found: 1");
}

#[test]
fn test_empty_enter_runs_nothing() {
    let (mut app, _sensor) = new_app();
    let before = app.console().pushed();
    app.handle_key(Key::Enter);
    assert_eq!(app.console().pushed(), before);
}

#[test]
fn test_snapshot_writes_active_feeds() {
    let dir = scratch_dir("snapshot");
    let sensor = Arc::new(SyntheticSensor::new(200));
    let config = Config {
        snapshot_dir: Some(dir.clone()),
        ..test_config()
    };
    let mut app = app_with(&sensor, config);

    type_line(&mut app, "snapshot");
    assert_eq!(
        last_line(&app),
        "No stream is active; trigger depth or rgb first."
    );

    type_line(&mut app, "open");
    type_line(&mut app, "trigger depth");
    assert!(wait_for_frame(&mut app, StreamKind::Depth));
    type_line(&mut app, "snapshot");
    assert!(last_line(&app).starts_with("Snapshot saved: "));

    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(files.len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_quit_closes_open_device() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "quit");
    assert!(app.should_quit());
    assert!(!sensor.is_open());
    assert_eq!(last_line(&app), "Time to quit. Have a good night.");

    let before = app.console().pushed();
    app.handle_key(Key::Escape);
    assert_eq!(app.console().pushed(), before);
}

#[test]
fn test_shutdown_closes_exchange() {
    let (mut app, sensor) = new_app();
    type_line(&mut app, "open");
    type_line(&mut app, "trigger depth");
    app.shutdown();
    assert!(!sensor.is_open());
    assert_eq!(app.refresh_frames(), FrameStatus::Closed);
    app.shutdown();
}
