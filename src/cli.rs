// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands outside the terminal UI
//!
//! - Listing connected devices
//! - Running the console headless on stdin/stdout

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use kinect_console::app::{ConsoleApp, FrameStatus};
use kinect_console::backends::SensorDriver;
use kinect_console::constants::IDLE_POLL_INTERVAL;
use kinect_console::{AppResult, Config, Console};
use tracing::{debug, info};

/// List connected devices and their serial numbers
pub fn list_devices(driver: &dyn SensorDriver) -> AppResult<()> {
    let devices = driver.device_attributes()?;

    if devices.is_empty() {
        println!("No Kinect found.");
        return Ok(());
    }

    println!(
        "Number of devices found: {} ({} driver)",
        devices.len(),
        driver.name()
    );
    println!();
    for device in &devices {
        println!("  [{}] serial {}", device.index, device.serial);
    }
    println!();
    println!("Supported subdevices:");
    for name in driver.supported_subdevices().names() {
        println!("  {}", name);
    }

    Ok(())
}

/// Run the console reading commands from stdin
///
/// Each input line is executed as if typed and submitted. New console lines
/// are printed as they appear. Stops on `quit`, end of input or Ctrl+C.
pub fn run_headless(config: Config, driver: Arc<dyn SensorDriver>) -> AppResult<()> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| format!("cannot install Ctrl+C handler: {}", e))?;

    let (sender, receiver) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
            debug!("Standard input closed");
        })?;

    let mut app = ConsoleApp::new(config, driver);
    let mut seen = print_new_lines(app.console(), 0);
    info!("Headless console started");

    loop {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Interrupted.");
            app.execute("quit");
        }

        match receiver.try_recv() {
            Ok(line) => app.execute(line.trim_end()),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                if !app.should_quit() {
                    app.execute("quit");
                }
            }
        }

        seen = print_new_lines(app.console(), seen);
        if app.should_quit() {
            break;
        }

        // Keeps frames flowing for snapshots; sleeps while no stream runs
        match app.refresh_frames() {
            FrameStatus::Idle => thread::sleep(IDLE_POLL_INTERVAL),
            FrameStatus::Closed => break,
            FrameStatus::Updated(_) | FrameStatus::Pending => {}
        }
    }

    app.shutdown();
    print_new_lines(app.console(), seen);
    Ok(())
}

fn print_new_lines(console: &Console, seen: u64) -> u64 {
    let (lines, pushed) = console.lines_since(seen);
    for line in lines {
        println!("{}", line);
    }
    pushed
}
