// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kinect_console::backends::{self, DriverKind};
use kinect_console::{Config, ConsoleApp};

mod cli;

#[derive(Parser)]
#[command(name = "kinect-console")]
#[command(about = "Interactive control console for Kinect depth cameras")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: ~/.config/kinect-console/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sensor driver, overriding the configuration
    #[arg(short, long, global = true, value_enum)]
    driver: Option<DriverKind>,

    /// Device index opened by `open`, overriding the configuration
    #[arg(long, global = true)]
    device: Option<usize>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the console in the terminal (default)
    Terminal,

    /// Run the console on stdin/stdout without a UI
    Headless,

    /// List connected devices
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Terminal);

    // Set RUST_LOG to control the log level, e.g. RUST_LOG=kinect_console=debug.
    // The terminal UI owns the screen, so it logs to a file by default.
    let log_file = match (&command, cli.log_file) {
        (_, Some(path)) => Some(path),
        (Commands::Terminal, None) => Some(kinect_console::default_log_path()),
        (_, None) => None,
    };
    kinect_console::init_logging(log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(driver) = cli.driver {
        config.driver = driver;
    }
    if let Some(device) = cli.device {
        config.device_index = device;
    }

    let driver = backends::create_driver(config.driver, config.synthetic_fps)?;

    match command {
        Commands::Terminal => {
            let mut app = ConsoleApp::new(config, driver);
            kinect_console::terminal::run(&mut app)?;
        }
        Commands::Headless => cli::run_headless(config, driver)?,
        Commands::List => cli::list_devices(driver.as_ref())?,
    }

    Ok(())
}
