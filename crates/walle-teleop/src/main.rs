//! walle-teleop: operator front-end for the walle serial bridge
//!
//! Usage:
//!   walle-teleop --port /dev/ttyUSB0 keyboard
//!   velocity-source | walle-teleop --max-speed 60 velocity
//!   walle-teleop --baud 57600 write-config bridge.json
//!
//! Logging follows `RUST_LOG` (default `info`).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use walle_core::comm::{bounded_channel, Sender};
use walle_core::teleop::{keymap, status, BridgeEvent, KeyInput};
use walle_core::{
    Action, ActuatorId, Bridge, BridgeConfig, BridgeRequest, Error, Result, VelocityCommand,
};

/// Requests buffered between the input thread and the dispatch loop
const REQUEST_QUEUE: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "walle-teleop", version, about = "Drive WALL-E's actuators over a serial link")]
struct Cli {
    /// JSON configuration file; options below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device path
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Velocity cap in percent
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    max_speed: Option<u8>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive servo control, one key per character of each input line
    Keyboard {
        /// Actuator selected at start, by name (e.g. `neck_top`)
        #[arg(long, value_parser = parse_actuator)]
        select: Option<ActuatorId>,
    },
    /// Read "<linear> <angular>" lines from stdin and drive
    Velocity,
    /// Write the effective configuration as JSON and exit
    WriteConfig { path: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Connection(msg)) => {
            eprintln!("Cannot reach the controller: {}", msg);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_actuator(name: &str) -> std::result::Result<ActuatorId, String> {
    ActuatorId::from_name(name).ok_or_else(|| {
        let names: Vec<_> = ActuatorId::ALL.iter().map(|id| id.name()).collect();
        format!("unknown actuator {:?}, expected one of: {}", name, names.join(", "))
    })
}

fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(port) = &cli.port {
        config = config.with_port(port.clone());
    }
    if let Some(baud) = cli.baud {
        config = config.with_baud_rate(baud);
    }
    if let Some(max_speed) = cli.max_speed {
        config = config.with_max_speed(max_speed);
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    if let Mode::WriteConfig { path } = &cli.mode {
        config.save(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))
            .map_err(|e| Error::Config(format!("cannot install Ctrl-C handler: {}", e)))?;
    }

    let mut bridge = Bridge::connect(config)?;
    let (tx, rx) = bounded_channel(REQUEST_QUEUE);

    match cli.mode {
        Mode::Keyboard { select } => {
            if let Some(id) = select {
                let _ = bridge.handle(BridgeRequest::Action(Action::Select(id)));
            }
            print!("{}", keymap::instructions());
            print_status(&bridge);
            thread::spawn(move || read_keys(tx));
            bridge.run(&rx, &running, |bridge, event| match event {
                BridgeEvent::Action(_) => print_status(bridge),
                BridgeEvent::Stopped => println!("\nExiting WALL-E servo control..."),
                BridgeEvent::Velocity(_) => {}
            })
        }
        Mode::Velocity => {
            thread::spawn(move || read_velocities(tx));
            bridge.run(&rx, &running, |_, _| {})
        }
        Mode::WriteConfig { .. } => Ok(()),
    }
}

fn print_status(bridge: &Bridge) {
    let state = bridge.dispatcher().state();
    print!("{}", status::render(&state, bridge.session().selected()));
    let _ = io::stdout().flush();
}

/// Feed key presses to the bridge until quit or end of input
fn read_keys(tx: Sender<BridgeRequest>) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("stdin closed: {}", e);
                return;
            }
        };
        for key in line.chars() {
            let request = match keymap::map_key(key) {
                Some(KeyInput::Action(action)) => BridgeRequest::Action(action),
                Some(KeyInput::Quit) => BridgeRequest::Shutdown,
                Some(KeyInput::ShowHelp) => {
                    print!("{}", keymap::instructions());
                    continue;
                }
                None => continue,
            };
            let quit = request == BridgeRequest::Shutdown;
            if tx.send(request).is_err() || quit {
                return;
            }
        }
    }
}

/// Feed velocity lines to the bridge until end of input
fn read_velocities(tx: Sender<BridgeRequest>) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("stdin closed: {}", e);
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<VelocityCommand>() {
            Ok(v) => {
                if tx.send(BridgeRequest::Velocity(v)).is_err() {
                    return;
                }
            }
            Err(e) => tracing::warn!("Ignoring velocity line: {}", e),
        }
    }
    tracing::info!("End of velocity input");
}
