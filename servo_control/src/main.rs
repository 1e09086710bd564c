//! # Servo Control Binary
//!
//! Configures every actuator on the bus, runs the input loop until
//! interrupted, then disables torque everywhere.
//!
//! # Usage
//!
//! ```bash
//! # Hardware bus, gamepad input (build with --features gamepad)
//! servo_control --config config/servo.toml --input gamepad
//!
//! # Simulated bus replaying a script
//! servo_control --config config/servo.toml --simulate --input script --script config/demo_script.toml
//!
//! # Verbose JSON logs
//! servo_control -s -v --json --max-ticks 5000
//! ```

use clap::Parser;
use servo_common::config::{ServoConfig, load_config};
use servo_common::consts::DEFAULT_CONFIG_PATH;
use servo_common::input::InputSource;
use servo_control::ControlError;
use servo_control::cycle::{ControlLoop, StopHandle};
use servo_control::input::{IdleInput, InputKind, ScriptedInput};
use servo_hal::{ActuatorSet, TransportRegistry};
use std::path::PathBuf;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Servo Control - joystick-driven actuator bus controller
#[derive(Parser, Debug)]
#[command(name = "servo_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Joystick-driven control loop for a three-actuator servo bus")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulation transport
    #[arg(short = 's', long)]
    simulate: bool,

    /// Override the serial device path
    #[arg(short, long)]
    device: Option<String>,

    /// Input backend
    #[arg(short, long, value_enum, default_value_t = InputKind::Idle)]
    input: InputKind,

    /// Input script (TOML), required with `--input script`
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("Servo control failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ControlError> {
    // Logging needs shared.log_level, so a missing file falls back to defaults first.
    let config = match load_config(&args.config) {
        Ok(config) => {
            setup_tracing(&args, &config);
            info!("Loaded configuration from {:?}", args.config);
            config
        }
        Err(servo_common::config::ConfigError::FileNotFound) => {
            let config = ServoConfig::default();
            setup_tracing(&args, &config);
            warn!("{:?} not found, using built-in defaults", args.config);
            config
        }
        Err(e) => {
            setup_tracing(&args, &ServoConfig::default());
            return Err(e.into());
        }
    };

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    let mut bus = config.bus.clone();
    if args.simulate {
        info!("Simulation mode enabled");
        bus.driver = "simulation".to_string();
    }
    if let Some(device) = &args.device {
        bus.device = device.clone();
    }

    // Open input before touching the bus so a missing pad never moves anything.
    let input = open_input(&args)?;

    // An interrupt during acquisition only sets the flag; the loop sees it
    // before its first tick and tears down.
    let stop = StopHandle::new();
    let signal = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        signal.request_stop();
    })
    .map_err(|e| ControlError::Signal(e.to_string()))?;

    let registry = TransportRegistry::with_builtin();
    let transport = registry.create(&bus)?;
    info!(
        "Transport '{}' on {} at {} baud",
        transport.name(),
        bus.device,
        bus.baud_rate
    );

    let actuators = ActuatorSet::acquire(transport, &config.actuators, &config.startup)?;

    let mut control = ControlLoop::new(actuators, input, config.control.clone()).with_stop_handle(stop);
    if let Some(max) = args.max_ticks {
        control = control.with_max_ticks(max);
    }

    let summary = control.run();
    info!(
        "Stopped ({}): {} ticks, avg={}us, max={}us",
        summary.reason,
        summary.stats.tick_count,
        summary.stats.avg_tick_ns() / 1000,
        summary.stats.max_tick_ns / 1000
    );
    for (name, e) in &summary.teardown.failures {
        warn!("Actuator {} teardown failed: {}", name, e);
    }

    info!("{} shutdown complete", config.shared.service_name);
    Ok(())
}

fn open_input(args: &Args) -> Result<Box<dyn InputSource>, ControlError> {
    match args.input {
        InputKind::Idle => Ok(Box::new(IdleInput)),
        InputKind::Script => {
            let path = args.script.as_ref().ok_or_else(|| {
                servo_common::config::ConfigError::ValidationError(
                    "--input script requires --script <FILE>".to_string(),
                )
            })?;
            info!("Replaying input script {:?}", path);
            Ok(Box::new(ScriptedInput::from_file(path)?))
        }
        #[cfg(feature = "gamepad")]
        InputKind::Gamepad => Ok(Box::new(servo_control::input::GamepadInput::open()?)),
        #[cfg(not(feature = "gamepad"))]
        InputKind::Gamepad => Err(ControlError::Unsupported("gamepad")),
    }
}

/// Setup tracing subscriber from CLI flags and `shared.log_level`.
fn setup_tracing(args: &Args, config: &ServoConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.into()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).compact().init();
    }
}
