/* 3rd party libraries */
use clap::Parser;
use crossbeam_channel as cbc;
use log::{info, warn};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread::Builder;

/* Custom libraries */
use elevator_ride::config::{self, Config};
use elevator_ride::shared::{Command, CueEvent, DispatchPolicy, ElevatorSnapshot, MissionUpdate};
use elevator_ride::unwrap_or_exit;
use elevator_ride::{Coordinator, ElevatorFSM};

/* Modules */
mod console;

use console::{Display, Input};

/// Single-car elevator ride simulator driven from the terminal.
#[derive(Parser, Debug)]
#[clap(name = "elevator-ride", version)]
struct Args {
    /// Configuration file, defaults are used if it does not exist
    #[clap(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Dispatch policy override: nearest or fifo
    #[clap(short, long)]
    policy: Option<DispatchPolicy>,

    /// Play the target-floor mission game
    #[clap(short, long)]
    mission: bool,

    /// Start with spoken announcements disabled
    #[clap(long)]
    mute: bool,

    /// Print one JSON object per line
    #[clap(long)]
    json: bool,

    /// Floor calls registered at start
    #[clap(long, multiple_values = true)]
    calls: Vec<u8>,
}

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Load the configuration
    let mut config = if args.config.exists() {
        unwrap_or_exit!(config::load_config(&args.config))
    } else {
        warn!("No configuration at {:?}, using defaults", args.config);
        Config::default()
    };
    if let Some(policy) = args.policy {
        config.elevator.dispatch_policy = policy;
    }
    if args.mission {
        config.elevator.mission_mode = true;
    }
    if args.mute {
        config.announcer.voice_enabled = false;
    }
    unwrap_or_exit!(config.validate());

    // Initialize channels
    let (command_tx, command_rx) = cbc::unbounded::<Command>();
    let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();
    let (cue_tx, cue_rx) = cbc::unbounded::<CueEvent>();
    let (state_tx, state_rx) = cbc::unbounded::<ElevatorSnapshot>();
    let (mission_tx, mission_rx) = cbc::unbounded::<MissionUpdate>();
    let (status_tx, status_rx) = cbc::unbounded::<()>();

    // Start the display
    let display = Display::new(state_rx, cue_rx, mission_rx, status_rx, args.json);
    let display_thread = unwrap_or_exit!(Builder::new()
        .name("display".into())
        .spawn(move || display.run()));

    // Start the elevator
    let fsm = ElevatorFSM::new(&config, cue_tx, state_tx, mission_tx);
    let coordinator = Coordinator::new(fsm, command_rx, terminate_rx);
    let coordinator_thread = unwrap_or_exit!(Builder::new()
        .name("coordinator".into())
        .spawn(move || {
            coordinator.run();
        }));

    for floor in args.calls {
        let _ = command_tx.send(Command::EnqueueFloor(floor));
    }

    // Read commands until quit or end of input
    for line in io::stdin().lock().lines() {
        let line = unwrap_or_exit!(line);
        if line.trim().is_empty() {
            continue;
        }
        match console::parse_input(&line) {
            Ok(Input::Command(command)) => {
                if command_tx.send(command).is_err() {
                    break;
                }
            }
            Ok(Input::Status) => {
                let _ = status_tx.send(());
            }
            Ok(Input::Help) => println!("{}", console::HELP),
            Ok(Input::Quit) => break,
            Err(e) => eprintln!("{}", e),
        }
    }

    info!("Shutting down");
    let _ = terminate_tx.send(());
    if coordinator_thread.join().is_err() {
        warn!("Coordinator thread panicked");
    }
    drop(status_tx);
    if display_thread.join().is_err() {
        warn!("Display thread panicked");
    }
}
