//! Elevator ride simulation engine.
//!
//! Takes floor calls and manual door commands, picks the next stop, and runs
//! the timed motion/door sequence, emitting cues for an external announcer and
//! snapshots for an external display.

pub mod announcer;
pub mod config;
pub mod coordinator;
pub mod elevator;
pub mod mission;
pub mod shared;

pub use config::Config;
pub use coordinator::Coordinator;
pub use elevator::ElevatorFSM;
pub use shared::{Command, ElevatorSnapshot};
