pub mod call_queue;
pub mod doors;
pub mod fsm;
pub mod scheduler;
pub mod timers;

pub use call_queue::CallQueue;
pub use doors::DoorController;
pub use fsm::ElevatorFSM;
pub use fsm::InvariantViolation;
pub use timers::{TimerHandle, TimerQueue};
