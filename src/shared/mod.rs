pub mod macros;
pub mod structs;

pub use structs::Behaviour;
pub use structs::Command;
pub use structs::Cue;
pub use structs::CueEvent;
pub use structs::Direction;
pub use structs::DispatchPolicy;
pub use structs::DoorState;
pub use structs::ElevatorSnapshot;
pub use structs::MissionUpdate;
