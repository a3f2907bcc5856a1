/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "moving")]
    Moving,
    #[serde(rename = "arrived")]
    Arrived,
    #[serde(rename = "doorOpening")]
    DoorOpening,
    #[serde(rename = "doorOpen")]
    DoorOpen,
    #[serde(rename = "doorClosing")]
    DoorClosing,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stop,
}

impl Direction {
    /// Direction of travel needed to get from `from` to `to`.
    pub fn towards(from: u8, to: u8) -> Direction {
        if to > from {
            Direction::Up
        } else if to < from {
            Direction::Down
        } else {
            Direction::Stop
        }
    }

    /// The floor one hop away in this direction.
    pub fn step(&self, floor: u8) -> u8 {
        match *self {
            Direction::Up => floor.saturating_add(1),
            Direction::Down => floor.saturating_sub(1),
            Direction::Stop => floor,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    #[default]
    NearestFirst,
    Fifo,
}

impl FromStr for DispatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "nearest-first" | "nearest_first" => Ok(DispatchPolicy::NearestFirst),
            "fifo" => Ok(DispatchPolicy::Fifo),
            other => Err(format!("unknown dispatch policy '{}'", other)),
        }
    }
}

/// Named trigger for the external announcer. Carries no audio itself.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Cue {
    CallRegistered,
    ArrivalChime,
    MotorRunning,
    DoorMechanism,
    OpenDoorVoice,
    CloseDoorVoice,
    UpVoice,
    DownVoice,
}

impl Cue {
    pub fn is_voice(&self) -> bool {
        matches!(
            self,
            Cue::OpenDoorVoice | Cue::CloseDoorVoice | Cue::UpVoice | Cue::DownVoice
        )
    }

    pub fn id(&self) -> &'static str {
        match self {
            Cue::CallRegistered => "call-registered",
            Cue::ArrivalChime => "arrival-chime",
            Cue::MotorRunning => "motor-running",
            Cue::DoorMechanism => "door-mechanism",
            Cue::OpenDoorVoice => "open-door-voice",
            Cue::CloseDoorVoice => "close-door-voice",
            Cue::UpVoice => "up-voice",
            Cue::DownVoice => "down-voice",
        }
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum CueEvent {
    Halt { cue: Cue },
    Play { cue: Cue, volume: f32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionUpdate {
    pub target: u8,
    pub streak: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ElevatorSnapshot {
    pub behaviour: Behaviour,
    pub floor: u8,
    pub direction: Direction,
    #[serde(rename = "doorState")]
    pub door_state: DoorState,
    pub queue: Vec<u8>,
    pub message: String,
    pub mission: Option<MissionUpdate>,
}

/// Commands accepted from the front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    EnqueueFloor(u8),
    ManualOpen,
    ManualClose,
    ClearQueue,
    SetVoiceEnabled(bool),
    SetEffectVolume(f32),
    SetDispatchPolicy(DispatchPolicy),
}
