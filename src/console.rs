/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;
use serde_json::json;

/***************************************/
/*           Local modules             */
/***************************************/
use elevator_ride::shared::{Command, CueEvent, DispatchPolicy, ElevatorSnapshot, MissionUpdate};

/***************************************/
/*               Enums                 */
/***************************************/
/// One line of console input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Command(Command),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  call <floor> | <floor>   register a floor call
  open | close             manual door buttons
  clear                    drop every pending call
  voice on|off             toggle spoken announcements
  volume <0.0-1.0>         effect volume
  policy nearest|fifo      dispatch policy
  status                   print the current state
  help                     this text
  quit                     stop the elevator";

/***************************************/
/*             Public API              */
/***************************************/
pub fn parse_input(line: &str) -> Result<Input, String> {
    let words: Vec<&str> = line.split_whitespace().collect();

    let input = match words.as_slice() {
        [floor] if floor.chars().all(|c| c.is_ascii_digit()) => {
            Input::Command(Command::EnqueueFloor(parse_floor(floor)?))
        }
        ["call", floor] => Input::Command(Command::EnqueueFloor(parse_floor(floor)?)),
        ["open"] => Input::Command(Command::ManualOpen),
        ["close"] => Input::Command(Command::ManualClose),
        ["clear"] => Input::Command(Command::ClearQueue),
        ["voice", "on"] => Input::Command(Command::SetVoiceEnabled(true)),
        ["voice", "off"] => Input::Command(Command::SetVoiceEnabled(false)),
        ["volume", volume] => {
            let volume = volume
                .parse::<f32>()
                .map_err(|_| format!("invalid volume '{}'", volume))?;
            Input::Command(Command::SetEffectVolume(volume))
        }
        ["policy", policy] => {
            Input::Command(Command::SetDispatchPolicy(policy.parse::<DispatchPolicy>()?))
        }
        ["status"] => Input::Status,
        ["help"] | ["?"] => Input::Help,
        ["quit"] | ["exit"] | ["q"] => Input::Quit,
        [] => return Err("empty input".to_string()),
        _ => return Err(format!("unknown command '{}', try 'help'", line.trim())),
    };
    Ok(input)
}

fn parse_floor(floor: &str) -> Result<u8, String> {
    floor
        .parse::<u8>()
        .map_err(|_| format!("invalid floor '{}'", floor))
}

/**
 * Prints everything the engine publishes until its channels close.
 *
 * # Fields
 * - `state_rx`:    Snapshots from the elevator.
 * - `cue_rx`:      Cue events meant for the announcer.
 * - `mission_rx`:  Mission updates.
 * - `status_rx`:   Requests to reprint the latest snapshot.
 * - `json`:        Print one JSON object per line instead of text.
 */
pub struct Display {
    state_rx: cbc::Receiver<ElevatorSnapshot>,
    cue_rx: cbc::Receiver<CueEvent>,
    mission_rx: cbc::Receiver<MissionUpdate>,
    status_rx: cbc::Receiver<()>,
    json: bool,
    latest: Option<ElevatorSnapshot>,
}

impl Display {
    pub fn new(
        state_rx: cbc::Receiver<ElevatorSnapshot>,
        cue_rx: cbc::Receiver<CueEvent>,
        mission_rx: cbc::Receiver<MissionUpdate>,
        status_rx: cbc::Receiver<()>,
        json: bool,
    ) -> Display {
        Display {
            state_rx,
            cue_rx,
            mission_rx,
            status_rx,
            json,
            latest: None,
        }
    }

    pub fn run(mut self) {
        loop {
            cbc::select! {
                recv(self.state_rx) -> state => match state {
                    Ok(state) => {
                        self.print_state(&state);
                        self.latest = Some(state);
                    }
                    Err(_) => break,
                },

                recv(self.cue_rx) -> event => match event {
                    Ok(event) => self.print_cue(&event),
                    Err(_) => break,
                },

                recv(self.mission_rx) -> update => match update {
                    Ok(update) => self.print_mission(&update),
                    Err(_) => break,
                },

                recv(self.status_rx) -> request => match (request, &self.latest) {
                    (Ok(()), Some(state)) => self.print_state(state),
                    (Ok(()), None) => {}
                    (Err(_), _) => break,
                },
            }
        }
        debug!("Display closed");
    }

    fn print_state(&self, state: &ElevatorSnapshot) {
        if self.json {
            println!("{}", json!({ "type": "state", "data": state }));
            return;
        }

        let queue: Vec<String> = state.queue.iter().map(|floor| floor.to_string()).collect();
        println!(
            "[floor {:>2}] {:?} {:?} | doors {:?} | queue [{}] | {}",
            state.floor,
            state.behaviour,
            state.direction,
            state.door_state,
            queue.join(", "),
            state.message
        );
    }

    fn print_cue(&self, event: &CueEvent) {
        if self.json {
            println!("{}", json!({ "type": "cue", "data": event }));
            return;
        }

        // Halts only matter to a real audio player
        if let CueEvent::Play { cue, volume } = event {
            println!("  ~ {} ({:.2})", cue, volume);
        }
    }

    fn print_mission(&self, update: &MissionUpdate) {
        if self.json {
            println!("{}", json!({ "type": "mission", "data": update }));
        } else {
            println!(
                "  * mission: ride to floor {} (streak {})",
                update.target, update.streak
            );
        }
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_floor_calls() {
        assert_eq!(parse_input("4"), Ok(Input::Command(Command::EnqueueFloor(4))));
        assert_eq!(parse_input(" call 10 "), Ok(Input::Command(Command::EnqueueFloor(10))));
        assert!(parse_input("call ten").is_err());
        assert!(parse_input("300").is_err());
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!(
            parse_input("voice off"),
            Ok(Input::Command(Command::SetVoiceEnabled(false)))
        );
        assert_eq!(
            parse_input("volume 0.5"),
            Ok(Input::Command(Command::SetEffectVolume(0.5)))
        );
        assert_eq!(
            parse_input("policy fifo"),
            Ok(Input::Command(Command::SetDispatchPolicy(DispatchPolicy::Fifo)))
        );
        assert!(parse_input("policy random").is_err());
    }

    #[test]
    fn test_parse_console_controls() {
        assert_eq!(parse_input("open"), Ok(Input::Command(Command::ManualOpen)));
        assert_eq!(parse_input("clear"), Ok(Input::Command(Command::ClearQueue)));
        assert_eq!(parse_input("status"), Ok(Input::Status));
        assert_eq!(parse_input("quit"), Ok(Input::Quit));
        assert!(parse_input("   ").is_err());
        assert!(parse_input("fly away").is_err());
    }
}
