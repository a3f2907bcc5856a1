/*
 * Unit tests for coordinator module
 *
 * The unit tests follows the Arrange, Act, Assert pattern. The coordinator runs
 * on its own thread against the wall clock, so the timing is shortened.
 *
 * Tests:
 *  - test_coordinator_publishes_initial_state
 *  - test_coordinator_serves_call
 *  - test_coordinator_terminate_cancels_timers
 *  - test_coordinator_stops_when_commands_disconnect
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod coordinator_tests {
    use crate::config::Config;
    use crate::shared::Behaviour::{Arrived, Idle};
    use crate::shared::{Command, Cue, CueEvent, DoorState, ElevatorSnapshot, MissionUpdate};
    use crate::{Coordinator, ElevatorFSM};
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::thread::Builder;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.timing.door_animation = 20;
        config.timing.floor_travel = 20;
        config.timing.arrival_to_open_announce = 20;
        config.timing.open_announce_to_door_open = 10;
        config.timing.door_dwell_before_auto_close = 40;
        config.timing.departure_announce_delay = 15;
        config.timing.stop_settle = 10;
        config.timing.manual_door_delay = 5;
        config
    }

    fn setup_coordinator() -> (
        Coordinator,
        Sender<Command>,             // command_tx
        Sender<()>,                  // terminate_tx
        Receiver<CueEvent>,          // cue_rx
        Receiver<ElevatorSnapshot>,  // state_rx
        Receiver<MissionUpdate>,     // mission_rx
    ) {
        // Arrange mock channels
        let (command_tx, command_rx) = unbounded::<Command>();
        let (terminate_tx, terminate_rx) = unbounded::<()>();
        let (cue_tx, cue_rx) = unbounded::<CueEvent>();
        let (state_tx, state_rx) = unbounded::<ElevatorSnapshot>();
        let (mission_tx, mission_rx) = unbounded::<MissionUpdate>();

        let fsm = ElevatorFSM::new(&fast_config(), cue_tx, state_tx, mission_tx);

        (
            Coordinator::new(fsm, command_rx, terminate_rx),
            command_tx,
            terminate_tx,
            cue_rx,
            state_rx,
            mission_rx,
        )
    }

    fn wait_for_state(
        state_rx: &Receiver<ElevatorSnapshot>,
        predicate: impl Fn(&ElevatorSnapshot) -> bool,
    ) -> ElevatorSnapshot {
        loop {
            let state = state_rx.recv_timeout(TIMEOUT).unwrap();
            if predicate(&state) {
                return state;
            }
        }
    }

    #[test]
    fn test_coordinator_publishes_initial_state() {
        // Arrange
        let (coordinator, _command_tx, terminate_tx, _cue_rx, state_rx, _mission_rx) =
            setup_coordinator();
        let coordinator_thread = Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run())
            .unwrap();

        // Act
        let state = state_rx.recv_timeout(TIMEOUT).unwrap();

        // Assert
        assert_eq!(state.floor, 1);
        assert_eq!(state.behaviour, Idle);
        assert_eq!(state.door_state, DoorState::Closed);

        // Cleanup
        terminate_tx.send(()).unwrap();
        coordinator_thread.join().unwrap();
    }

    #[test]
    fn test_coordinator_serves_call() {
        // Purpose: A call sent to the running coordinator is served and the doors close again

        // Arrange
        let (coordinator, command_tx, terminate_tx, cue_rx, state_rx, _mission_rx) =
            setup_coordinator();
        let coordinator_thread = Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run())
            .unwrap();

        // Act
        command_tx.send(Command::EnqueueFloor(3)).unwrap();

        // Assert
        let arrived = wait_for_state(&state_rx, |state| state.behaviour == Arrived);
        assert_eq!(arrived.floor, 3);
        assert!(arrived.queue.is_empty());

        let closed = wait_for_state(&state_rx, |state| {
            state.behaviour == Idle && state.door_state == DoorState::Closed
        });
        assert_eq!(closed.floor, 3);

        let cues: Vec<Cue> = cue_rx
            .try_iter()
            .filter_map(|event| match event {
                CueEvent::Play { cue, .. } => Some(cue),
                CueEvent::Halt { .. } => None,
            })
            .collect();
        assert_eq!(cues.first(), Some(&Cue::CallRegistered));
        assert!(cues.contains(&Cue::ArrivalChime));
        assert!(cues.contains(&Cue::OpenDoorVoice));
        assert!(cues.contains(&Cue::CloseDoorVoice));

        // Cleanup
        terminate_tx.send(()).unwrap();
        coordinator_thread.join().unwrap();
    }

    #[test]
    fn test_coordinator_terminate_cancels_timers() {
        // Purpose: Terminating mid-ride leaves no pending timers behind

        // Arrange
        let (coordinator, command_tx, terminate_tx, _cue_rx, state_rx, _mission_rx) =
            setup_coordinator();
        let coordinator_thread = Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run())
            .unwrap();
        command_tx.send(Command::EnqueueFloor(10)).unwrap();
        wait_for_state(&state_rx, |state| state.queue == vec![10]);

        // Act
        terminate_tx.send(()).unwrap();
        let fsm = coordinator_thread.join().unwrap();

        // Assert
        assert_eq!(fsm.next_deadline(), None);
        assert!(!fsm.is_door_animating());
    }

    #[test]
    fn test_coordinator_stops_when_commands_disconnect() {
        // Arrange
        let (coordinator, command_tx, _terminate_tx, _cue_rx, _state_rx, _mission_rx) =
            setup_coordinator();
        let coordinator_thread = Builder::new()
            .name("coordinator".into())
            .spawn(move || coordinator.run())
            .unwrap();

        // Act
        drop(command_tx);

        // Assert
        let fsm = coordinator_thread.join().unwrap();
        assert_eq!(fsm.next_deadline(), None);
    }
}
