use crate::announcer::{Announcement, AnnouncementSequencer};
use crate::config::{Config, ElevatorConfig, TimingConfig};
use crate::elevator::call_queue::CallQueue;
use crate::elevator::doors::DoorController;
use crate::elevator::scheduler;
use crate::elevator::timers::{TimerHandle, TimerQueue};
use crate::mission::MissionEvaluator;
use crate::shared::{
    Behaviour, Command, CueEvent, Direction, DispatchPolicy, DoorState, ElevatorSnapshot,
    MissionUpdate,
};
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use std::time::Duration;
use thiserror::Error;

/**
 * Runs a single elevator car: motion, doors and the per-stop sequence.
 *
 * The `ElevatorFSM` is driven from outside with an explicit clock. Commands are
 * applied with `handle_command`, and `advance_to` fires every delayed action
 * that has come due. After each command or timer the transition rules are
 * evaluated against a freshly computed target, so no derived value is trusted
 * across time.
 *
 * # Fields
 * - `state_tx`:            Sends a snapshot whenever the displayed state changes.
 * - `mission_tx`:          Sends mission updates (mission mode only).
 * - `announcer`:           Turns announcements into cue events.
 * - `floor`:               Last floor the car reached.
 * - `direction`:           Current direction of travel, `Stop` when not pursuing a target.
 * - `last_direction`:      Direction of the most recent departure, used to keep sweeping.
 * - `behaviour`:           Current state of the machine.
 * - `serving_stop`:        Set from arrival until the doors have opened and settled.
 * - `auto_close_armed`:    Doors close by themselves after the dwell time.
 * - `queue`:               Pending floor calls.
 * - `door`:                Door animation driver.
 * - `message`:             Status line for the display.
 * - `mission`:             Target-floor game, if enabled.
 * - `now`:                 Time since start, as last seen by the machine.
 * - `timers`:              Every pending delayed action.
 * - `travel_timer`:        Pending single-floor hop and its direction.
 * - `departure_timer`:     Pending dwell before closing for departure, and the direction to leave in.
 * - `auto_close_timer`:    Pending auto-close.
 * - `manual_door_timer`:   Pending manual open/close.
 * - `door_timer`:          In-flight door animation.
 * - `stop_timer`:          Next step of the arrival sequence.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    FloorReached(Direction),
    AnnounceOpen,
    BeginStopOpening,
    DoorAnimationDone,
    StopSettled,
    DepartureClose(Direction),
    DepartureAnnounce(Direction),
    AutoClose,
    ManualDoor(DoorState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DoorContinuation {
    StopOpened,
    Departure(Direction),
    AutoClosed,
    Manual,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("floor {0} is queued while the car idles at it")]
    CurrentFloorQueued(u8),

    #[error("direction is {0:?} but no target is pursued")]
    DirectionWithoutTarget(Direction),

    #[error("travelling while the doors are not closed")]
    MovingWithDoorsOpen,

    #[error("door animation flag and animation timer disagree")]
    DoorAnimationMismatch,

    #[error("floor {0} is outside the serviceable range")]
    FloorOutOfRange(u8),
}

pub struct ElevatorFSM {
    // Output channels
    state_tx: cbc::Sender<ElevatorSnapshot>,
    mission_tx: cbc::Sender<MissionUpdate>,
    announcer: AnnouncementSequencer,

    // Elevator state
    floor: u8,
    direction: Direction,
    last_direction: Direction,
    behaviour: Behaviour,
    serving_stop: bool,
    auto_close_armed: bool,
    queue: CallQueue,
    door: DoorController<DoorContinuation>,
    message: String,
    mission: Option<MissionEvaluator>,

    // Timers
    now: Duration,
    timers: TimerQueue<TimerAction>,
    travel_timer: Option<(TimerHandle, Direction)>,
    departure_timer: Option<(TimerHandle, Direction)>,
    auto_close_timer: Option<TimerHandle>,
    manual_door_timer: Option<TimerHandle>,
    door_timer: Option<TimerHandle>,
    stop_timer: Option<TimerHandle>,

    // Settings
    settings: ElevatorConfig,
    timing: TimingConfig,
    last_snapshot: Option<ElevatorSnapshot>,
}

impl ElevatorFSM {
    pub fn new(
        config: &Config,
        cue_tx: cbc::Sender<CueEvent>,
        state_tx: cbc::Sender<ElevatorSnapshot>,
        mission_tx: cbc::Sender<MissionUpdate>,
    ) -> ElevatorFSM {
        let settings = config.elevator.clone();
        let initial_door = if settings.doors_open_at_start {
            DoorState::Open
        } else {
            DoorState::Closed
        };
        let mission = if settings.mission_mode {
            Some(MissionEvaluator::new(
                settings.min_floor,
                settings.max_floor,
                settings.initial_floor,
            ))
        } else {
            None
        };

        let mut fsm = ElevatorFSM {
            state_tx,
            mission_tx,
            announcer: AnnouncementSequencer::new(&config.announcer, cue_tx),
            floor: settings.initial_floor,
            direction: Direction::Stop,
            last_direction: Direction::Stop,
            behaviour: match initial_door {
                DoorState::Open => Behaviour::DoorOpen,
                DoorState::Closed => Behaviour::Idle,
            },
            serving_stop: false,
            auto_close_armed: false,
            queue: CallQueue::new(settings.dispatch_policy),
            door: DoorController::new(initial_door, config.timing.door_animation()),
            message: String::new(),
            mission: None,
            now: Duration::ZERO,
            timers: TimerQueue::new(),
            travel_timer: None,
            departure_timer: None,
            auto_close_timer: None,
            manual_door_timer: None,
            door_timer: None,
            stop_timer: None,
            settings,
            timing: config.timing.clone(),
            last_snapshot: None,
        };
        fsm.set_mission(mission);
        fsm
    }

    /// Replaces the mission evaluator, e.g. with one using a seeded random source.
    pub fn with_mission(mut self, mission: MissionEvaluator) -> ElevatorFSM {
        self.set_mission(Some(mission));
        self
    }

    fn set_mission(&mut self, mission: Option<MissionEvaluator>) {
        self.message = match &mission {
            Some(mission) => format!("Mission: ride to floor {}.", mission.target()),
            None => "Free ride mode. Press any floor.".to_string(),
        };
        self.mission = mission;
    }

    /// Publishes the initial snapshot and mission.
    pub fn start(&mut self) {
        info!(
            "Elevator ready at floor {} ({:?}, {:?})",
            self.floor,
            self.door.state(),
            self.queue.policy()
        );
        if let Some(mission) = &self.mission {
            let _ = self.mission_tx.send(mission.status());
        }
        self.publish();
    }

    /***************************************/
    /*             Public API              */
    /***************************************/
    pub fn handle_command(&mut self, command: Command, now: Duration) {
        self.advance_to(now);
        debug!("Command {:?} at {:?}", command, self.now);

        match command {
            Command::EnqueueFloor(floor) => self.enqueue_floor(floor),
            Command::ManualOpen => self.manual_open(),
            Command::ManualClose => self.manual_close(),
            Command::ClearQueue => {
                self.queue.clear();
                self.message = "Queue cleared. Press any floor.".to_string();
                info!("Queue cleared");
            }
            Command::SetVoiceEnabled(enabled) => self.announcer.set_voice_enabled(enabled),
            Command::SetEffectVolume(volume) => self.announcer.set_volume(volume),
            Command::SetDispatchPolicy(policy) => self.set_policy(policy),
        }

        self.settle();
    }

    /// Fires every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((handle, action)) = self.timers.pop_due(now) {
            self.now = handle.deadline();
            debug!("Timer {:?} fired at {:?}", action, self.now);
            self.handle_timer(action);
            self.settle();
        }
        if now > self.now {
            self.now = now;
        }
    }

    pub fn advance_by(&mut self, elapsed: Duration) {
        self.advance_to(self.now + elapsed);
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Cancels every outstanding timer. Nothing fires after this.
    pub fn shutdown(&mut self) {
        let cancelled = self.timers.cancel_all();
        self.travel_timer = None;
        self.departure_timer = None;
        self.auto_close_timer = None;
        self.manual_door_timer = None;
        self.door_timer = None;
        self.stop_timer = None;
        self.door.abort();
        info!("Elevator shut down, {} pending timers cancelled", cancelled);
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        ElevatorSnapshot {
            behaviour: self.behaviour,
            floor: self.floor,
            direction: self.direction,
            door_state: self.door.state(),
            queue: self.queue.as_slice().to_vec(),
            message: self.message.clone(),
            mission: self.mission.as_ref().map(|mission| mission.status()),
        }
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_direction(&self) -> Direction {
        self.last_direction
    }

    pub fn behaviour(&self) -> Behaviour {
        self.behaviour
    }

    pub fn door_state(&self) -> DoorState {
        self.door.state()
    }

    pub fn is_door_animating(&self) -> bool {
        self.door.is_animating()
    }

    pub fn is_serving_stop(&self) -> bool {
        self.serving_stop
    }

    pub fn is_auto_close_armed(&self) -> bool {
        self.auto_close_armed
    }

    pub fn queue(&self) -> &[u8] {
        self.queue.as_slice()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn mission(&self) -> Option<MissionUpdate> {
        self.mission.as_ref().map(|mission| mission.status())
    }

    pub fn target(&self) -> Option<u8> {
        let service_direction = match self.direction {
            Direction::Stop => self.last_direction,
            moving => moving,
        };
        scheduler::next_target(
            self.queue.policy(),
            self.floor,
            self.queue.as_slice(),
            service_direction,
        )
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if !self.settings.is_serviceable(self.floor) {
            return Err(InvariantViolation::FloorOutOfRange(self.floor));
        }
        if self.door.is_animating() != self.door_timer.is_some() {
            return Err(InvariantViolation::DoorAnimationMismatch);
        }
        if self.travel_timer.is_some() && (self.door.is_open() || self.door.is_animating()) {
            return Err(InvariantViolation::MovingWithDoorsOpen);
        }
        if self.behaviour == Behaviour::Idle
            && !self.serving_stop
            && self.queue.contains(self.floor)
        {
            return Err(InvariantViolation::CurrentFloorQueued(self.floor));
        }
        if self.direction != Direction::Stop && self.target().is_none() {
            return Err(InvariantViolation::DirectionWithoutTarget(self.direction));
        }
        Ok(())
    }

    /***************************************/
    /*              Commands               */
    /***************************************/
    fn enqueue_floor(&mut self, floor: u8) {
        if !self.settings.is_serviceable(floor) {
            warn!("Ignoring call for floor {} outside the serviceable range", floor);
            return;
        }

        if floor == self.floor {
            if self.settings.open_on_current_floor_call && self.behaviour == Behaviour::Idle {
                self.manual_open();
            } else {
                debug!("Ignoring call for current floor {}", floor);
            }
            return;
        }

        if !self.queue.enqueue(floor, self.floor) {
            debug!("Floor {} already queued", floor);
            return;
        }

        self.message = format!("Floor {} registered.", floor);
        info!("Registered call for floor {}", floor);
        self.announcer.announce(Announcement::CallRegistered);
    }

    fn manual_open(&mut self) {
        if self.door_busy()
            || self.door.is_open()
            || self.serving_stop
            || self.travel_timer.is_some()
        {
            debug!("Ignoring manual open");
            return;
        }

        self.disarm_auto_close();
        self.announcer.announce(Announcement::DoorsOpening);
        self.manual_door_timer = Some(self.schedule(
            self.timing.manual_door_delay(),
            TimerAction::ManualDoor(DoorState::Open),
        ));
    }

    fn manual_close(&mut self) {
        if self.door_busy() || !self.door.is_open() || self.serving_stop {
            debug!("Ignoring manual close");
            return;
        }

        self.disarm_auto_close();
        self.cancel_departure();
        self.announcer.announce(Announcement::DoorsClosing);
        self.manual_door_timer = Some(self.schedule(
            self.timing.manual_door_delay(),
            TimerAction::ManualDoor(DoorState::Closed),
        ));
    }

    fn set_policy(&mut self, policy: DispatchPolicy) {
        if self.queue.policy() != policy {
            info!("Dispatch policy set to {:?}", policy);
            self.queue.set_policy(policy);
        }
    }

    /***************************************/
    /*               Timers                */
    /***************************************/
    fn handle_timer(&mut self, action: TimerAction) {
        match action {
            TimerAction::FloorReached(direction) => {
                self.travel_timer = None;
                let next = direction.step(self.floor);
                if self.settings.is_serviceable(next) {
                    self.floor = next;
                }
                debug!("Passing floor {}", self.floor);
            }

            TimerAction::AnnounceOpen => {
                self.announcer.announce(Announcement::DoorsOpening);
                self.stop_timer = Some(self.schedule(
                    self.timing.open_announce_to_door_open(),
                    TimerAction::BeginStopOpening,
                ));
            }

            TimerAction::BeginStopOpening => {
                self.stop_timer = None;
                if !self.start_door(DoorState::Open, DoorContinuation::StopOpened) {
                    self.stop_timer =
                        Some(self.schedule(self.timing.stop_settle(), TimerAction::StopSettled));
                }
            }

            TimerAction::DoorAnimationDone => {
                self.door_timer = None;
                if let Some(continuation) = self.door.finish() {
                    self.door_finished(continuation);
                }
            }

            TimerAction::StopSettled => {
                self.stop_timer = None;
                self.serving_stop = false;
                self.auto_close_armed = true;
                self.behaviour = if self.door.is_open() {
                    Behaviour::DoorOpen
                } else {
                    Behaviour::Idle
                };
                self.message = "Doors opened.".to_string();
            }

            TimerAction::DepartureClose(direction) => {
                self.departure_timer = None;
                self.announcer.announce(Announcement::DoorsClosing);
                self.start_door(DoorState::Closed, DoorContinuation::Departure(direction));
            }

            TimerAction::DepartureAnnounce(direction) => {
                self.announcer.announce(Announcement::Departure(direction));
                self.last_direction = direction;
                if matches!(self.travel_timer, Some((_, heading)) if heading == direction) {
                    self.direction = direction;
                }
            }

            TimerAction::AutoClose => {
                self.auto_close_timer = None;
                self.announcer.announce(Announcement::DoorsClosing);
                self.start_door(DoorState::Closed, DoorContinuation::AutoClosed);
            }

            TimerAction::ManualDoor(requested) => {
                self.manual_door_timer = None;
                if !self.start_door(requested, DoorContinuation::Manual) {
                    debug!("Manual door request to {:?} no longer applies", requested);
                }
            }
        }
    }

    fn start_door(&mut self, requested: DoorState, continuation: DoorContinuation) -> bool {
        let accepted = match requested {
            DoorState::Open => self.door.open(continuation),
            DoorState::Closed => self.door.close(continuation),
        };
        if !accepted {
            return false;
        }

        self.announcer.announce(Announcement::DoorMove);
        self.behaviour = match requested {
            DoorState::Open => Behaviour::DoorOpening,
            DoorState::Closed => Behaviour::DoorClosing,
        };
        self.door_timer =
            Some(self.schedule(self.door.animation_time(), TimerAction::DoorAnimationDone));
        true
    }

    fn door_finished(&mut self, continuation: DoorContinuation) {
        debug!("Doors {:?}", self.door.state());
        match continuation {
            DoorContinuation::StopOpened => {
                self.behaviour = Behaviour::DoorOpen;
                self.stop_timer =
                    Some(self.schedule(self.timing.stop_settle(), TimerAction::StopSettled));
            }
            DoorContinuation::Departure(direction) => {
                self.behaviour = Behaviour::Idle;
                self.schedule(
                    self.timing.departure_announce_delay(),
                    TimerAction::DepartureAnnounce(direction),
                );
            }
            DoorContinuation::AutoClosed => {
                self.auto_close_armed = false;
                self.behaviour = Behaviour::Idle;
            }
            DoorContinuation::Manual => {
                if self.door.is_open() {
                    self.behaviour = Behaviour::DoorOpen;
                    self.message = "Doors opened.".to_string();
                } else {
                    self.behaviour = Behaviour::Idle;
                }
            }
        }
    }

    /***************************************/
    /*          Transition rules           */
    /***************************************/
    fn settle(&mut self) {
        self.evaluate();
        if let Err(violation) = self.check_invariants() {
            error!("Invariant violated: {}", violation);
        }
        self.publish();
    }

    fn evaluate(&mut self) {
        // An in-flight stop or door movement finishes first
        if self.serving_stop || self.door_busy() {
            return;
        }

        match self.target() {
            None => {
                self.cancel_travel();
                self.cancel_departure();
                self.direction = Direction::Stop;
                if self.door.is_open() {
                    self.behaviour = Behaviour::DoorOpen;
                    self.arm_auto_close_timer();
                } else {
                    self.behaviour = Behaviour::Idle;
                }
            }

            Some(target) if target == self.floor => self.arrive(target),

            Some(target) => {
                let heading = Direction::towards(self.floor, target);
                if self.door.is_open() {
                    self.disarm_auto_close();
                    self.behaviour = Behaviour::DoorOpen;
                    self.plan_departure(heading);
                } else {
                    self.cancel_departure();
                    self.plan_travel(heading);
                }
            }
        }
    }

    fn arrive(&mut self, floor: u8) {
        self.cancel_travel();
        self.cancel_departure();
        self.disarm_auto_close();

        self.serving_stop = true;
        if let Err(e) = self.queue.remove_served(floor) {
            error!("Failed to remove served floor: {}", e);
        }
        self.direction = Direction::Stop;
        self.behaviour = Behaviour::Arrived;
        self.message = format!("Arrived at floor {}.", floor);
        info!("Arrived at floor {}", floor);
        self.announcer.announce(Announcement::Arrival);

        if let Some(mission) = self.mission.as_mut() {
            if let Some(update) = mission.on_arrival(floor) {
                self.message = format!(
                    "Arrived at floor {}. Mission complete! Streak {}. Next: floor {}.",
                    floor, update.streak, update.target
                );
                let _ = self.mission_tx.send(update);
            }
        }

        self.stop_timer = Some(if self.door.is_open() {
            self.schedule(self.timing.stop_settle(), TimerAction::StopSettled)
        } else {
            self.schedule(
                self.timing.arrival_to_open_announce(),
                TimerAction::AnnounceOpen,
            )
        });
    }

    fn plan_departure(&mut self, heading: Direction) {
        if let Some((_, planned)) = self.departure_timer {
            if planned == heading {
                return;
            }
        }
        self.cancel_departure();

        self.message = "Departing, closing doors.".to_string();
        let handle = self.schedule(
            self.timing.door_dwell_before_auto_close(),
            TimerAction::DepartureClose(heading),
        );
        self.departure_timer = Some((handle, heading));
    }

    fn plan_travel(&mut self, heading: Direction) {
        if let Some((_, planned)) = self.travel_timer {
            if planned == heading {
                return;
            }
        }
        self.cancel_travel();

        self.direction = heading;
        self.last_direction = heading;
        self.behaviour = Behaviour::Moving;
        self.announcer.announce(Announcement::MotorStart);
        let handle = self.schedule(self.timing.floor_travel(), TimerAction::FloorReached(heading));
        self.travel_timer = Some((handle, heading));
    }

    fn arm_auto_close_timer(&mut self) {
        if self.auto_close_armed && self.auto_close_timer.is_none() {
            self.auto_close_timer = Some(self.schedule(
                self.timing.door_dwell_before_auto_close(),
                TimerAction::AutoClose,
            ));
        }
    }

    fn disarm_auto_close(&mut self) {
        self.auto_close_armed = false;
        if let Some(handle) = self.auto_close_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn cancel_travel(&mut self) {
        if let Some((handle, _)) = self.travel_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn cancel_departure(&mut self) {
        if let Some((handle, _)) = self.departure_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn door_busy(&self) -> bool {
        self.door.is_animating() || self.manual_door_timer.is_some()
    }

    fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerHandle {
        self.timers.schedule(self.now, delay, action)
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if self.last_snapshot.as_ref() == Some(&snapshot) {
            return;
        }
        let _ = self.state_tx.send(snapshot.clone());
        self.last_snapshot = Some(snapshot);
    }
}
