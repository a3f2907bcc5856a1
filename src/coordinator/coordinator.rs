/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::ElevatorFSM;
use crate::shared::Command;

/***************************************/
/*               Enums                 */
/***************************************/
enum Event {
    NewCommand(Command),
    TimerDue,
    Terminate,
}

/**
 * Drives an `ElevatorFSM` against the wall clock.
 *
 * The coordinator owns the state machine and serializes every input to it:
 * commands from the outside and the deadline of the earliest pending timer.
 * Time handed to the machine is measured from when `run` was entered.
 *
 * # Fields
 * - `fsm`:             The state machine being driven.
 * - `command_rx`:      Incoming user commands.
 * - `terminate_rx`:    Stops the loop and cancels every pending timer.
 * - `start`:           Instant time zero maps to.
 */
pub struct Coordinator {
    fsm: ElevatorFSM,
    command_rx: cbc::Receiver<Command>,
    terminate_rx: cbc::Receiver<()>,
    start: Instant,
}

/***************************************/
/*             Public API              */
/***************************************/
impl Coordinator {
    pub fn new(
        fsm: ElevatorFSM,
        command_rx: cbc::Receiver<Command>,
        terminate_rx: cbc::Receiver<()>,
    ) -> Coordinator {
        Coordinator {
            fsm,
            command_rx,
            terminate_rx,
            start: Instant::now(),
        }
    }

    /// Runs until terminated or until every command sender is dropped.
    /// Returns the state machine after shutdown.
    pub fn run(mut self) -> ElevatorFSM {
        self.start = Instant::now();
        self.fsm.start();

        loop {
            match self.wait_for_event() {
                Event::NewCommand(command) => {
                    let now = self.elapsed();
                    self.fsm.handle_command(command, now);
                }
                Event::TimerDue => {
                    let now = self.elapsed();
                    self.fsm.advance_to(now);
                }
                Event::Terminate => {
                    self.fsm.shutdown();
                    info!("Coordinator terminated after {:?}", self.elapsed());
                    return self.fsm;
                }
            }
        }
    }

    fn wait_for_event(&self) -> Event {
        let timer = match self.fsm.next_deadline() {
            Some(deadline) => cbc::at(self.start + deadline),
            None => cbc::never(),
        };

        cbc::select! {
            recv(self.command_rx) -> command => {
                match command {
                    Ok(command) => Event::NewCommand(command),
                    Err(_) => {
                        debug!("Command channel closed");
                        Event::Terminate
                    }
                }
            },

            recv(timer) -> _ => Event::TimerDue,

            recv(self.terminate_rx) -> _ => Event::Terminate,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
