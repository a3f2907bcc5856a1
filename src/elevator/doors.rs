use crate::shared::DoorState;
use std::time::Duration;

/**
 * Door open/close animation driver.
 *
 * Owns the `animating` flag: at most one animation is in flight, and a request
 * for the state the door is already in is rejected. The animation itself is a
 * timer owned by the caller; `finish` is called when it elapses and hands back
 * the continuation registered with the accepted request, exactly once.
 *
 * # Fields
 * - `state`:           Door position once the current animation (if any) has finished flipping it.
 * - `animating`:       An open or close animation is in flight.
 * - `heading`:         Door state the in-flight animation ends in.
 * - `continuation`:    What the owner should do when the in-flight animation completes.
 * - `animation_time`:  Duration of a single open or close animation.
 */
#[derive(Debug)]
pub struct DoorController<C> {
    state: DoorState,
    animating: bool,
    heading: DoorState,
    continuation: Option<C>,
    animation_time: Duration,
}

impl<C> DoorController<C> {
    pub fn new(initial: DoorState, animation_time: Duration) -> DoorController<C> {
        DoorController {
            state: initial,
            animating: false,
            heading: initial,
            continuation: None,
            animation_time,
        }
    }

    pub fn open(&mut self, continuation: C) -> bool {
        self.begin(DoorState::Open, continuation)
    }

    pub fn close(&mut self, continuation: C) -> bool {
        self.begin(DoorState::Closed, continuation)
    }

    fn begin(&mut self, requested: DoorState, continuation: C) -> bool {
        if self.animating || self.state == requested {
            return false;
        }
        self.animating = true;
        self.heading = requested;
        self.continuation = Some(continuation);
        true
    }

    /// Completes the in-flight animation. Returns None if nothing was animating.
    pub fn finish(&mut self) -> Option<C> {
        if !self.animating {
            return None;
        }
        self.state = self.heading;
        self.animating = false;
        self.continuation.take()
    }

    /// Drops an in-flight animation without flipping the door.
    pub fn abort(&mut self) {
        self.animating = false;
        self.heading = self.state;
        self.continuation = None;
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DoorState::Open
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Door state the in-flight animation ends in, if any.
    pub fn heading(&self) -> Option<DoorState> {
        if self.animating {
            Some(self.heading)
        } else {
            None
        }
    }

    pub fn animation_time(&self) -> Duration {
        self.animation_time
    }
}
