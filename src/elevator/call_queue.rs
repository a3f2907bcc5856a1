use crate::shared::DispatchPolicy;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallQueueError {
    #[error("floor {floor} is not at the head of the queue (head is {head:?})")]
    NotAtHead { floor: u8, head: Option<u8> },

    #[error("floor {0} is not queued")]
    NotQueued(u8),
}

/**
 * Pending floor calls, in arrival order.
 *
 * The removal discipline follows the dispatch policy: nearest-first may serve
 * any member, FIFO only ever serves the head.
 */
#[derive(Debug, Clone, Default)]
pub struct CallQueue {
    floors: Vec<u8>,
    policy: DispatchPolicy,
}

impl CallQueue {
    pub fn new(policy: DispatchPolicy) -> CallQueue {
        CallQueue {
            floors: Vec::new(),
            policy,
        }
    }

    /// Returns false if the call was not added.
    pub fn enqueue(&mut self, floor: u8, current_floor: u8) -> bool {
        if floor == current_floor || self.floors.contains(&floor) {
            return false;
        }
        self.floors.push(floor);
        true
    }

    pub fn remove_served(&mut self, floor: u8) -> Result<(), CallQueueError> {
        match self.policy {
            DispatchPolicy::NearestFirst => {
                let index = self
                    .floors
                    .iter()
                    .position(|f| *f == floor)
                    .ok_or(CallQueueError::NotQueued(floor))?;
                self.floors.remove(index);
                Ok(())
            }
            DispatchPolicy::Fifo => {
                if self.head() != Some(floor) {
                    return Err(CallQueueError::NotAtHead {
                        floor,
                        head: self.head(),
                    });
                }
                self.floors.remove(0);
                Ok(())
            }
        }
    }

    pub fn clear(&mut self) {
        self.floors.clear();
    }

    pub fn set_policy(&mut self, policy: DispatchPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn head(&self) -> Option<u8> {
        self.floors.first().copied()
    }

    pub fn contains(&self, floor: u8) -> bool {
        self.floors.contains(&floor)
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.floors
    }
}
