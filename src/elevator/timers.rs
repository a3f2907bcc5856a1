use std::collections::BTreeMap;
use std::time::Duration;

/// Handle to a scheduled action. Only valid for the queue that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerHandle {
    deadline: Duration,
    seq: u64,
}

impl TimerHandle {
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/**
 * Pending delayed actions, ordered by deadline.
 *
 * Time is measured as a `Duration` since the owner started, so the queue works
 * the same against a wall clock and a simulated one. Actions sharing a deadline
 * fire in the order they were scheduled.
 */
#[derive(Debug)]
pub struct TimerQueue<A> {
    pending: BTreeMap<TimerHandle, A>,
    next_seq: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        TimerQueue {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> TimerQueue<A> {
        TimerQueue::default()
    }

    pub fn schedule(&mut self, now: Duration, delay: Duration, action: A) -> TimerHandle {
        let handle = TimerHandle {
            deadline: now + delay,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(handle, action);
        handle
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|handle| handle.deadline)
    }

    /// Removes and returns the earliest action due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, A)> {
        let first = *self.pending.keys().next()?;
        if first.deadline > now {
            return None;
        }
        self.pending.remove(&first).map(|action| (first, action))
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(ms(0), ms(900), "travel");
        timers.schedule(ms(0), ms(400), "announce");
        timers.schedule(ms(100), ms(300), "settle");

        assert_eq!(timers.next_deadline(), Some(ms(400)));
        assert_eq!(timers.pop_due(ms(399)).map(|(_, a)| a), None);

        let fired: Vec<&str> = std::iter::from_fn(|| timers.pop_due(ms(1000)).map(|(_, a)| a)).collect();
        assert_eq!(fired, vec!["announce", "settle", "travel"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(ms(0), ms(50), 1);
        timers.schedule(ms(0), ms(50), 2);
        timers.schedule(ms(0), ms(50), 3);

        let fired: Vec<i32> = std::iter::from_fn(|| timers.pop_due(ms(50)).map(|(_, a)| a)).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let auto_close = timers.schedule(ms(0), ms(1800), "auto-close");
        timers.schedule(ms(0), ms(2000), "other");

        assert!(timers.cancel(auto_close));
        assert!(!timers.cancel(auto_close));
        assert!(!timers.is_pending(auto_close));
        assert_eq!(timers.pop_due(ms(5000)).map(|(_, a)| a), Some("other"));
        assert_eq!(timers.pop_due(ms(5000)).map(|(_, a)| a), None);
    }

    #[test]
    fn test_cancel_all_on_teardown() {
        let mut timers = TimerQueue::new();
        timers.schedule(ms(0), ms(10), ());
        timers.schedule(ms(0), ms(20), ());
        assert_eq!(timers.cancel_all(), 2);
        assert_eq!(timers.next_deadline(), None);
    }
}
