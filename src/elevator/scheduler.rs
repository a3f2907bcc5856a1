/*
 * Next-stop selection.
 *
 * Both policies are pure functions of the current floor, the queued calls and
 * the direction of service; the state machine calls `next_target` on every
 * transition instead of caching the result.
 */
use crate::shared::{Direction, DispatchPolicy};

pub fn next_target(
    policy: DispatchPolicy,
    current_floor: u8,
    queue: &[u8],
    direction: Direction,
) -> Option<u8> {
    match policy {
        DispatchPolicy::NearestFirst => nearest_first(current_floor, queue, direction),
        DispatchPolicy::Fifo => fifo(queue),
    }
}

fn nearest_first(current_floor: u8, queue: &[u8], direction: Direction) -> Option<u8> {
    if queue.is_empty() {
        return None;
    }

    // Serve in place
    if queue.contains(&current_floor) {
        return Some(current_floor);
    }

    let nearest_above = queue.iter().copied().filter(|f| *f > current_floor).min();
    let nearest_below = queue.iter().copied().filter(|f| *f < current_floor).max();

    match direction {
        // Keep going up, otherwise reverse
        Direction::Up => nearest_above.or(nearest_below),

        // Keep going down, otherwise reverse
        Direction::Down => nearest_below.or(nearest_above),

        // Closest call wins, ties go up
        Direction::Stop => match (nearest_above, nearest_below) {
            (Some(above), Some(below)) => {
                if above - current_floor <= current_floor - below {
                    Some(above)
                } else {
                    Some(below)
                }
            }
            (above, below) => above.or(below),
        },
    }
}

fn fifo(queue: &[u8]) -> Option<u8> {
    queue.first().copied()
}
