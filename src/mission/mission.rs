//! Target-floor game played on top of the normal ride.
//!
//! The evaluator only watches arrivals; it never touches the call queue.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::shared::MissionUpdate;

pub struct MissionEvaluator {
    target: u8,
    streak: u32,
    min_floor: u8,
    max_floor: u8,
    rng: Box<dyn RngCore + Send>,
}

impl MissionEvaluator {
    /// Seeds from OS entropy.
    pub fn new(min_floor: u8, max_floor: u8, current_floor: u8) -> MissionEvaluator {
        Self::with_rng(min_floor, max_floor, current_floor, Box::new(StdRng::from_entropy()))
    }

    pub fn with_rng(
        min_floor: u8,
        max_floor: u8,
        current_floor: u8,
        rng: Box<dyn RngCore + Send>,
    ) -> MissionEvaluator {
        let mut evaluator = MissionEvaluator {
            target: current_floor,
            streak: 0,
            min_floor,
            max_floor,
            rng,
        };
        evaluator.target = evaluator.pick_target(current_floor);
        evaluator
    }

    /// Returns the new mission if `floor` completed the current one.
    pub fn on_arrival(&mut self, floor: u8) -> Option<MissionUpdate> {
        if floor != self.target {
            return None;
        }
        self.streak += 1;
        self.target = self.pick_target(floor);
        info!(
            "Mission reached floor {}, streak {}, next target {}",
            floor, self.streak, self.target
        );
        Some(self.status())
    }

    pub fn status(&self) -> MissionUpdate {
        MissionUpdate {
            target: self.target,
            streak: self.streak,
        }
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    // Uniform over the serviceable floors minus `exclude`
    fn pick_target(&mut self, exclude: u8) -> u8 {
        let excluded_in_range = (self.min_floor..=self.max_floor).contains(&exclude);
        let span = self.max_floor as u32 - self.min_floor as u32 + 1;
        let candidates = if excluded_in_range { span - 1 } else { span };
        if candidates == 0 {
            return exclude;
        }

        let index = self.rng.gen_range(0..candidates) as u8;
        let floor = self.min_floor + index;
        if excluded_in_range && floor >= exclude {
            floor + 1
        } else {
            floor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64, current_floor: u8) -> MissionEvaluator {
        MissionEvaluator::with_rng(1, 10, current_floor, Box::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn test_initial_target_differs_from_current_floor() {
        for seed in 0..200 {
            let mission = seeded(seed, 1);
            assert_ne!(mission.target(), 1);
            assert!((1..=10).contains(&mission.target()));
            assert_eq!(mission.streak(), 0);
        }
    }

    #[test]
    fn test_arrival_at_target_increments_streak_and_moves_target() {
        // Arrange
        let mut mission = seeded(7, 1);
        let first_target = mission.target();

        // Act
        let update = mission.on_arrival(first_target).unwrap();

        // Assert
        assert_eq!(update.streak, 1);
        assert_ne!(update.target, first_target);
        assert_eq!(mission.status(), update);
    }

    #[test]
    fn test_arrival_elsewhere_is_ignored() {
        let mut mission = seeded(3, 5);
        let target = mission.target();
        let elsewhere = if target == 10 { 9 } else { target + 1 };

        assert_eq!(mission.on_arrival(elsewhere), None);
        assert_eq!(mission.streak(), 0);
        assert_eq!(mission.target(), target);
    }

    #[test]
    fn test_same_seed_gives_same_sequence() {
        let mut a = seeded(42, 1);
        let mut b = seeded(42, 1);
        for _ in 0..20 {
            assert_eq!(a.target(), b.target());
            let target = a.target();
            a.on_arrival(target);
            b.on_arrival(target);
        }
        assert_eq!(a.streak(), 20);
    }

    #[test]
    fn test_two_floor_building_alternates() {
        let mut mission = MissionEvaluator::with_rng(1, 2, 1, Box::new(StdRng::seed_from_u64(0)));
        assert_eq!(mission.target(), 2);
        assert_eq!(mission.on_arrival(2).map(|u| u.target), Some(1));
        assert_eq!(mission.on_arrival(1).map(|u| u.target), Some(2));
    }
}
