pub mod mission;

pub use mission::MissionEvaluator;
