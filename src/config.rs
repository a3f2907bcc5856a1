/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::DispatchPolicy;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub elevator: ElevatorConfig,
    pub announcer: AnnouncerConfig,
    pub timing: TimingConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ElevatorConfig {
    pub min_floor: u8,
    pub max_floor: u8,
    pub initial_floor: u8,
    pub doors_open_at_start: bool,
    pub dispatch_policy: DispatchPolicy,
    pub mission_mode: bool,
    pub open_on_current_floor_call: bool,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AnnouncerConfig {
    pub voice_enabled: bool,
    pub effect_volume: f32,
}

/// All values are milliseconds.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub door_animation: u64,
    pub floor_travel: u64,
    pub arrival_to_open_announce: u64,
    pub open_announce_to_door_open: u64,
    pub door_dwell_before_auto_close: u64,
    pub departure_announce_delay: u64,
    pub stop_settle: u64,
    pub manual_door_delay: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Default for ElevatorConfig {
    fn default() -> Self {
        ElevatorConfig {
            min_floor: 1,
            max_floor: 10,
            initial_floor: 1,
            doors_open_at_start: false,
            dispatch_policy: DispatchPolicy::NearestFirst,
            mission_mode: false,
            open_on_current_floor_call: false,
        }
    }
}

impl ElevatorConfig {
    pub fn is_serviceable(&self, floor: u8) -> bool {
        (self.min_floor..=self.max_floor).contains(&floor)
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        AnnouncerConfig {
            voice_enabled: true,
            effect_volume: 0.7,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            door_animation: 900,
            floor_travel: 900,
            arrival_to_open_announce: 900,
            open_announce_to_door_open: 400,
            door_dwell_before_auto_close: 1800,
            departure_announce_delay: 700,
            stop_settle: 300,
            manual_door_delay: 180,
        }
    }
}

impl TimingConfig {
    pub fn door_animation(&self) -> Duration {
        Duration::from_millis(self.door_animation)
    }

    pub fn floor_travel(&self) -> Duration {
        Duration::from_millis(self.floor_travel)
    }

    pub fn arrival_to_open_announce(&self) -> Duration {
        Duration::from_millis(self.arrival_to_open_announce)
    }

    pub fn open_announce_to_door_open(&self) -> Duration {
        Duration::from_millis(self.open_announce_to_door_open)
    }

    pub fn door_dwell_before_auto_close(&self) -> Duration {
        Duration::from_millis(self.door_dwell_before_auto_close)
    }

    pub fn departure_announce_delay(&self) -> Duration {
        Duration::from_millis(self.departure_announce_delay)
    }

    pub fn stop_settle(&self) -> Duration {
        Duration::from_millis(self.stop_settle)
    }

    pub fn manual_door_delay(&self) -> Duration {
        Duration::from_millis(self.manual_door_delay)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let elevator = &self.elevator;
        if elevator.min_floor == 0 {
            return Err(ConfigError::Invalid("min_floor must be at least 1".into()));
        }
        if elevator.min_floor > elevator.max_floor {
            return Err(ConfigError::Invalid(format!(
                "min_floor {} is above max_floor {}",
                elevator.min_floor, elevator.max_floor
            )));
        }
        if !elevator.is_serviceable(elevator.initial_floor) {
            return Err(ConfigError::Invalid(format!(
                "initial_floor {} is outside {}..={}",
                elevator.initial_floor, elevator.min_floor, elevator.max_floor
            )));
        }
        if elevator.mission_mode && elevator.min_floor == elevator.max_floor {
            return Err(ConfigError::Invalid(
                "mission mode needs at least two floors".into(),
            ));
        }
        Ok(())
    }
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(config_str)?;
    config.announcer.effect_volume = clamp_volume(config.announcer.effect_volume);
    config.validate()?;
    Ok(config)
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        AnnouncerConfig::default().effect_volume
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.timing.door_dwell_before_auto_close, 1800);
        assert_eq!(config.elevator.max_floor, 10);
    }

    #[test]
    fn test_partial_sections_are_merged() {
        let config = parse_config(
            r#"
            [elevator]
            initial_floor = 4
            dispatch_policy = "fifo"

            [timing]
            floor_travel = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.elevator.initial_floor, 4);
        assert_eq!(config.elevator.dispatch_policy, DispatchPolicy::Fifo);
        assert_eq!(config.elevator.max_floor, 10);
        assert_eq!(config.timing.floor_travel, 50);
        assert_eq!(config.timing.door_animation, 900);
    }

    #[test]
    fn test_volume_is_clamped() {
        let config = parse_config("[announcer]\neffect_volume = 3.5\n").unwrap();
        assert_eq!(config.announcer.effect_volume, 1.0);
    }

    #[test]
    fn test_initial_floor_out_of_range_is_rejected() {
        let result = parse_config("[elevator]\ninitial_floor = 11\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let result = parse_config("[elevator\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
