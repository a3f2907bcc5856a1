/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::debug;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{clamp_volume, AnnouncerConfig};
use crate::shared::{Cue, CueEvent, Direction};

/***************************************/
/*               Enums                 */
/***************************************/
/// Engine events that have something to say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    CallRegistered,
    Arrival,
    MotorStart,
    DoorMove,
    DoorsOpening,
    DoorsClosing,
    Departure(Direction),
}

impl Announcement {
    pub fn cue(&self) -> Option<Cue> {
        match self {
            Announcement::CallRegistered => Some(Cue::CallRegistered),
            Announcement::Arrival => Some(Cue::ArrivalChime),
            Announcement::MotorStart => Some(Cue::MotorRunning),
            Announcement::DoorMove => Some(Cue::DoorMechanism),
            Announcement::DoorsOpening => Some(Cue::OpenDoorVoice),
            Announcement::DoorsClosing => Some(Cue::CloseDoorVoice),
            Announcement::Departure(Direction::Up) => Some(Cue::UpVoice),
            Announcement::Departure(Direction::Down) => Some(Cue::DownVoice),
            Announcement::Departure(Direction::Stop) => None,
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
/**
 * Turns engine announcements into cue events for the external announcer.
 *
 * Voice cues are dropped while voice is disabled; everything else always fires.
 * Each trigger halts any running instance of the same cue and restarts it from
 * the beginning, so the announcer receives a `Halt` immediately followed by a
 * `Play`. Different cues are free to overlap.
 */
pub struct AnnouncementSequencer {
    cue_tx: cbc::Sender<CueEvent>,
    voice_enabled: bool,
    volume: f32,
}

impl AnnouncementSequencer {
    pub fn new(config: &AnnouncerConfig, cue_tx: cbc::Sender<CueEvent>) -> AnnouncementSequencer {
        AnnouncementSequencer {
            cue_tx,
            voice_enabled: config.voice_enabled,
            volume: clamp_volume(config.effect_volume),
        }
    }

    /// Returns the cue that was fired, if any.
    pub fn announce(&self, announcement: Announcement) -> Option<Cue> {
        let cue = announcement.cue()?;
        if cue.is_voice() && !self.voice_enabled {
            debug!("Voice disabled, suppressing {}", cue);
            return None;
        }

        debug!("Cue {}", cue);
        // Receiver may be gone
        let _ = self.cue_tx.send(CueEvent::Halt { cue });
        let _ = self.cue_tx.send(CueEvent::Play {
            cue,
            volume: self.volume,
        });
        Some(cue)
    }

    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.voice_enabled = enabled;
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = clamp_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn setup_sequencer(voice_enabled: bool) -> (AnnouncementSequencer, cbc::Receiver<CueEvent>) {
        let (cue_tx, cue_rx) = unbounded::<CueEvent>();
        let config = AnnouncerConfig {
            voice_enabled,
            effect_volume: 0.5,
        };
        (AnnouncementSequencer::new(&config, cue_tx), cue_rx)
    }

    #[test]
    fn test_trigger_halts_then_plays_same_cue() {
        // Arrange
        let (sequencer, cue_rx) = setup_sequencer(true);

        // Act
        let fired = sequencer.announce(Announcement::Arrival);

        // Assert
        assert_eq!(fired, Some(Cue::ArrivalChime));
        let events: Vec<CueEvent> = cue_rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                CueEvent::Halt { cue: Cue::ArrivalChime },
                CueEvent::Play { cue: Cue::ArrivalChime, volume: 0.5 },
            ]
        );
    }

    #[test]
    fn test_voice_cues_suppressed_when_disabled() {
        // Arrange
        let (sequencer, cue_rx) = setup_sequencer(false);

        // Act
        let voice = sequencer.announce(Announcement::DoorsOpening);
        let direction = sequencer.announce(Announcement::Departure(Direction::Up));
        let motor = sequencer.announce(Announcement::MotorStart);

        // Assert
        assert_eq!(voice, None);
        assert_eq!(direction, None);
        assert_eq!(motor, Some(Cue::MotorRunning));
        assert_eq!(cue_rx.try_iter().count(), 2);
    }

    #[test]
    fn test_departure_maps_direction_to_voice() {
        let (mut sequencer, _cue_rx) = setup_sequencer(true);
        assert_eq!(sequencer.announce(Announcement::Departure(Direction::Up)), Some(Cue::UpVoice));
        assert_eq!(sequencer.announce(Announcement::Departure(Direction::Down)), Some(Cue::DownVoice));
        assert_eq!(sequencer.announce(Announcement::Departure(Direction::Stop)), None);

        sequencer.set_voice_enabled(false);
        assert!(!sequencer.voice_enabled());
        assert_eq!(sequencer.announce(Announcement::Departure(Direction::Up)), None);
    }

    #[test]
    fn test_volume_is_clamped_and_attached() {
        let (mut sequencer, cue_rx) = setup_sequencer(true);
        sequencer.set_volume(1.7);
        sequencer.set_volume(f32::NAN);
        sequencer.announce(Announcement::DoorMove);

        let played: Vec<f32> = cue_rx
            .try_iter()
            .filter_map(|event| match event {
                CueEvent::Play { volume, .. } => Some(volume),
                CueEvent::Halt { .. } => None,
            })
            .collect();
        assert_eq!(played, vec![1.0]);
    }
}
