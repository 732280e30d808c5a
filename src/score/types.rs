// Score object model
// Notes, tracks and scores in tick time, as read from and written to MIDI

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest valid MIDI pitch / velocity value
pub const MIDI_MAX: u8 = 127;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Invalid note (pitch {pitch}, onset {onset}, offset {offset}, velocity {velocity}): {reason}")]
    InvalidNote {
        pitch: u8,
        onset: u32,
        offset: u32,
        velocity: u8,
        reason: &'static str,
    },
}

pub type ScoreResult<T> = Result<T, ScoreError>;

/// A single note event in tick time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// MIDI pitch (0-127)
    pub pitch: u8,

    /// Start tick
    pub onset: u32,

    /// End tick (exclusive)
    pub offset: u32,

    /// MIDI velocity (1-127)
    pub velocity: u8,
}

impl Note {
    /// Create a validated note
    pub fn new(pitch: u8, onset: u32, offset: u32, velocity: u8) -> ScoreResult<Self> {
        let invalid = |reason| ScoreError::InvalidNote {
            pitch,
            onset,
            offset,
            velocity,
            reason,
        };

        if pitch > MIDI_MAX {
            return Err(invalid("pitch out of MIDI range"));
        }
        if velocity == 0 || velocity > MIDI_MAX {
            return Err(invalid("velocity must be in 1..=127"));
        }
        if offset <= onset {
            return Err(invalid("offset must be after onset"));
        }

        Ok(Note {
            pitch,
            onset,
            offset,
            velocity,
        })
    }

    /// Duration in ticks
    pub fn duration(&self) -> u32 {
        self.offset.saturating_sub(self.onset)
    }

    /// Force the note into a playable shape: velocity in [1, 127] and at
    /// least `min_duration` ticks long. Returns true if anything changed.
    pub fn coerce(&mut self, min_duration: u32) -> bool {
        let mut changed = false;

        let velocity = self.velocity.clamp(1, MIDI_MAX);
        if velocity != self.velocity {
            self.velocity = velocity;
            changed = true;
        }

        if self.duration() < min_duration {
            self.offset = self.onset.saturating_add(min_duration);
            changed = true;
        }

        changed
    }
}

/// One instrument part: an ordered list of notes plus passthrough metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Track name (from the MIDI TrackName meta event)
    pub name: String,

    /// General MIDI program number
    pub program: u8,

    /// MIDI channel (0-15)
    pub channel: u8,

    /// True for percussion tracks (channel 10)
    pub is_drum: bool,

    /// Notes in arrival order
    pub notes: Vec<Note>,
}

impl Track {
    /// Create an empty track
    pub fn new(name: impl Into<String>) -> Self {
        Track {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a track from a list of notes
    pub fn with_notes(name: impl Into<String>, notes: Vec<Note>) -> Self {
        Track {
            name: name.into(),
            notes,
            ..Default::default()
        }
    }

    /// Tick of the last note-off in the track
    pub fn end_tick(&self) -> u32 {
        self.notes.iter().map(|n| n.offset).max().unwrap_or(0)
    }
}

/// Tempo change (microseconds per quarter note)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u32,
    pub us_per_quarter: u32,
}

/// Time signature change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignatureChange {
    pub tick: u32,
    pub numerator: u8,
    /// Denominator as a power of two (2 = quarter note)
    pub denominator_pow2: u8,
}

/// Key signature change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignatureChange {
    pub tick: u32,
    /// Number of sharps (positive) or flats (negative)
    pub accidentals: i8,
    pub minor: bool,
}

/// A complete score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Ticks per beat (quarter note)
    pub resolution: u16,

    /// Instrument parts
    pub tracks: Vec<Track>,

    pub tempos: Vec<TempoChange>,
    pub time_signatures: Vec<TimeSignatureChange>,
    pub key_signatures: Vec<KeySignatureChange>,
}

impl Score {
    /// Create an empty score at the given resolution
    pub fn new(resolution: u16) -> Self {
        Score {
            resolution: resolution.max(1),
            tracks: Vec::new(),
            tempos: Vec::new(),
            time_signatures: Vec::new(),
            key_signatures: Vec::new(),
        }
    }

    /// Total number of notes across all tracks
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }

    /// Measure length in ticks from the first time signature, 4/4 if none
    ///
    /// `numerator` units of a 1/2^pow2 note: 3/4 is three quarters, 6/8 is
    /// three quarters, 2/2 is four quarters.
    pub fn measure_ticks(&self) -> u32 {
        let quarter = self.resolution.max(1) as u64;
        let ticks = match self.time_signatures.first() {
            Some(ts) => {
                let whole = quarter * 4;
                (whole * ts.numerator.max(1) as u64) >> ts.denominator_pow2.min(6)
            }
            None => quarter * 4,
        };
        ticks.clamp(1, u32::MAX as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_validation() {
        assert!(Note::new(60, 0, 480, 100).is_ok());
        assert!(Note::new(128, 0, 480, 100).is_err());
        assert!(Note::new(60, 0, 480, 0).is_err());
        assert!(Note::new(60, 480, 480, 100).is_err());
        assert!(Note::new(60, 500, 480, 100).is_err());
    }

    #[test]
    fn test_invalid_note_reason() {
        let err = Note::new(60, 10, 5, 64).unwrap_err();
        assert!(err.to_string().contains("offset must be after onset"));
    }

    #[test]
    fn test_coerce_short_note() {
        let mut note = Note {
            pitch: 60,
            onset: 100,
            offset: 100,
            velocity: 0,
        };

        assert!(note.coerce(15));
        assert_eq!(note.offset, 115);
        assert_eq!(note.velocity, 1);

        // Already valid notes are untouched
        assert!(!note.coerce(15));
    }

    fn with_meter(numerator: u8, denominator_pow2: u8) -> Score {
        let mut score = Score::new(480);
        score.time_signatures.push(TimeSignatureChange {
            tick: 0,
            numerator,
            denominator_pow2,
        });
        score
    }

    #[test]
    fn test_measure_ticks() {
        assert_eq!(Score::new(480).measure_ticks(), 1920);
        assert_eq!(with_meter(4, 2).measure_ticks(), 1920);
        assert_eq!(with_meter(3, 2).measure_ticks(), 1440);
        // Denominator counts: 6/8 and 3/4 bars are equally long, 2/2 matches 4/4
        assert_eq!(with_meter(6, 3).measure_ticks(), 1440);
        assert_eq!(with_meter(2, 1).measure_ticks(), 1920);
        assert_eq!(with_meter(7, 3).measure_ticks(), 1680);
    }

    #[test]
    fn test_track_end_tick() {
        let track = Track::with_notes(
            "piano",
            vec![
                Note::new(60, 0, 480, 80).unwrap(),
                Note::new(64, 240, 960, 80).unwrap(),
            ],
        );
        assert_eq!(track.end_tick(), 960);
        assert_eq!(Track::new("empty").end_tick(), 0);
    }
}
