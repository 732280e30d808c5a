// Humanization profile definitions
// A profile is the full parameter bundle one (method, preset) pair resolves to

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Unknown {kind} '{name}'. Available: {}", available.join(", "))]
    NotFound {
        /// "method" or "preset"
        kind: &'static str,
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid profile override: {0}")]
    Invalid(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

/// Humanization method families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Plain velocity and timing randomization, no chord rolling
    Basic,

    /// Piano performance model: hands, accents, correlated chords, rolls
    PianoPerformance,
}

impl Method {
    pub const ALL: [Method; 2] = [Method::Basic, Method::PianoPerformance];

    /// Parse a method key
    pub fn parse(s: &str) -> ProfileResult<Self> {
        match s {
            "basic" => Ok(Method::Basic),
            "piano_performance" => Ok(Method::PianoPerformance),
            _ => Err(ProfileError::NotFound {
                kind: "method",
                name: s.to_string(),
                available: Method::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Basic => "basic",
            Method::PianoPerformance => "piano_performance",
        }
    }

    /// Human-readable method title
    pub fn title(&self) -> &'static str {
        match self {
            Method::Basic => "Basic Randomization",
            Method::PianoPerformance => "Advanced Piano Performance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Method::Basic => "Simple velocity and timing randomization",
            Method::PianoPerformance => {
                "Realistic piano performance with normal distribution chord rolling and hand separation"
            }
        }
    }

    /// Preset used when none is requested
    pub fn default_preset(&self) -> &'static str {
        match self {
            Method::Basic => "medium",
            Method::PianoPerformance => "classical",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spacing between successive notes of a rolled chord, in beats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollInterval {
    /// Same spacing for every chord
    Fixed { beats: f64 },

    /// Spacing drawn once per chord from N(mean, std)
    Normal { mean_beats: f64, std_beats: f64 },
}

/// Chord rolling behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordRollSettings {
    /// Base probability that a detected chord is rolled
    pub probability: f64,

    /// Standard deviation of the per-chord probability (0 = fixed)
    pub probability_std: f64,

    /// Note spacing within a rolled chord
    pub interval: RollInterval,
}

impl ChordRollSettings {
    /// Rolling that never happens
    pub fn disabled(interval_beats: f64) -> Self {
        ChordRollSettings {
            probability: 0.0,
            probability_std: 0.0,
            interval: RollInterval::Fixed {
                beats: interval_beats,
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.probability > 0.0
    }
}

/// Left/right hand split and per-hand scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandSettings {
    pub enabled: bool,

    /// Pitches below this belong to the left hand (60 = middle C)
    pub split_pitch: u8,

    /// Onset jitter scale for the left hand (< 1 = steadier)
    pub left_timing_factor: f64,

    /// Velocity range scale for the left hand
    pub left_velocity_factor: f64,

    /// Velocity range scale for the right hand (> 1 = more expressive)
    pub right_velocity_factor: f64,
}

impl Default for HandSettings {
    fn default() -> Self {
        HandSettings {
            enabled: false,
            split_pitch: 60,
            left_timing_factor: 0.8,
            left_velocity_factor: 0.9,
            right_velocity_factor: 1.1,
        }
    }
}

/// Phrase-end ritardando
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhraseSettings {
    pub enabled: bool,

    /// Notes at least this long (ticks) mark a phrase ending
    pub threshold_ticks: u32,

    /// Upper bound on the total delay a single note can accumulate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ticks: Option<u32>,
}

impl Default for PhraseSettings {
    fn default() -> Self {
        PhraseSettings {
            enabled: false,
            threshold_ticks: 480,
            max_delay_ticks: None,
        }
    }
}

/// Complete humanization parameter bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanizeProfile {
    pub method: Method,
    pub preset: String,
    pub description: String,

    /// Velocity jitter (+/- this value)
    pub velocity_range: u8,

    /// Note-on jitter in beats (+/-)
    pub onset_timing_beats: f64,

    /// Note-off jitter in beats (+/-)
    pub offset_timing_beats: f64,

    /// Shortest allowed note in beats
    pub min_duration_beats: f64,

    pub chord_roll: ChordRollSettings,
    pub hands: HandSettings,

    /// Scale velocity jitter by metrical position
    pub beat_accenting: bool,

    /// Simultaneous notes share a velocity offset
    pub chord_velocity_correlation: bool,

    /// Restrict roll patterns to jazz voicings
    pub jazz_chord_emphasis: bool,

    pub phrase: PhraseSettings,

    /// Onset window for chord detection
    pub chord_tolerance_ticks: u32,

    /// Onset window for velocity correlation groups
    pub correlation_tolerance_ticks: u32,
}

/// User overrides layered on top of a preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    pub velocity_range: Option<u8>,
    pub timing_range_beats: Option<f64>,
    pub roll_probability: Option<f64>,
}

impl HumanizeProfile {
    /// Apply overrides, validating each one
    pub fn with_overrides(mut self, overrides: &ProfileOverrides) -> ProfileResult<Self> {
        if let Some(range) = overrides.velocity_range {
            if range > 64 {
                return Err(ProfileError::Invalid(format!(
                    "velocity range {} outside 0-64",
                    range
                )));
            }
            self.velocity_range = range;
        }

        if let Some(beats) = overrides.timing_range_beats {
            if !beats.is_finite() || beats < 0.0 {
                return Err(ProfileError::Invalid(format!(
                    "timing range {} must be a non-negative number of beats",
                    beats
                )));
            }
            self.onset_timing_beats = beats;
        }

        if let Some(probability) = overrides.roll_probability {
            if !(0.0..=1.0).contains(&probability) {
                return Err(ProfileError::Invalid(format!(
                    "roll probability {} outside 0.0-1.0",
                    probability
                )));
            }
            if self.method == Method::Basic && probability > 0.0 {
                log::warn!("Roll probability override ignored: basic method never rolls chords");
            } else {
                self.chord_roll.probability = probability;
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Check every distribution and range parameter
    ///
    /// Standard deviations must be finite and non-negative, means and
    /// ranges finite and non-negative, probabilities within [0, 1].
    pub fn validate(&self) -> ProfileResult<()> {
        let non_negative = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ProfileError::Invalid(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )))
            }
        };

        non_negative("onset timing", self.onset_timing_beats)?;
        non_negative("offset timing", self.offset_timing_beats)?;
        non_negative("minimum duration", self.min_duration_beats)?;

        let roll = &self.chord_roll;
        if !(0.0..=1.0).contains(&roll.probability) {
            return Err(ProfileError::Invalid(format!(
                "roll probability {} outside 0.0-1.0",
                roll.probability
            )));
        }
        non_negative("roll probability std", roll.probability_std)?;

        match roll.interval {
            RollInterval::Fixed { beats } => non_negative("roll interval", beats)?,
            RollInterval::Normal {
                mean_beats,
                std_beats,
            } => {
                non_negative("roll interval mean", mean_beats)?;
                non_negative("roll interval std", std_beats)?;
            }
        }

        let hands = &self.hands;
        non_negative("left timing factor", hands.left_timing_factor)?;
        non_negative("left velocity factor", hands.left_velocity_factor)?;
        non_negative("right velocity factor", hands.right_velocity_factor)?;

        Ok(())
    }

    /// Convert beat-relative ranges to ticks at a given resolution
    pub fn tick_ranges(&self, resolution: u16) -> TickRanges {
        TickRanges::from_profile(self, resolution)
    }
}

/// Profile ranges expressed in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRanges {
    pub onset: u32,
    pub offset: u32,
    /// Never below 1, so offset > onset always holds
    pub min_duration: u32,
}

impl TickRanges {
    pub fn from_profile(profile: &HumanizeProfile, resolution: u16) -> Self {
        let res = resolution as f64;
        TickRanges {
            onset: beats_to_ticks(profile.onset_timing_beats, res),
            offset: beats_to_ticks(profile.offset_timing_beats, res),
            min_duration: beats_to_ticks(profile.min_duration_beats, res).max(1),
        }
    }
}

/// Truncating beat-to-tick conversion
pub(crate) fn beats_to_ticks(beats: f64, resolution: f64) -> u32 {
    (beats * resolution).max(0.0) as u32
}
