// Chord Rolling - Spread a chord's onsets across time like a performer would
// Pattern orderings, per-chord roll decisions and sampled roll spacing

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};

use crate::profiles::{ChordRollSettings, RollInterval};
use crate::score::Note;

/// Smallest sampled spacing between rolled notes, in ticks
pub const MIN_ROLL_INTERVAL_TICKS: f64 = 0.2;

/// Sampled spacing is capped at this multiple of the mean
pub const MAX_ROLL_INTERVAL_FACTOR: f64 = 6.0;

/// Sampled roll probability is capped at this multiple of the base
pub const MAX_ROLL_PROBABILITY_FACTOR: f64 = 3.0;

/// Chords wider than this (semitones) favor upward rolls
pub const WIDE_CHORD_SPAN: u8 = 24;

/// Order in which a chord's notes are sounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollPattern {
    /// Lowest to highest
    Upward,

    /// Highest to lowest
    Downward,

    /// Middle note first, then alternating above and below
    InsideOut,

    /// Outer notes first (lowest, highest, ...), working inward
    OutsideIn,
}

impl RollPattern {
    pub const ALL: [RollPattern; 4] = [
        RollPattern::Upward,
        RollPattern::Downward,
        RollPattern::InsideOut,
        RollPattern::OutsideIn,
    ];

    /// Patterns used with jazz chord emphasis
    pub const JAZZ: [RollPattern; 3] = [
        RollPattern::Upward,
        RollPattern::Downward,
        RollPattern::InsideOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RollPattern::Upward => "upward",
            RollPattern::Downward => "downward",
            RollPattern::InsideOut => "inside_out",
            RollPattern::OutsideIn => "outside_in",
        }
    }

    /// Sounding order as positions into the pitch-ascending chord
    pub fn order(&self, len: usize) -> Vec<usize> {
        match self {
            RollPattern::Upward => (0..len).collect(),
            RollPattern::Downward => (0..len).rev().collect(),
            RollPattern::InsideOut => {
                let mut order = Vec::with_capacity(len);
                if len == 0 {
                    return order;
                }
                let mid = len / 2;
                order.push(mid);
                for step in 1..=len {
                    if mid + step < len {
                        order.push(mid + step);
                    }
                    if step <= mid {
                        order.push(mid - step);
                    }
                }
                order
            }
            RollPattern::OutsideIn => {
                let mut order = Vec::with_capacity(len);
                let (mut left, mut right) = (0, len);
                let mut take_left = true;
                while left < right {
                    if take_left {
                        order.push(left);
                        left += 1;
                    } else {
                        right -= 1;
                        order.push(right);
                    }
                    take_left = !take_left;
                }
                order
            }
        }
    }
}

/// Pick a roll pattern for a chord
///
/// Jazz emphasis picks uniformly from upward/downward/inside-out. Otherwise
/// chords spanning more than two octaves roll upward 70% of the time and
/// downward otherwise; narrower chords use any pattern.
pub fn choose_pattern<R: Rng + ?Sized>(
    notes: &[Note],
    chord: &[usize],
    jazz_chord_emphasis: bool,
    rng: &mut R,
) -> RollPattern {
    if jazz_chord_emphasis {
        return RollPattern::JAZZ[rng.random_range(0..RollPattern::JAZZ.len())];
    }

    let pitches = chord.iter().map(|&i| notes[i].pitch);
    let span = match (pitches.clone().max(), pitches.min()) {
        (Some(high), Some(low)) => high - low,
        _ => 0,
    };

    if span > WIDE_CHORD_SPAN {
        return if rng.random::<f64>() < 0.7 {
            RollPattern::Upward
        } else {
            RollPattern::Downward
        };
    }

    RollPattern::ALL[rng.random_range(0..RollPattern::ALL.len())]
}

/// Rewrite a chord's onsets in the given pattern
///
/// The earliest onset in the chord anchors the roll; the note at position
/// `i` of the pattern starts `i * interval_ticks` (truncated) later.
pub fn roll_chord(notes: &mut [Note], chord: &[usize], pattern: RollPattern, interval_ticks: f64) {
    let Some(base_onset) = chord.iter().map(|&i| notes[i].onset).min() else {
        return;
    };

    let mut by_pitch = chord.to_vec();
    by_pitch.sort_by_key(|&i| notes[i].pitch);

    for (position, &slot) in pattern.order(by_pitch.len()).iter().enumerate() {
        let delay = (position as f64 * interval_ticks).max(0.0) as u32;
        notes[by_pitch[slot]].onset = base_onset.saturating_add(delay);
    }
}

/// Normal distribution with a finite, non-negative standard deviation
fn normal(mean: f64, std: f64) -> Result<Normal<f64>, NormalError> {
    if std.is_nan() || std < 0.0 {
        return Err(NormalError::BadVariance);
    }
    Normal::new(mean, std)
}

/// Draw a chord's roll spacing from N(mean, std), clamped to [0.2, 6 * mean] ticks
pub fn sample_interval<R: Rng + ?Sized>(
    mean_ticks: f64,
    std_ticks: f64,
    rng: &mut R,
) -> Result<f64, NormalError> {
    let drawn = normal(mean_ticks, std_ticks)?.sample(rng);
    Ok(drawn
        .min(mean_ticks * MAX_ROLL_INTERVAL_FACTOR)
        .max(MIN_ROLL_INTERVAL_TICKS))
}

/// Roll spacing in ticks for one chord
pub fn interval_ticks<R: Rng + ?Sized>(
    interval: &RollInterval,
    resolution: u16,
    rng: &mut R,
) -> Result<f64, NormalError> {
    let res = resolution as f64;
    match *interval {
        RollInterval::Fixed { beats } => Ok(beats * res),
        RollInterval::Normal {
            mean_beats,
            std_beats,
        } => sample_interval(mean_beats * res, std_beats * res, rng),
    }
}

/// Per-chord roll probability, drawn around the base and clamped to [0, 3 * base]
pub fn roll_probability<R: Rng + ?Sized>(
    base: f64,
    std: f64,
    rng: &mut R,
) -> Result<f64, NormalError> {
    if std == 0.0 {
        return Ok(base);
    }
    let drawn = normal(base, std)?.sample(rng);
    Ok(drawn.min(base * MAX_ROLL_PROBABILITY_FACTOR).max(0.0))
}

/// A chord that was rolled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledChord {
    pub size: usize,
    pub pattern: RollPattern,
    pub interval_ticks: f64,
    pub probability: f64,
}

/// Probabilistically roll every detected chord
///
/// For each chord: choose a pattern, draw a roll probability, and roll only
/// if a uniform draw falls below it. Disabled settings never roll.
pub fn roll_chords<R: Rng + ?Sized>(
    notes: &mut [Note],
    chords: &[Vec<usize>],
    settings: &ChordRollSettings,
    jazz_chord_emphasis: bool,
    resolution: u16,
    rng: &mut R,
) -> Result<Vec<RolledChord>, NormalError> {
    let mut rolled = Vec::new();

    if !settings.is_enabled() {
        return Ok(rolled);
    }

    for chord in chords {
        let pattern = choose_pattern(notes, chord, jazz_chord_emphasis, rng);
        let probability = roll_probability(settings.probability, settings.probability_std, rng)?;

        if rng.random::<f64>() >= probability {
            continue;
        }

        let interval = interval_ticks(&settings.interval, resolution, rng)?;
        roll_chord(notes, chord, pattern, interval);

        log::debug!(
            "Applied {} roll to {}-note chord (interval {:.3} ticks, prob {:.1}%)",
            pattern.as_str(),
            chord.len(),
            interval,
            probability * 100.0
        );

        rolled.push(RolledChord {
            size: chord.len(),
            pattern,
            interval_ticks: interval,
            probability,
        });
    }

    Ok(rolled)
}
