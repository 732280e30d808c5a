// Hand Separation - Split a track by pitch and humanize each hand on its own
// Left hand plays steadier, right hand more expressively

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::dynamics::{apply_dynamics, DynamicsSettings};
use super::timing::{jitter_timing, TimingRanges};
use crate::profiles::types::beats_to_ticks;
use crate::profiles::{HandSettings, HumanizeProfile, TickRanges};
use crate::score::Note;

/// Which hand a partition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

/// Timing and velocity bounds for one partition of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceRanges {
    pub timing: TimingRanges,
    pub velocity: u32,
}

impl PerformanceRanges {
    /// Unscaled ranges, used when the track is one partition
    pub fn whole_track(profile: &HumanizeProfile, ticks: &TickRanges) -> Self {
        PerformanceRanges {
            timing: TimingRanges {
                onset: ticks.onset,
                offset: ticks.offset,
                min_duration: ticks.min_duration,
            },
            velocity: profile.velocity_range as u32,
        }
    }

    /// Hand-scaled ranges
    ///
    /// Left: onset jitter scaled by the left timing factor, velocity by the
    /// left velocity factor. Right: onset jitter unscaled, velocity scaled by
    /// the right velocity factor. Note-off jitter and minimum duration are
    /// shared by both hands.
    pub fn for_hand(
        hand: Hand,
        profile: &HumanizeProfile,
        ticks: &TickRanges,
        resolution: u16,
    ) -> Self {
        let hands = &profile.hands;
        let (timing_factor, velocity_factor) = match hand {
            Hand::Left => (hands.left_timing_factor, hands.left_velocity_factor),
            Hand::Right => (1.0, hands.right_velocity_factor),
        };

        PerformanceRanges {
            timing: TimingRanges {
                onset: beats_to_ticks(
                    profile.onset_timing_beats * timing_factor,
                    resolution as f64,
                ),
                offset: ticks.offset,
                min_duration: ticks.min_duration,
            },
            velocity: (profile.velocity_range as f64 * velocity_factor).max(0.0) as u32,
        }
    }
}

/// Run timing then dynamics over one partition
///
/// Returns the number of correlated velocity groups.
pub fn perform<R: Rng + ?Sized>(
    notes: &mut [&mut Note],
    ranges: &PerformanceRanges,
    dynamics: &DynamicsSettings,
    rng: &mut R,
) -> usize {
    jitter_timing(notes.iter_mut().map(|n| &mut **n), ranges.timing, rng);
    apply_dynamics(notes, ranges.velocity, dynamics, rng)
}

/// Result of a hand-separated pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandStats {
    pub left_notes: usize,
    pub right_notes: usize,
    pub left_correlated_groups: usize,
    pub right_correlated_groups: usize,
}

/// Split notes at the hand split pitch, keeping arrival order within each hand
pub fn split_hands<'a>(
    notes: &'a mut [Note],
    hands: &HandSettings,
) -> (Vec<&'a mut Note>, Vec<&'a mut Note>) {
    notes
        .iter_mut()
        .partition(|note| note.pitch < hands.split_pitch)
}

/// Humanize the left and right hands with their own ranges
pub fn humanize_hands<R: Rng + ?Sized>(
    notes: &mut [Note],
    profile: &HumanizeProfile,
    ticks: &TickRanges,
    dynamics: &DynamicsSettings,
    rng: &mut R,
) -> HandStats {
    let (mut left, mut right) = split_hands(notes, &profile.hands);

    let left_ranges = PerformanceRanges::for_hand(Hand::Left, profile, ticks, dynamics.resolution);
    let right_ranges =
        PerformanceRanges::for_hand(Hand::Right, profile, ticks, dynamics.resolution);

    let stats = HandStats {
        left_notes: left.len(),
        right_notes: right.len(),
        left_correlated_groups: perform(&mut left, &left_ranges, dynamics, rng),
        right_correlated_groups: perform(&mut right, &right_ranges, dynamics, rng),
    };

    log::info!(
        "  Left hand: {} notes, Right hand: {} notes",
        stats.left_notes,
        stats.right_notes
    );

    stats
}
