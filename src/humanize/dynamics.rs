// Dynamics - Beat-aware, chord-correlated velocity perturbation
// Simultaneous notes can share one velocity offset so chords move together

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chords::cluster_onsets;
use super::timing::symmetric;
use crate::score::{Note, MIDI_MAX};

/// Per-note spread around a correlated group's shared offset
pub const CHORD_INTERNAL_VARIATION: u32 = 4;

/// Fraction of a beat after the beat line that still counts as "on the beat"
pub const ON_BEAT_WINDOW: f64 = 0.1;

/// Dynamics behavior shared by every partition of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicsSettings {
    /// Scale jitter by metrical position
    pub beat_accenting: bool,

    /// Give simultaneous notes a shared offset
    pub chord_velocity_correlation: bool,

    /// Onset window for correlation groups
    pub tolerance_ticks: u32,

    /// Ticks per beat
    pub resolution: u16,

    /// Measure length for downbeat detection
    pub measure_ticks: u32,
}

/// Velocity multiplier for a note's metrical position
///
/// Beats are quarter notes counted from the start of the measure. Within
/// the first 10% of a beat: downbeat 1.15, third beat 1.08, other beats
/// 0.95. Anywhere else in the beat counts as off-beat: 0.88.
pub fn beat_strength(onset: u32, resolution: u16, measure_ticks: u32) -> f64 {
    let beat_ticks = resolution.max(1) as u32;
    let in_measure = onset % measure_ticks.max(1);
    let position = (in_measure % beat_ticks) as f64 / beat_ticks as f64;
    let beat_number = in_measure / beat_ticks;

    if position < ON_BEAT_WINDOW {
        match beat_number {
            0 => 1.15,
            2 => 1.08,
            _ => 0.95,
        }
    } else {
        0.88
    }
}

/// Apply velocity jitter to a set of notes
///
/// Notes are grouped by onset (pairs and singletons included). With
/// correlation enabled, a multi-note group draws one base offset in
/// [-range, range] (scaled by the first member's beat strength when
/// accenting) and each member adds its own [-4, 4]. Otherwise every note
/// draws its own offset, scaled by its own beat strength when accenting.
///
/// Returns the number of correlated groups.
pub fn apply_dynamics<R: Rng + ?Sized>(
    notes: &mut [&mut Note],
    velocity_range: u32,
    settings: &DynamicsSettings,
    rng: &mut R,
) -> usize {
    let groups = cluster_onsets(notes.iter().map(|n| n.onset), settings.tolerance_ticks);
    let mut correlated = 0;

    for group in groups {
        if settings.chord_velocity_correlation && group.len() > 1 {
            let mut base = symmetric(velocity_range, rng);
            if settings.beat_accenting {
                base = accent(base, notes[group[0]].onset, settings);
            }

            for &idx in &group {
                let offset = base + symmetric(CHORD_INTERNAL_VARIATION, rng);
                shift_velocity(&mut *notes[idx], offset);
            }
            correlated += 1;
        } else {
            for &idx in &group {
                let mut offset = symmetric(velocity_range, rng);
                if settings.beat_accenting {
                    offset = accent(offset, notes[idx].onset, settings);
                }
                shift_velocity(&mut *notes[idx], offset);
            }
        }
    }

    correlated
}

/// Scale an offset by beat strength, truncating toward zero
fn accent(offset: i64, onset: u32, settings: &DynamicsSettings) -> i64 {
    let strength = beat_strength(onset, settings.resolution, settings.measure_ticks);
    (offset as f64 * strength) as i64
}

fn shift_velocity(note: &mut Note, offset: i64) {
    note.velocity = (note.velocity as i64 + offset).clamp(1, MIDI_MAX as i64) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(beat_accenting: bool, correlation: bool) -> DynamicsSettings {
        DynamicsSettings {
            beat_accenting,
            chord_velocity_correlation: correlation,
            tolerance_ticks: 10,
            resolution: 480,
            measure_ticks: 1920,
        }
    }

    #[test]
    fn test_beat_strength_grid() {
        assert_eq!(beat_strength(0, 480, 1920), 1.15);
        assert_eq!(beat_strength(480, 480, 1920), 0.95);
        assert_eq!(beat_strength(960, 480, 1920), 1.08);
        assert_eq!(beat_strength(1440, 480, 1920), 0.95);
        assert_eq!(beat_strength(1920, 480, 1920), 1.15);

        // 40 ticks = 8% of a beat, still on the beat
        assert_eq!(beat_strength(40, 480, 1920), 1.15);
        // Halfway through the beat
        assert_eq!(beat_strength(240, 480, 1920), 0.88);
        // Just before the next beat is off-beat
        assert_eq!(beat_strength(470, 480, 1920), 0.88);
    }

    #[test]
    fn test_beat_strength_follows_meter() {
        // 3/4: tick 1440 opens bar 2
        assert_eq!(beat_strength(1440, 480, 1440), 1.15);
        assert_eq!(beat_strength(960, 480, 1440), 1.08);

        // 6/8: bar 2 starts at 1440, the dotted-quarter pulse in between is off the grid
        assert_eq!(beat_strength(1440, 480, 1440), 1.15);
        assert_eq!(beat_strength(720, 480, 1440), 0.88);

        // 2/2: the second half note is the third quarter, not a downbeat
        assert_eq!(beat_strength(960, 480, 1920), 1.08);
        assert_eq!(beat_strength(1920, 480, 1920), 1.15);

        // 7/8: bar 2 starts at 1680, mid-beat on the quarter grid
        assert_eq!(beat_strength(1680, 480, 1680), 1.15);
        assert_eq!(beat_strength(1440, 480, 1680), 0.95);
    }

    #[test]
    fn test_velocity_always_in_midi_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut notes: Vec<Note> = (0..300)
            .map(|i| Note::new(60, i * 37, i * 37 + 100, if i % 2 == 0 { 1 } else { 127 }).unwrap())
            .collect();
        let mut refs: Vec<&mut Note> = notes.iter_mut().collect();

        apply_dynamics(&mut refs, 64, &settings(true, true), &mut rng);

        assert!(notes.iter().all(|n| (1..=127).contains(&n.velocity)));
    }

    #[test]
    fn test_correlated_chord_moves_together() {
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..50 {
            let mut notes: Vec<Note> = [60, 64, 67, 72]
                .iter()
                .map(|&p| Note::new(p, 480, 960, 64).unwrap())
                .collect();
            let mut refs: Vec<&mut Note> = notes.iter_mut().collect();

            let groups = apply_dynamics(&mut refs, 20, &settings(false, true), &mut rng);
            assert_eq!(groups, 1);

            // Shared base offset: members differ by at most 2 * 4
            let min = notes.iter().map(|n| n.velocity).min().unwrap();
            let max = notes.iter().map(|n| n.velocity).max().unwrap();
            assert!(max - min <= 2 * CHORD_INTERNAL_VARIATION as u8);
        }
    }

    #[test]
    fn test_singletons_are_independent() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut notes: Vec<Note> = (0..10)
            .map(|i| Note::new(60, i * 480, i * 480 + 240, 64).unwrap())
            .collect();
        let mut refs: Vec<&mut Note> = notes.iter_mut().collect();

        let groups = apply_dynamics(&mut refs, 10, &settings(false, true), &mut rng);

        assert_eq!(groups, 0);
        assert!(notes.iter().all(|n| n.velocity.abs_diff(64) <= 10));
    }

    #[test]
    fn test_zero_range_without_correlation_is_identity() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut notes: Vec<Note> = (0..20)
            .map(|i| Note::new(60 + i as u8, 0, 480, 90).unwrap())
            .collect();
        let mut refs: Vec<&mut Note> = notes.iter_mut().collect();

        apply_dynamics(&mut refs, 0, &settings(true, false), &mut rng);

        assert!(notes.iter().all(|n| n.velocity == 90));
    }

    #[test]
    fn test_off_beat_accent_shrinks_offsets() {
        // Off-beat scale 0.88 keeps |offset| <= int(20 * 0.88) = 17
        let mut rng = StdRng::seed_from_u64(4);
        let mut notes: Vec<Note> = (0..200)
            .map(|i| Note::new(60, i * 480 + 240, i * 480 + 400, 64).unwrap())
            .collect();
        let mut refs: Vec<&mut Note> = notes.iter_mut().collect();

        apply_dynamics(&mut refs, 20, &settings(true, false), &mut rng);

        assert!(notes.iter().all(|n| n.velocity.abs_diff(64) <= 17));
    }
}
