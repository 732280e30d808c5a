// Piano performance presets
// Hand separation, beat accents, correlated chord dynamics and
// normally-distributed chord rolls, in rising intensity

use super::types::*;

pub const PRESETS: [&str; 3] = ["classical", "romantic", "jazz"];

/// Look up a piano_performance preset by name
///
/// Characteristics:
/// - classical: barely perceptible rolls, steady left hand
/// - romantic: wider dynamics, more rubato, more expressive right hand
/// - jazz: most frequent rolls, jazz voicing patterns
pub fn preset(name: &str) -> Option<HumanizeProfile> {
    let profile = match name {
        "classical" => piano_profile(
            name,
            "Classical piano style with barely perceptible chord rolling and hand independence",
            12,
            (0.008, 0.004),
            (0.05, 0.015),
            (0.0002, 0.0001),
            (0.7, 1.2),
            false,
        ),
        "romantic" => piano_profile(
            name,
            "Romantic piano style with subtle expressive chord rolling and rubato",
            18,
            (0.015, 0.008),
            (0.08, 0.025),
            (0.0003, 0.0002),
            (0.6, 1.4),
            false,
        ),
        "jazz" => piano_profile(
            name,
            "Jazz piano style with varied chord rolling and swing feel",
            15,
            (0.012, 0.006),
            (0.12, 0.04),
            (0.0004, 0.0003),
            (0.8, 1.3),
            true,
        ),
        _ => return None,
    };

    Some(profile)
}

#[allow(clippy::too_many_arguments)]
fn piano_profile(
    name: &str,
    description: &str,
    velocity_range: u8,
    (onset, offset): (f64, f64),
    (probability, probability_std): (f64, f64),
    (mean_beats, std_beats): (f64, f64),
    (left_timing_factor, right_velocity_factor): (f64, f64),
    jazz_chord_emphasis: bool,
) -> HumanizeProfile {
    HumanizeProfile {
        method: Method::PianoPerformance,
        preset: name.to_string(),
        description: description.to_string(),
        velocity_range,
        onset_timing_beats: onset,
        offset_timing_beats: offset,
        min_duration_beats: 1.0 / 32.0,
        chord_roll: ChordRollSettings {
            probability,
            probability_std,
            interval: RollInterval::Normal {
                mean_beats,
                std_beats,
            },
        },
        hands: HandSettings {
            enabled: true,
            split_pitch: 60,
            left_timing_factor,
            left_velocity_factor: 0.9,
            right_velocity_factor,
        },
        beat_accenting: true,
        chord_velocity_correlation: true,
        jazz_chord_emphasis,
        phrase: PhraseSettings {
            enabled: true,
            ..Default::default()
        },
        chord_tolerance_ticks: 5,
        correlation_tolerance_ticks: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classical_preset() {
        let profile = preset("classical").unwrap();

        assert_eq!(profile.method, Method::PianoPerformance);
        assert_eq!(profile.velocity_range, 12);
        assert_eq!(profile.chord_roll.probability, 0.05);
        assert_eq!(profile.hands.left_timing_factor, 0.7);
        assert_eq!(profile.hands.right_velocity_factor, 1.2);
        assert!(!profile.jazz_chord_emphasis);
        assert_eq!(
            profile.chord_roll.interval,
            RollInterval::Normal {
                mean_beats: 0.0002,
                std_beats: 0.0001
            }
        );
    }

    #[test]
    fn test_roll_probability_rises_with_intensity() {
        let classical = preset("classical").unwrap();
        let romantic = preset("romantic").unwrap();
        let jazz = preset("jazz").unwrap();

        assert!(classical.chord_roll.probability < romantic.chord_roll.probability);
        assert!(romantic.chord_roll.probability < jazz.chord_roll.probability);
    }

    #[test]
    fn test_all_presets_enable_performance_features() {
        for name in PRESETS {
            let profile = preset(name).unwrap();
            assert!(profile.hands.enabled);
            assert!(profile.beat_accenting);
            assert!(profile.chord_velocity_correlation);
            assert!(profile.chord_roll.is_enabled());
            assert!(profile.phrase.enabled);
        }
        assert!(preset("jazz").unwrap().jazz_chord_emphasis);
    }
}
