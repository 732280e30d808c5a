// Basic presets
// Plain velocity/timing randomization at three intensities; chords are never rolled

use super::types::*;

pub const PRESETS: [&str; 3] = ["minimal", "medium", "aggressive"];

/// Look up a basic preset by name
pub fn preset(name: &str) -> Option<HumanizeProfile> {
    // (velocity, note-on beats, note-off beats, unused roll spacing, description)
    let (velocity_range, onset, offset, roll_beats, description) = match name {
        "minimal" => (
            5,
            0.005,
            0.002,
            0.002,
            "Very subtle humanization - barely noticeable variations",
        ),
        "medium" => (
            10,
            0.01,
            0.005,
            0.004,
            "Moderate humanization - natural musical variations",
        ),
        "aggressive" => (
            20,
            0.02,
            0.01,
            0.006,
            "Strong humanization - pronounced expressive variations",
        ),
        _ => return None,
    };

    Some(HumanizeProfile {
        method: Method::Basic,
        preset: name.to_string(),
        description: description.to_string(),
        velocity_range,
        onset_timing_beats: onset,
        offset_timing_beats: offset,
        min_duration_beats: 1.0 / 32.0,
        chord_roll: ChordRollSettings::disabled(roll_beats),
        hands: HandSettings::default(),
        beat_accenting: false,
        chord_velocity_correlation: false,
        jazz_chord_emphasis: false,
        phrase: PhraseSettings::default(),
        chord_tolerance_ticks: 5,
        correlation_tolerance_ticks: 10,
    })
}
