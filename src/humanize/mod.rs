// Humanization Engine - Chord rolling, timing, dynamics and phrasing
// Each stage mutates a track's notes in place and draws from a caller-supplied RNG

pub mod chords;
pub mod dynamics;
pub mod hands;
pub mod overlap;
pub mod phrase;
pub mod roll;
pub mod timing;

pub use chords::{cluster_onsets, detect_chords, MIN_CHORD_SIZE};
pub use dynamics::{apply_dynamics, beat_strength, DynamicsSettings};
pub use hands::{humanize_hands, perform, split_hands, Hand, HandStats, PerformanceRanges};
pub use overlap::resolve_overlaps;
pub use phrase::{apply_ritardando, detect_phrase_endings};
pub use roll::{choose_pattern, roll_chord, roll_chords, RollPattern, RolledChord};
pub use timing::{jitter_timing, TimingRanges};
