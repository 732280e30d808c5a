// Humanizer - Expressive performance for quantized MIDI
// Module declarations

pub mod humanize;
pub mod pipeline;
pub mod profiles;
pub mod score;

pub use pipeline::{humanize, HumanizeError, HumanizeReport, Humanizer, TrackOutcome, TrackReport};
pub use profiles::{resolve, HumanizeProfile, Method, ProfileError, ProfileOverrides};
pub use score::{read_midi_file, write_midi_file, MidiError, Note, Score, Track};
