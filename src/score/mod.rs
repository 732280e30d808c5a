// Score - Note/track object model and MIDI file codec
// Everything the humanizer reads and writes lives here

pub mod midi;
pub mod types;

pub use midi::{read_midi, read_midi_file, write_midi, write_midi_file, MidiError, MidiResult};
pub use types::{
    KeySignatureChange, Note, Score, ScoreError, ScoreResult, TempoChange, TimeSignatureChange,
    Track, MIDI_MAX,
};
