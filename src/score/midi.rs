// MIDI codec - Convert between Standard MIDI Files and the Score model
// Reads any metrical SMF into tracks of notes and writes scores back out

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track as SmfTrack, TrackEvent,
    TrackEventKind,
};
use thiserror::Error;

use super::types::{KeySignatureChange, Note, Score, TempoChange, TimeSignatureChange, Track};

/// General MIDI percussion channel (channel 10, 0-indexed 9)
pub const DRUM_CHANNEL: u8 = 9;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Failed to parse MIDI: {0}")]
    Parse(#[from] midly::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported timing: SMPTE timecode files have no beat resolution")]
    UnsupportedTiming,
}

pub type MidiResult<T> = Result<T, MidiError>;

/// Read a MIDI file from disk
pub fn read_midi_file(path: &Path) -> MidiResult<Score> {
    let bytes = std::fs::read(path)?;
    read_midi(&bytes)
}

/// Parse MIDI bytes into a Score
///
/// Each (source track, channel) pair becomes one `Track`. Note-on with
/// velocity 0 is treated as note-off, and overlapping notes of the same key
/// are paired first-in first-out.
pub fn read_midi(bytes: &[u8]) -> MidiResult<Score> {
    let smf = Smf::parse(bytes)?;

    let resolution = match smf.header.timing {
        Timing::Metrical(ppq) => ppq.as_int(),
        Timing::Timecode(..) => return Err(MidiError::UnsupportedTiming),
    };

    let mut score = Score::new(resolution);

    for smf_track in &smf.tracks {
        let parts = read_track(smf_track, &mut score);
        score.tracks.extend(parts);
    }

    score.tempos.sort_by_key(|t| t.tick);
    score.time_signatures.sort_by_key(|t| t.tick);
    score.key_signatures.sort_by_key(|k| k.tick);

    log::debug!(
        "Parsed MIDI: {} tracks, {} notes, resolution {}",
        score.tracks.len(),
        score.note_count(),
        score.resolution
    );

    Ok(score)
}

/// Split one SMF track into per-channel parts, collecting meta events into the score
fn read_track(smf_track: &[TrackEvent], score: &mut Score) -> Vec<Track> {
    let mut name = String::new();
    let mut programs: HashMap<u8, u8> = HashMap::new();
    let mut parts: BTreeMap<u8, Vec<Note>> = BTreeMap::new();
    let mut open: HashMap<(u8, u8), VecDeque<(u32, u8)>> = HashMap::new();
    let mut tick: u32 = 0;

    for event in smf_track {
        tick = tick.saturating_add(event.delta.as_int());

        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        open.entry((channel, key.as_int()))
                            .or_default()
                            .push_back((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let pitch = key.as_int();
                        if let Some((onset, velocity)) = open
                            .get_mut(&(channel, pitch))
                            .and_then(|queue| queue.pop_front())
                        {
                            parts.entry(channel).or_default().push(Note {
                                pitch,
                                onset,
                                offset: tick,
                                velocity,
                            });
                        }
                    }
                    MidiMessage::ProgramChange { program } => {
                        programs.insert(channel, program.as_int());
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(meta) => match meta {
                MetaMessage::TrackName(raw) => {
                    name = String::from_utf8_lossy(raw).trim().to_string();
                }
                MetaMessage::Tempo(us) => score.tempos.push(TempoChange {
                    tick,
                    us_per_quarter: us.as_int(),
                }),
                MetaMessage::TimeSignature(numerator, denominator_pow2, _, _) => {
                    score.time_signatures.push(TimeSignatureChange {
                        tick,
                        numerator,
                        denominator_pow2,
                    })
                }
                MetaMessage::KeySignature(accidentals, minor) => {
                    score.key_signatures.push(KeySignatureChange {
                        tick,
                        accidentals,
                        minor,
                    })
                }
                _ => {}
            },
            _ => {}
        }
    }

    // Close notes still sounding at the end of the track
    for ((channel, pitch), queue) in open {
        for (onset, velocity) in queue {
            log::debug!("Closing unterminated note {} at tick {}", pitch, tick);
            parts.entry(channel).or_default().push(Note {
                pitch,
                onset,
                offset: tick,
                velocity,
            });
        }
    }

    parts
        .into_iter()
        .map(|(channel, mut notes)| {
            notes.sort_by_key(|n| (n.onset, n.pitch));
            Track {
                name: name.clone(),
                program: programs.get(&channel).copied().unwrap_or(0),
                channel,
                is_drum: channel == DRUM_CHANNEL,
                notes,
            }
        })
        .collect()
}

/// Write a Score to a MIDI file on disk
pub fn write_midi_file(score: &Score, path: &Path) -> MidiResult<()> {
    let bytes = write_midi(score)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a Score as SMF format 1 bytes
///
/// Track 0 carries tempo, time and key signatures; every score track
/// follows with its name, program change and notes.
pub fn write_midi(score: &Score) -> MidiResult<Vec<u8>> {
    let header = Header::new(
        Format::Parallel,
        Timing::Metrical(score.resolution.max(1).into()),
    );

    let mut tracks = Vec::with_capacity(score.tracks.len() + 1);
    tracks.push(create_meta_track(score));

    for track in &score.tracks {
        tracks.push(create_note_track(track));
    }

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;

    Ok(bytes)
}

/// Build the conductor track from the score's meta events
fn create_meta_track(score: &Score) -> SmfTrack<'static> {
    let mut events: Vec<(u32, TrackEventKind<'static>)> = Vec::new();

    for tempo in &score.tempos {
        events.push((
            tempo.tick,
            TrackEventKind::Meta(MetaMessage::Tempo(tempo.us_per_quarter.into())),
        ));
    }

    for ts in &score.time_signatures {
        // 24 MIDI clocks per click, 8 thirty-seconds per quarter
        events.push((
            ts.tick,
            TrackEventKind::Meta(MetaMessage::TimeSignature(
                ts.numerator,
                ts.denominator_pow2,
                24,
                8,
            )),
        ));
    }

    for key in &score.key_signatures {
        events.push((
            key.tick,
            TrackEventKind::Meta(MetaMessage::KeySignature(key.accidentals, key.minor)),
        ));
    }

    events.sort_by_key(|(tick, _)| *tick);
    to_delta_track(events, 0)
}

/// Build a track of note events for one score track
fn create_note_track(track: &Track) -> SmfTrack<'_> {
    let channel = track.channel.min(15);

    // (tick, order, kind); order puts note-offs before note-ons at the same tick
    let mut events: Vec<(u32, u8, TrackEventKind<'_>)> = Vec::new();

    if !track.name.is_empty() {
        events.push((
            0,
            0,
            TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
        ));
    }

    if !track.is_drum {
        events.push((
            0,
            0,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::ProgramChange {
                    program: track.program.min(127).into(),
                },
            },
        ));
    }

    for note in &track.notes {
        events.push((
            note.onset,
            2,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: note.pitch.min(127).into(),
                    vel: note.velocity.clamp(1, 127).into(),
                },
            },
        ));
        events.push((
            note.offset,
            1,
            TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOff {
                    key: note.pitch.min(127).into(),
                    vel: 0.into(),
                },
            },
        ));
    }

    events.sort_by_key(|(tick, order, _)| (*tick, *order));

    let events = events
        .into_iter()
        .map(|(tick, _, kind)| (tick, kind))
        .collect();

    to_delta_track(events, track.end_tick())
}

/// Convert absolute-tick events into a delta-timed track ending at `end_tick` or later
fn to_delta_track<'a>(events: Vec<(u32, TrackEventKind<'a>)>, end_tick: u32) -> SmfTrack<'a> {
    let mut track = SmfTrack::new();
    let mut last_tick = 0;

    for (tick, kind) in events {
        let delta = tick.saturating_sub(last_tick);
        track.push(TrackEvent {
            delta: delta.into(),
            kind,
        });
        last_tick = last_tick.max(tick);
    }

    track.push(TrackEvent {
        delta: end_tick.saturating_sub(last_tick).into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_score() -> Score {
        let mut score = Score::new(480);
        score.tempos.push(TempoChange {
            tick: 0,
            us_per_quarter: 500_000,
        });
        score.time_signatures.push(TimeSignatureChange {
            tick: 0,
            numerator: 3,
            denominator_pow2: 2,
        });

        let mut piano = Track::with_notes(
            "Piano",
            vec![
                Note::new(60, 0, 480, 90).unwrap(),
                Note::new(64, 0, 480, 80).unwrap(),
                Note::new(67, 480, 960, 70).unwrap(),
            ],
        );
        piano.program = 0;
        score.tracks.push(piano);

        let mut drums = Track::with_notes("Drums", vec![Note::new(36, 0, 120, 110).unwrap()]);
        drums.channel = DRUM_CHANNEL;
        drums.is_drum = true;
        score.tracks.push(drums);

        score
    }

    #[test]
    fn test_write_produces_valid_smf() {
        let bytes = write_midi(&test_score()).unwrap();
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.format, Format::Parallel);
        // Meta track + piano + drums
        assert_eq!(smf.tracks.len(), 3);
    }

    #[test]
    fn test_read_back_notes_and_meta() {
        let score = test_score();
        let bytes = write_midi(&score).unwrap();
        let parsed = read_midi(&bytes).unwrap();

        assert_eq!(parsed.resolution, 480);
        assert_eq!(parsed.tempos.len(), 1);
        assert_eq!(parsed.tempos[0].us_per_quarter, 500_000);
        assert_eq!(parsed.measure_ticks(), 1440);

        assert_eq!(parsed.tracks.len(), 2);
        assert_eq!(parsed.tracks[0].name, "Piano");
        assert_eq!(parsed.tracks[0].notes, score.tracks[0].notes);
        assert!(parsed.tracks[1].is_drum);
        assert_eq!(parsed.tracks[1].notes[0].pitch, 36);
    }

    #[test]
    fn test_repeated_note_offs_ordered_before_ons() {
        // Same pitch back to back: off at 480 must precede the next on at 480
        let mut score = Score::new(480);
        score.tracks.push(Track::with_notes(
            "Lead",
            vec![
                Note::new(72, 0, 480, 100).unwrap(),
                Note::new(72, 480, 960, 100).unwrap(),
            ],
        ));

        let parsed = read_midi(&write_midi(&score).unwrap()).unwrap();
        assert_eq!(parsed.tracks[0].notes, score.tracks[0].notes);
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let mut track = SmfTrack::new();
        track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: 60.into(),
                    vel: 100.into(),
                },
            },
        });
        track.push(TrackEvent {
            delta: 240.into(),
            kind: TrackEventKind::Midi {
                channel: 0.into(),
                message: MidiMessage::NoteOn {
                    key: 60.into(),
                    vel: 0.into(),
                },
            },
        });
        track.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header: Header::new(Format::SingleTrack, Timing::Metrical(96.into())),
            tracks: vec![track],
        };
        let mut bytes = Vec::new();
        smf.write_std(&mut bytes).unwrap();

        let score = read_midi(&bytes).unwrap();
        assert_eq!(score.resolution, 96);
        assert_eq!(score.tracks[0].notes, vec![Note::new(60, 0, 240, 100).unwrap()]);
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("score.mid");

        let score = test_score();
        write_midi_file(&score, &path).unwrap();
        let parsed = read_midi_file(&path).unwrap();

        assert_eq!(parsed.note_count(), score.note_count());
    }

    #[test]
    fn test_garbage_input_is_parse_error() {
        let result = read_midi(b"not a midi file");
        assert!(matches!(result, Err(MidiError::Parse(_))));
    }
}
