// Overlap Resolution - Keep each pitch lane monophonic
// Shortens a note that runs into the next note of the same pitch

use std::collections::BTreeMap;

use crate::score::Note;

/// Shorten notes that overlap the next note of the same pitch
///
/// Notes are grouped by pitch and sorted by onset (stable, so simultaneous
/// notes keep arrival order). One forward pass over adjacent pairs: if the
/// earlier note ends after the later one starts, its offset becomes
/// `max(onset + min_duration, next.onset - 1)`.
///
/// A single pass only corrects immediate neighbours. When `min_duration`
/// wins the `max`, or three or more notes pile up on one pitch, some overlap
/// can remain.
///
/// Returns the number of notes shortened.
pub fn resolve_overlaps(notes: &mut [Note], min_duration: u32) -> usize {
    let mut lanes: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (idx, note) in notes.iter().enumerate() {
        lanes.entry(note.pitch).or_default().push(idx);
    }

    let mut resolved = 0;

    for lane in lanes.values_mut() {
        lane.sort_by_key(|&idx| notes[idx].onset);

        for pair in lane.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let next_onset = notes[next].onset;

            if notes[current].offset > next_onset {
                let shortest = notes[current].onset.saturating_add(min_duration);
                notes[current].offset = shortest.max(next_onset.saturating_sub(1));
                resolved += 1;
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, onset: u32, offset: u32) -> Note {
        Note::new(pitch, onset, offset, 80).unwrap()
    }

    #[test]
    fn test_shortens_earlier_note() {
        let mut notes = vec![note(60, 0, 100), note(60, 50, 150)];

        let resolved = resolve_overlaps(&mut notes, 10);

        assert_eq!(resolved, 1);
        assert_eq!(notes[0].offset, 49);
        assert_eq!(notes[1], note(60, 50, 150));
    }

    #[test]
    fn test_different_pitches_untouched() {
        let mut notes = vec![note(60, 0, 100), note(64, 50, 150)];
        let before = notes.clone();

        assert_eq!(resolve_overlaps(&mut notes, 10), 0);
        assert_eq!(notes, before);
    }

    #[test]
    fn test_unsorted_lane() {
        let mut notes = vec![note(67, 480, 960), note(67, 0, 600)];

        resolve_overlaps(&mut notes, 10);

        assert_eq!(notes[1].offset, 479);
        assert_eq!(notes[0].offset, 960);
    }

    #[test]
    fn test_min_duration_wins() {
        // Next note starts 5 ticks later; the earlier note keeps 10 ticks
        let mut notes = vec![note(72, 100, 300), note(72, 105, 300)];

        resolve_overlaps(&mut notes, 10);

        assert_eq!(notes[0].offset, 110);
    }

    #[test]
    fn test_touching_notes_are_not_overlaps() {
        let mut notes = vec![note(60, 0, 480), note(60, 480, 960)];
        assert_eq!(resolve_overlaps(&mut notes, 10), 0);
    }

    #[test]
    fn test_adjacent_pairs_resolved() {
        let mut notes = vec![
            note(60, 0, 500),
            note(60, 200, 700),
            note(60, 400, 900),
            note(62, 0, 2000),
            note(62, 1000, 1100),
        ];

        resolve_overlaps(&mut notes, 10);

        let mut lane_60: Vec<Note> = notes.iter().filter(|n| n.pitch == 60).copied().collect();
        lane_60.sort_by_key(|n| n.onset);
        for pair in lane_60.windows(2) {
            assert!(pair[0].offset <= pair[1].onset);
        }
        assert_eq!(notes[3].offset, 999);
    }
}
