// Phrase Shaping - Ritardando around phrase endings
// Long notes are taken as phrase endings; notes near them are held back slightly

use rand::Rng;

use crate::profiles::PhraseSettings;
use crate::score::Note;

/// Delay range per phrase ending (ticks, inclusive)
pub const RITARDANDO_DELAY: (u32, u32) = (5, 25);

/// Notes within this many beats of a phrase ending are delayed
pub const RITARDANDO_WINDOW_BEATS: u32 = 2;

/// Indices of notes at least `threshold_ticks` long
pub fn detect_phrase_endings(notes: &[Note], threshold_ticks: u32) -> Vec<usize> {
    notes
        .iter()
        .enumerate()
        .filter(|(_, note)| note.duration() >= threshold_ticks)
        .map(|(idx, _)| idx)
        .collect()
}

/// Delay every note that starts within two beats of a phrase ending
///
/// Each phrase ending delays all notes (itself included) whose onset is
/// strictly closer than two beats to the ending's *current* onset by a
/// fresh uniform draw in [5, 25] ticks. Delays from nearby endings stack;
/// `max_delay_ticks` caps the total a single note can accumulate. Notes
/// pushed below `min_duration` are extended to it.
///
/// Returns the number of delays applied.
pub fn apply_ritardando<R: Rng + ?Sized>(
    notes: &mut [Note],
    endings: &[usize],
    settings: &PhraseSettings,
    resolution: u16,
    min_duration: u32,
    rng: &mut R,
) -> usize {
    let window = resolution as u32 * RITARDANDO_WINDOW_BEATS;
    let mut accumulated = vec![0u32; notes.len()];
    let mut applied = 0;

    for &ending in endings {
        for idx in 0..notes.len() {
            let anchor = notes[ending].onset;
            if notes[idx].onset.abs_diff(anchor) >= window {
                continue;
            }

            let mut delay = rng.random_range(RITARDANDO_DELAY.0..=RITARDANDO_DELAY.1);
            if let Some(cap) = settings.max_delay_ticks {
                delay = delay.min(cap.saturating_sub(accumulated[idx]));
            }
            if delay == 0 {
                continue;
            }

            notes[idx].onset = notes[idx].onset.saturating_add(delay);
            accumulated[idx] += delay;
            applied += 1;
        }
    }

    for note in notes.iter_mut() {
        if note.duration() < min_duration {
            note.offset = note.onset.saturating_add(min_duration);
        }
    }

    applied
}
