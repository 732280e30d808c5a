// Chord Detection - Onset clustering of simultaneous notes
// Greedy first-match grouping shared by chord rolling and velocity correlation

use crate::score::Note;

/// Smallest group that counts as a chord
pub const MIN_CHORD_SIZE: usize = 3;

/// Group onsets that fall within `tolerance` ticks of a group's first onset
///
/// One pass in input order. Each onset joins the *first* existing group
/// whose key (the onset that opened it) is within tolerance, otherwise it
/// opens a new group. This is first-match, not nearest-match, so the result
/// depends on input order. Returns groups of input indices, in the order the
/// groups were opened; singletons and pairs are kept.
pub fn cluster_onsets<I>(onsets: I, tolerance: u32) -> Vec<Vec<usize>>
where
    I: IntoIterator<Item = u32>,
{
    let mut groups: Vec<(u32, Vec<usize>)> = Vec::new();

    for (idx, onset) in onsets.into_iter().enumerate() {
        match groups
            .iter_mut()
            .find(|(key, _)| key.abs_diff(onset) <= tolerance)
        {
            Some((_, members)) => members.push(idx),
            None => groups.push((onset, vec![idx])),
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

/// Detect chords: onset clusters with at least three notes
///
/// Returns indices into `notes`.
pub fn detect_chords(notes: &[Note], tolerance: u32) -> Vec<Vec<usize>> {
    cluster_onsets(notes.iter().map(|n| n.onset), tolerance)
        .into_iter()
        .filter(|group| group.len() >= MIN_CHORD_SIZE)
        .collect()
}
