// Humanization Pipeline - Runs every engine stage over each track of a score
// Chords -> rolls -> hands or whole-track timing/dynamics -> phrasing -> overlaps

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::NormalError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::humanize::{
    apply_ritardando, detect_chords, detect_phrase_endings, humanize_hands, perform,
    resolve_overlaps, roll_chords, DynamicsSettings, PerformanceRanges, RolledChord,
};
use crate::profiles::{self, HumanizeProfile, Method, ProfileError, ProfileOverrides};
use crate::score::{Note, Score, Track};

#[derive(Debug, Error)]
pub enum HumanizeError {
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Invalid distribution parameters: {0}")]
    Distribution(#[from] NormalError),
}

pub type HumanizeResult<T> = Result<T, HumanizeError>;

/// What happened to one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackReport {
    pub index: usize,
    pub name: String,
    pub notes: usize,

    /// Input notes coerced to a valid shape before processing
    pub coerced_notes: usize,

    pub chords_detected: usize,
    pub rolled_chords: Vec<RolledChord>,

    /// Only set when hand separation is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_hand_notes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_hand_notes: Option<usize>,

    pub correlated_groups: usize,
    pub phrase_endings: usize,
    pub ritardando_delays: usize,
    pub overlaps_resolved: usize,
}

/// Per-track result; a failed track keeps its original notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackOutcome {
    Humanized(TrackReport),
    Skipped { index: usize, name: String },
    Failed {
        index: usize,
        name: String,
        error: String,
    },
}

/// Summary of a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanizeReport {
    pub method: Method,
    pub preset: String,
    pub seed: u64,
    pub resolution: u16,
    pub tracks: Vec<TrackOutcome>,
}

impl HumanizeReport {
    /// Reports of successfully humanized tracks
    pub fn humanized(&self) -> impl Iterator<Item = &TrackReport> {
        self.tracks.iter().filter_map(|outcome| match outcome {
            TrackOutcome::Humanized(report) => Some(report),
            _ => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|outcome| matches!(outcome, TrackOutcome::Failed { .. }))
            .count()
    }
}

/// Applies a resolved profile to scores
///
/// Each track draws from its own RNG seeded from the run seed and the track
/// index, so results are reproducible and independent of track order.
#[derive(Debug, Clone)]
pub struct Humanizer {
    profile: HumanizeProfile,
    seed: u64,
}

impl Humanizer {
    /// Create a humanizer with a random seed
    pub fn new(profile: HumanizeProfile) -> Self {
        Humanizer {
            profile,
            seed: rand::random(),
        }
    }

    /// Create a humanizer with a fixed seed
    pub fn with_seed(profile: HumanizeProfile, seed: u64) -> Self {
        Humanizer { profile, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// RNG for one track
    pub fn track_rng(&self, index: usize) -> StdRng {
        let mix = (index as u64).wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        StdRng::seed_from_u64(self.seed ^ mix)
    }

    /// Humanize every track of a score in place
    pub fn humanize_score(&self, score: &mut Score) -> HumanizeReport {
        let profile = &self.profile;
        log::info!(
            "Applying {} humanization with {} preset (seed {})",
            profile.method,
            profile.preset,
            self.seed
        );
        log::info!(
            "  Velocity range: +/-{}, chord roll probability: {:.1}%",
            profile.velocity_range,
            profile.chord_roll.probability * 100.0
        );
        log::info!(
            "  Hand separation: {}, beat accenting: {}, chord velocity correlation: {}",
            profile.hands.enabled,
            profile.beat_accenting,
            profile.chord_velocity_correlation
        );

        let resolution = score.resolution.max(1);
        let measure_ticks = score.measure_ticks();

        let tracks = score
            .tracks
            .iter_mut()
            .enumerate()
            .map(|(index, track)| {
                self.humanize_track_isolated(track, index, resolution, measure_ticks)
            })
            .collect();

        HumanizeReport {
            method: profile.method,
            preset: profile.preset.clone(),
            seed: self.seed,
            resolution,
            tracks,
        }
    }

    /// Humanize one track, leaving it untouched if any stage fails
    fn humanize_track_isolated(
        &self,
        track: &mut Track,
        index: usize,
        resolution: u16,
        measure_ticks: u32,
    ) -> TrackOutcome {
        if track.notes.is_empty() {
            log::debug!("Skipping empty track {} '{}'", index, track.name);
            return TrackOutcome::Skipped {
                index,
                name: track.name.clone(),
            };
        }

        let mut notes = track.notes.clone();
        let mut rng = self.track_rng(index);

        match self.humanize_notes(&mut notes, resolution, measure_ticks, &mut rng) {
            Ok(mut report) => {
                track.notes = notes;
                report.index = index;
                report.name = track.name.clone();
                log::info!(
                    "Track {} '{}': {} notes, rolled {} of {} chords, {} overlaps resolved",
                    index,
                    report.name,
                    report.notes,
                    report.rolled_chords.len(),
                    report.chords_detected,
                    report.overlaps_resolved
                );
                TrackOutcome::Humanized(report)
            }
            Err(e) => {
                log::error!("Track {} '{}' failed: {}", index, track.name, e);
                TrackOutcome::Failed {
                    index,
                    name: track.name.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run all stages over a track's notes
    pub fn humanize_notes(
        &self,
        notes: &mut [Note],
        resolution: u16,
        measure_ticks: u32,
        rng: &mut StdRng,
    ) -> HumanizeResult<TrackReport> {
        let profile = &self.profile;
        let ticks = profile.tick_ranges(resolution);
        let mut report = TrackReport {
            notes: notes.len(),
            ..Default::default()
        };

        // Stage 0: coerce malformed input
        for note in notes.iter_mut() {
            let before = *note;
            if note.coerce(ticks.min_duration) {
                log::debug!("Coerced note {:?} -> {:?}", before, note);
                report.coerced_notes += 1;
            }
        }

        // Stage 1: chord detection and rolling
        let chords = detect_chords(notes, profile.chord_tolerance_ticks);
        report.chords_detected = chords.len();
        report.rolled_chords = roll_chords(
            notes,
            &chords,
            &profile.chord_roll,
            profile.jazz_chord_emphasis,
            resolution,
            rng,
        )?;

        // Stage 2: timing and dynamics, per hand or over the whole track
        let dynamics = DynamicsSettings {
            beat_accenting: profile.beat_accenting,
            chord_velocity_correlation: profile.chord_velocity_correlation,
            tolerance_ticks: profile.correlation_tolerance_ticks,
            resolution,
            measure_ticks,
        };

        if profile.hands.enabled {
            let stats = humanize_hands(notes, profile, &ticks, &dynamics, rng);
            report.left_hand_notes = Some(stats.left_notes);
            report.right_hand_notes = Some(stats.right_notes);
            report.correlated_groups = stats.left_correlated_groups + stats.right_correlated_groups;
        } else {
            let ranges = PerformanceRanges::whole_track(profile, &ticks);
            let mut all: Vec<&mut Note> = notes.iter_mut().collect();
            report.correlated_groups = perform(&mut all, &ranges, &dynamics, rng);
        }

        // Stage 3: phrase-end ritardando
        if profile.phrase.enabled {
            let endings = detect_phrase_endings(notes, profile.phrase.threshold_ticks);
            report.phrase_endings = endings.len();
            if !endings.is_empty() {
                report.ritardando_delays = apply_ritardando(
                    notes,
                    &endings,
                    &profile.phrase,
                    resolution,
                    ticks.min_duration,
                    rng,
                );
            }
        }

        // Stage 4: keep pitch lanes monophonic
        report.overlaps_resolved = resolve_overlaps(notes, ticks.min_duration);

        Ok(report)
    }
}

/// Resolve a (method, preset) pair, apply overrides and humanize a score
pub fn humanize(
    score: &mut Score,
    method: &str,
    preset: &str,
    overrides: &ProfileOverrides,
    seed: Option<u64>,
) -> HumanizeResult<HumanizeReport> {
    let profile = profiles::resolve(method, preset)?.with_overrides(overrides)?;

    let humanizer = match seed {
        Some(seed) => Humanizer::with_seed(profile, seed),
        None => Humanizer::new(profile),
    };

    Ok(humanizer.humanize_score(score))
}
