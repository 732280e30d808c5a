// Humanization run trace
// Append-only JSONL record of what each pipeline stage did to each track

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::humanizer::{HumanizeReport, TrackOutcome};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Stage a trace entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Run,
    ChordRolling,
    Performance,
    PhraseShaping,
    OverlapResolution,
    Track,
}

/// One line of the trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: TraceStage,

    /// Track index, absent for run-level entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<usize>,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: TraceStage, track: Option<usize>, message: impl Into<String>) -> Self {
        TraceEntry {
            timestamp: Utc::now(),
            stage,
            track,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Serialize to a JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Builds the entries for one track
pub struct TraceBuilder {
    track: usize,
}

impl TraceBuilder {
    pub fn track(track: usize) -> Self {
        TraceBuilder { track }
    }

    pub fn entry(&self, stage: TraceStage, message: impl Into<String>) -> TraceEntry {
        TraceEntry::new(stage, Some(self.track), message)
    }
}

/// Flatten a run report into trace entries: one run header, then the
/// stages of every track in track order
pub fn report_entries(report: &HumanizeReport) -> Vec<TraceEntry> {
    let mut entries = vec![TraceEntry::new(
        TraceStage::Run,
        None,
        format!("{} / {}", report.method, report.preset),
    )
    .with_data(serde_json::json!({
        "seed": report.seed,
        "resolution": report.resolution,
        "tracks": report.tracks.len(),
    }))];

    for outcome in &report.tracks {
        match outcome {
            TrackOutcome::Humanized(track) => {
                let builder = TraceBuilder::track(track.index);

                let mut rolling = builder.entry(
                    TraceStage::ChordRolling,
                    format!(
                        "Rolled {} of {} chords",
                        track.rolled_chords.len(),
                        track.chords_detected
                    ),
                );
                if !track.rolled_chords.is_empty() {
                    rolling = rolling.with_data(serde_json::json!(track.rolled_chords));
                }
                entries.push(rolling);

                let performance = match (track.left_hand_notes, track.right_hand_notes) {
                    (Some(left), Some(right)) => format!(
                        "Left hand {} notes, right hand {} notes, {} correlated groups",
                        left, right, track.correlated_groups
                    ),
                    _ => format!(
                        "{} notes, {} correlated groups",
                        track.notes, track.correlated_groups
                    ),
                };
                entries.push(builder.entry(TraceStage::Performance, performance));

                if track.phrase_endings > 0 {
                    entries.push(builder.entry(
                        TraceStage::PhraseShaping,
                        format!(
                            "{} phrase endings, {} delays",
                            track.phrase_endings, track.ritardando_delays
                        ),
                    ));
                }

                entries.push(builder.entry(
                    TraceStage::OverlapResolution,
                    format!("Resolved {} overlaps", track.overlaps_resolved),
                ));
            }
            TrackOutcome::Skipped { index, name } => {
                entries.push(TraceEntry::new(
                    TraceStage::Track,
                    Some(*index),
                    format!("Skipped empty track '{}'", name),
                ));
            }
            TrackOutcome::Failed { index, name, error } => {
                entries.push(
                    TraceEntry::new(
                        TraceStage::Track,
                        Some(*index),
                        format!("Track '{}' left unchanged", name),
                    )
                    .with_data(serde_json::json!({ "error": error })),
                );
            }
        }
    }

    entries
}

/// Append-only JSONL trace file
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    /// Append one entry, creating the file if needed
    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        self.write_batch(std::slice::from_ref(entry))
    }

    pub fn write_batch(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            file.write_all(entry.to_json_line()?.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    /// Append every entry of a run report
    pub fn write_report(&self, report: &HumanizeReport) -> Result<usize, TraceError> {
        let entries = report_entries(report);
        self.write_batch(&entries)?;
        Ok(entries.len())
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str(line)?);
    }

    Ok(entries)
}
