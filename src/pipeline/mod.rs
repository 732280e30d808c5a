// Pipeline execution and monitoring module
// Orchestrates every humanization stage over a score and traces the run

pub mod humanizer;
pub mod trace;

pub use humanizer::{
    humanize, HumanizeError, HumanizeReport, HumanizeResult, Humanizer, TrackOutcome, TrackReport,
};
pub use trace::{read_trace_file, report_entries, TraceBuilder, TraceEntry, TraceError, TraceStage, TraceWriter};
