// Humanizer CLI entry point
//
// Reads a MIDI file, applies a humanization preset and writes the result.
//
// Usage:
//   humanize <input.mid> <output.mid> [--method METHOD] [--preset PRESET]
//     [--seed N] [--velocity-range N] [--timing-range BEATS]
//     [--roll-probability P] [--trace PATH] [--verbose]
//   humanize --list-presets
//
// Methods: basic (minimal, medium, aggressive),
//          piano_performance (classical, romantic, jazz)

use std::path::{Path, PathBuf};
use std::process;

use humanizer::pipeline::{Humanizer, TraceWriter, TrackOutcome};
use humanizer::profiles::{self, Method, ProfileOverrides};
use humanizer::score::{read_midi_file, write_midi_file};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let level = if has_flag(&args, "--verbose") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if has_flag(&args, "--list-presets") || has_flag(&args, "--help") {
        if has_flag(&args, "--help") {
            print_usage();
        }
        print_presets();
        return;
    }

    if let Err(message) = run(&args) {
        log::error!("{}", message);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let positional = positional_args(args);
    let (input, output) = match positional.as_slice() {
        [input, output] => (PathBuf::from(input), PathBuf::from(output)),
        _ => {
            print_usage();
            return Err("expected <input.mid> <output.mid>".to_string());
        }
    };

    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()));
    }

    let method_name: String = flag_value(args, "--method")?.unwrap_or_else(|| "basic".to_string());
    let method = Method::parse(&method_name).map_err(|e| e.to_string())?;

    let preset: String = match flag_value(args, "--preset")? {
        Some(preset) => preset,
        None => {
            let preset = method.default_preset();
            log::info!("No preset given, using default '{}' for {}", preset, method);
            preset.to_string()
        }
    };

    let overrides = ProfileOverrides {
        velocity_range: flag_value(args, "--velocity-range")?,
        timing_range_beats: flag_value(args, "--timing-range")?,
        roll_probability: flag_value(args, "--roll-probability")?,
    };
    let seed: Option<u64> = flag_value(args, "--seed")?;
    let trace_path: Option<PathBuf> = flag_value(args, "--trace")?;

    let profile = profiles::resolve_method(method, &preset)
        .and_then(|profile| profile.with_overrides(&overrides))
        .map_err(|e| e.to_string())?;

    log::info!("Loading MIDI file: {}", input.display());
    let mut score = read_midi_file(&input).map_err(|e| e.to_string())?;

    let note_count = score.note_count();
    if note_count == 0 {
        log::warn!("No notes found in '{}', nothing to humanize", input.display());
        return Ok(());
    }
    log::info!(
        "Found {} notes in {} tracks ({} ticks per beat)",
        note_count,
        score.tracks.len(),
        score.resolution
    );

    let humanizer = match seed {
        Some(seed) => Humanizer::with_seed(profile, seed),
        None => {
            let humanizer = Humanizer::new(profile);
            log::info!("Rerun with --seed {} to reproduce this result", humanizer.seed());
            humanizer
        }
    };
    let report = humanizer.humanize_score(&mut score);

    for outcome in &report.tracks {
        if let TrackOutcome::Failed { index, name, error } = outcome {
            log::warn!("Track {} '{}' kept unchanged: {}", index, name, error);
        }
    }

    let rolled: usize = report.humanized().map(|t| t.rolled_chords.len()).sum();
    log::info!(
        "Humanized {} tracks ({} failed), rolled {} chords",
        report.humanized().count(),
        report.failed_count(),
        rolled
    );

    write_midi_file(&score, &output).map_err(|e| e.to_string())?;
    log::info!("Saved humanized MIDI: {}", output.display());

    if let Some(path) = trace_path {
        write_trace(&path, &report)?;
    }

    Ok(())
}

fn write_trace(path: &Path, report: &humanizer::HumanizeReport) -> Result<(), String> {
    let writer = TraceWriter::new(path.to_path_buf());
    let written = writer.write_report(report).map_err(|e| e.to_string())?;
    log::info!("Wrote {} trace entries to {}", written, path.display());
    Ok(())
}

fn print_presets() {
    println!("Available humanization methods and presets:");
    for summary in profiles::list_methods() {
        println!();
        println!("{} ({})", summary.title, summary.method);
        println!("  {}", summary.description);
        for preset in summary.presets {
            let marker = if preset.name == summary.method.default_preset() {
                " (default)"
            } else {
                ""
            };
            println!("  - {}{}: {}", preset.name, marker, preset.description);
        }
    }
}

fn print_usage() {
    eprintln!(
        "Usage: humanize <input.mid> <output.mid> [--method METHOD] [--preset PRESET] \
         [--seed N] [--velocity-range N] [--timing-range BEATS] [--roll-probability P] \
         [--trace PATH] [--verbose]\n       humanize --list-presets"
    );
}

/// Flags that take no value
const SWITCHES: [&str; 3] = ["--verbose", "--list-presets", "--help"];

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// Arguments that are neither flags nor flag values
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            if !SWITCHES.contains(&arg.as_str()) {
                iter.next();
            }
        } else {
            positional.push(arg.as_str());
        }
    }
    positional
}

/// Parse the value following a flag; a present but unparsable value is an error
fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let raw = args
        .get(i + 1)
        .ok_or_else(|| format!("{} requires a value", flag))?;
    raw.parse()
        .map(Some)
        .map_err(|_| format!("Invalid value '{}' for {}", raw, flag))
}
