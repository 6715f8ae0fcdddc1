// ============================================================================
// Easel CLI: headless replay of recorded input sessions
// ============================================================================
//
// Usage examples:
//   easel --input session.bin
//   easel -i sessions/*.bin --config easel_settings.cfg
//   easel -i a.bin b.bin --verbose
//
// Each session is replayed against a fresh editor built from the settings,
// then a one-line summary is printed. Nothing is written back to disk.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::app::EditorApp;
use crate::io::{ReplayStats, Session};
use crate::settings::EditorSettings;

/// Easel headless session replayer.
#[derive(Parser, Debug)]
#[command(
    name = "easel",
    about = "Replay recorded Easel input sessions without a window",
    long_about = "Replay bincode input-session logs against a fresh editor and print\n\
                  what each one did to the content buffer.\n\n\
                  Example:\n  \
                  easel -i sessions/*.bin --config easel_settings.cfg"
)]
pub struct CliArgs {
    /// Session file(s). Glob patterns accepted (e.g. "logs/*.bin").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Settings file to build the editor from. Defaults to the per-user
    /// settings, or built-in defaults when there are none.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print log lines emitted during each replay and per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run all replays and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let settings = match &args.config {
        Some(path) => match EditorSettings::load_from(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: could not load settings '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorSettings::load(),
    };

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        println!("[{}/{}] {}", idx + 1, total, input_path.display());
        let file_start = Instant::now();

        if args.verbose {
            crate::logger::capture_start();
        }
        let result = run_one(input_path, &settings);
        if args.verbose {
            for line in crate::logger::capture_take() {
                println!("  {}", line);
            }
        }

        match result {
            Ok(stats) => {
                println!(
                    "  events={} flushes={} samples={} zoom={:.3} checksum={:016x}",
                    stats.events, stats.flushes, stats.samples_written, stats.zoom, stats.checksum
                );
                if args.verbose {
                    println!("  ({:.0}ms)", file_start.elapsed().as_secs_f64() * 1000.0);
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn run_one(input: &Path, settings: &EditorSettings) -> Result<ReplayStats, String> {
    let session = Session::load(input).map_err(|e| format!("load failed: {}", e))?;
    let mut app = EditorApp::new(settings.clone()).map_err(|e| e.to_string())?;
    Ok(session.replay(&mut app))
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse() {
        let args = CliArgs::parse_from(["easel", "-i", "a.bin", "b*.bin", "--config", "x.cfg", "-v"]);
        assert_eq!(args.input, vec!["a.bin".to_string(), "b*.bin".to_string()]);
        assert_eq!(args.config, Some(PathBuf::from("x.cfg")));
        assert!(args.verbose);
        assert!(CliArgs::try_parse_from(["easel"]).is_err());
    }

    #[test]
    fn globs_expand_and_dedupe() {
        let dir = std::env::temp_dir().join(format!("easel-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["one.bin", "two.bin", "skip.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        let literal = dir.join("one.bin").to_string_lossy().into_owned();
        let pattern = dir.join("*.bin").to_string_lossy().into_owned();
        let found = resolve_inputs(&[literal, pattern]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().is_some_and(|e| e == "bin")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
