use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use serde_json::json;

use framesift::{Pass, ProgressCallback, ProgressInfo, RunOptions};

const CLI_AFTER_HELP: &str = "Examples:\n  framesift recordings/ frames/ 5000\n  framesift recordings/ frames/ 5000 --skip 100 -vv\n  framesift recordings/ frames/ 5000 --progress\n  framesift recordings/ frames/ 5000 --json > summary.json";

#[derive(Debug, Parser)]
#[command(
    name = "framesift",
    version,
    about = "Spread a fixed frame budget across a directory of videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Directory containing the input videos.
    input_dir: PathBuf,

    /// Directory the sampled frames are written to (created if missing).
    output_dir: PathBuf,

    /// Total number of frames to extract across all videos.
    frames_to_extract: u64,

    /// Ignore the first N frames of every video.
    #[arg(short, long, default_value_t = 0)]
    skip: u64,

    /// Increase log verbosity (-v: info, -vv: debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Show a per-video progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the run summary as machine-readable JSON.
    #[arg(long)]
    json: bool,
}

fn verbosity_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Renders the extraction pass as an indicatif bar.
///
/// The bar is created lazily on the first extraction callback, once the
/// video total is known.
struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn finish(&self) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.finish_with_message("done");
            }
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.pass != Pass::Extracting {
            return;
        }
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(info.total.unwrap_or(0));
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
            ) {
                bar.set_style(style.progress_chars("##-"));
            }
            bar
        });
        bar.set_position(info.current);
        bar.set_message(format!("{} frames", info.frames_written));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(verbosity_filter(cli.verbose))
        .parse_default_env()
        .init();

    if cli.frames_to_extract == 0 {
        return Err("frames-to-extract must be greater than 0".into());
    }
    if !cli.input_dir.is_dir() {
        return Err(format!("input directory not found: {}", cli.input_dir.display()).into());
    }

    let mut options =
        RunOptions::new(&cli.input_dir, &cli.output_dir, cli.frames_to_extract).with_skip(cli.skip);

    let terminal_progress = if cli.progress {
        let callback = Arc::new(TerminalProgress::new());
        options = options.with_progress(callback.clone());
        Some(callback)
    } else {
        None
    };

    let summary = framesift::run(&options)?;

    if let Some(progress) = terminal_progress {
        progress.finish();
    }

    if cli.json {
        let payload = json!({
            "videos_supported": summary.videos_supported,
            "videos_unsupported": summary.videos_unsupported,
            "videos_unreadable": summary.videos_unreadable,
            "eligible_frames": summary.eligible_frames,
            "sample_every": summary.sample_every,
            "frames_written": summary.frames_written,
            "budget_remaining": summary.budget_remaining,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "Extracted {} frame(s) from {} video(s) to {}",
                summary.frames_written,
                summary.videos_supported,
                cli.output_dir.display()
            )
            .green()
        );
        if summary.budget_remaining > 0 {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!(
                    "{} of {} requested frames could not be filled",
                    summary.budget_remaining, cli.frames_to_extract
                )
                .yellow()
            );
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use log::LevelFilter;

    use super::{Cli, verbosity_filter};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_filter(0), LevelFilter::Warn);
        assert_eq!(verbosity_filter(1), LevelFilter::Info);
        assert_eq!(verbosity_filter(2), LevelFilter::Debug);
        assert_eq!(verbosity_filter(5), LevelFilter::Debug);
    }

    #[test]
    fn positionals_and_flags_parse() {
        let cli = Cli::try_parse_from([
            "framesift",
            "videos",
            "frames",
            "500",
            "--skip",
            "30",
            "-vv",
            "--progress",
        ])
        .unwrap();
        assert_eq!(cli.input_dir.to_str(), Some("videos"));
        assert_eq!(cli.output_dir.to_str(), Some("frames"));
        assert_eq!(cli.frames_to_extract, 500);
        assert_eq!(cli.skip, 30);
        assert_eq!(cli.verbose, 2);
        assert!(cli.progress);
        assert!(!cli.json);
    }

    #[test]
    fn skip_has_a_short_flag() {
        let cli = Cli::try_parse_from(["framesift", "a", "b", "10", "-s", "7"]).unwrap();
        assert_eq!(cli.skip, 7);
    }

    #[test]
    fn missing_positionals_are_rejected() {
        assert!(Cli::try_parse_from(["framesift", "videos", "frames"]).is_err());
    }
}
