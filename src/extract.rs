//! Budget-spread frame extraction across a directory of videos.
//!
//! [`run`] makes two passes over the same sorted directory listing. The
//! first pass counts eligible frames (frame count minus the per-video skip)
//! across every supported, readable video. One global sampling interval is
//! computed from that total and the requested frame budget. The second pass
//! walks the same list again, sampling each video at that interval and
//! subtracting what was actually written from the remaining budget before
//! moving on — so a video that yields fewer frames than expected leaves its
//! share for the videos after it, and the total written never exceeds the
//! budget.
//!
//! Per-file problems are never fatal: unsupported extensions, unreadable
//! files, and failed frame reads are logged and skipped. Only creating the
//! output directory or listing the input directory can fail the run.
//!
//! # Example
//!
//! ```no_run
//! use framesift::RunOptions;
//!
//! fn main() -> Result<(), framesift::FramesiftError> {
//!     let options = RunOptions::new("recordings/", "frames/", 5000).with_skip(100);
//!     let summary = framesift::run(&options)?;
//!     println!(
//!         "wrote {} of {} requested frames",
//!         summary.frames_written, 5000,
//!     );
//!     Ok(())
//! }
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::FramesiftError,
    progress::{NoOpProgress, Pass, ProgressCallback, ProgressInfo},
    sampling::ExtractionPlan,
    source::VideoSource,
};

/// Settings for a directory run.
///
/// Built with [`RunOptions::new`] plus `with_*` methods; a plain `new` is a
/// complete configuration.
#[derive(Clone)]
pub struct RunOptions {
    pub(crate) input_dir: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) frames_to_extract: u64,
    pub(crate) skip: u64,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for RunOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunOptions")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("frames_to_extract", &self.frames_to_extract)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

impl RunOptions {
    /// Create run settings with no skip and no progress callback.
    ///
    /// `frames_to_extract` is the global budget; callers must pass a value
    /// greater than zero (the CLI enforces this at argument level, and a
    /// zero budget simply writes nothing).
    pub fn new<I, O>(input_dir: I, output_dir: O, frames_to_extract: u64) -> Self
    where
        I: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            frames_to_extract,
            skip: 0,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Ignore the first `skip` frames of every video, in both the counting
    /// and the extraction pass.
    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Attach a progress callback, invoked once per directory entry in each
    /// pass.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }
}

/// What a directory run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Entries with an allow-listed extension.
    pub videos_supported: u64,
    /// Entries skipped for their extension.
    pub videos_unsupported: u64,
    /// Supported entries that could not be opened during the counting pass.
    pub videos_unreadable: u64,
    /// Σ max(0, frame_count − skip) over readable supported videos.
    pub eligible_frames: u64,
    /// The global sampling interval, in frames.
    pub sample_every: f64,
    /// Frames actually written.
    pub frames_written: u64,
    /// Budget left after the last video.
    pub budget_remaining: u64,
}

struct DirectorySurvey {
    eligible_frames: u64,
    supported: u64,
    unsupported: u64,
    unreadable: u64,
}

/// Run the allocator end to end: count, plan, extract.
///
/// # Errors
///
/// Only startup failures propagate: creating `output_dir` or listing
/// `input_dir`. Everything after that degrades per file, per frame, with
/// warnings through the [`log`] facade.
pub fn run(options: &RunOptions) -> Result<RunSummary, FramesiftError> {
    fs::create_dir_all(&options.output_dir)?;
    let entries = list_entries_sorted(&options.input_dir)?;

    let survey = survey_entries(&entries, options.skip, options.progress.as_ref());
    log::info!(
        "Counted {} eligible frames across {} supported videos ({} unsupported, {} unreadable)",
        survey.eligible_frames,
        survey.supported,
        survey.unsupported,
        survey.unreadable,
    );

    let plan = ExtractionPlan::compute(survey.eligible_frames, options.frames_to_extract);
    log::info!(
        "Sampling every {:.2} frames to extract up to {}",
        plan.sample_every(),
        options.frames_to_extract,
    );

    let mut remaining = options.frames_to_extract;
    let mut frames_written = 0_u64;
    let mut videos_done = 0_u64;

    for entry in &entries {
        // Unsupported entries were already reported by the counting pass.
        let Some(source) = VideoSource::scan(entry) else {
            continue;
        };

        let extracted =
            extract_from_video(&source, &options.output_dir, plan, remaining, options.skip);
        remaining = remaining.saturating_sub(extracted);
        frames_written += extracted;
        videos_done += 1;

        options.progress.on_progress(&ProgressInfo {
            pass: Pass::Extracting,
            current: videos_done,
            total: Some(survey.supported),
            frames_written,
            budget_remaining: Some(remaining),
        });
    }

    log::info!("Wrote {frames_written} frames ({remaining} of the budget left)");

    Ok(RunSummary {
        videos_supported: survey.supported,
        videos_unsupported: survey.unsupported,
        videos_unreadable: survey.unreadable,
        eligible_frames: survey.eligible_frames,
        sample_every: plan.sample_every(),
        frames_written,
        budget_remaining: remaining,
    })
}

/// Count frames available for sampling across `entries`.
///
/// For every allow-listed entry the video is opened, `frame_count − skip`
/// (floored at zero) is added to the total, and the handle is dropped
/// again. Unsupported and unreadable entries contribute nothing and are
/// reported at warn level.
pub fn count_eligible_frames(entries: &[PathBuf], skip: u64) -> u64 {
    survey_entries(entries, skip, &NoOpProgress).eligible_frames
}

fn survey_entries(
    entries: &[PathBuf],
    skip: u64,
    progress: &dyn ProgressCallback,
) -> DirectorySurvey {
    let mut survey = DirectorySurvey {
        eligible_frames: 0,
        supported: 0,
        unsupported: 0,
        unreadable: 0,
    };

    for (index, entry) in entries.iter().enumerate() {
        match VideoSource::scan(entry) {
            Some(source) => {
                survey.supported += 1;
                match source.open() {
                    Ok(decoder) => {
                        let eligible = decoder.frame_count().saturating_sub(skip);
                        log::debug!(
                            "{}: {} frames, {} eligible",
                            entry.display(),
                            decoder.frame_count(),
                            eligible,
                        );
                        survey.eligible_frames += eligible;
                    }
                    Err(error) => {
                        survey.unreadable += 1;
                        log::warn!("Skipping unreadable video {}: {error}", entry.display());
                    }
                }
            }
            None => {
                survey.unsupported += 1;
                let extension = entry
                    .extension()
                    .map(|extension| extension.to_string_lossy().into_owned())
                    .unwrap_or_default();
                log::warn!(
                    "Skipping {}: unsupported extension \"{extension}\"",
                    entry.display(),
                );
            }
        }

        progress.on_progress(&ProgressInfo {
            pass: Pass::Counting,
            current: (index + 1) as u64,
            total: Some(entries.len() as u64),
            frames_written: 0,
            budget_remaining: None,
        });
    }

    survey
}

/// Sample up to `max_frames` frames from one video and write them as JPEGs.
///
/// Positions come from `plan` applied to this video's frame count; each is
/// seeked and read independently, and a frame that fails to decode is
/// skipped without consuming budget. A failure that poisons the decoder
/// abandons the rest of this video, keeping whatever was already written.
/// Returns the number of frames written; the caller subtracts it from the
/// running budget.
pub fn extract_from_video(
    source: &VideoSource,
    output_dir: &Path,
    plan: ExtractionPlan,
    max_frames: u64,
    skip: u64,
) -> u64 {
    if max_frames == 0 {
        return 0;
    }

    let mut decoder = match source.open() {
        Ok(decoder) => decoder,
        Err(error) => {
            log::warn!(
                "Skipping unreadable video {}: {error}",
                source.path().display(),
            );
            return 0;
        }
    };

    let mut extracted = 0_u64;
    for position in plan.positions(decoder.frame_count(), skip) {
        if extracted == max_frames {
            break;
        }

        decoder.seek(position);
        match decoder.read() {
            Ok(frame) => {
                let output_path = source.frame_output_path(output_dir, position);
                match frame.save(&output_path) {
                    Ok(()) => {
                        extracted += 1;
                        log::debug!(
                            "Saved frame {position} of {} -> {}",
                            source.path().display(),
                            output_path.display(),
                        );
                    }
                    Err(error) => {
                        log::warn!("Failed to write {}: {error}", output_path.display());
                    }
                }
            }
            Err(FramesiftError::VideoDecode(reason)) => {
                log::debug!(
                    "No frame at position {position} of {}: {reason}",
                    source.path().display(),
                );
            }
            Err(error) => {
                log::warn!(
                    "Aborting {} at position {position}: {error}",
                    source.path().display(),
                );
                break;
            }
        }
    }

    extracted
}

fn list_entries_sorted(input_dir: &Path) -> Result<Vec<PathBuf>, FramesiftError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}
