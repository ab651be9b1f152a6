//! Progress reporting for directory runs.
//!
//! [`ProgressCallback`] lets callers observe a run without the library
//! deciding how progress is rendered; the bundled CLI attaches an indicatif
//! bar, tests attach counters. Callbacks are infallible observers and cannot
//! halt the run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framesift::{Pass, ProgressCallback, ProgressInfo, RunOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if info.pass == Pass::Extracting {
//!             println!("{} videos done, {} frames written", info.current, info.frames_written);
//!         }
//!     }
//! }
//!
//! let options = RunOptions::new("videos", "frames", 500)
//!     .with_progress(Arc::new(PrintProgress));
//! let summary = framesift::run(&options)?;
//! # Ok::<(), framesift::FramesiftError>(())
//! ```

/// Which of the two passes over the input directory is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Pass {
    /// First pass: counting eligible frames per video.
    Counting,
    /// Second pass: sampling and writing frames.
    Extracting,
}

/// A snapshot of run progress, delivered once per directory entry.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The pass this snapshot belongs to.
    pub pass: Pass,
    /// Entries processed so far in this pass.
    pub current: u64,
    /// Total entries this pass will visit, if known when the pass starts.
    pub total: Option<u64>,
    /// Frames written so far; always 0 during the counting pass.
    pub frames_written: u64,
    /// Frames still allowed to be written; `None` during the counting pass,
    /// before a budget exists.
    pub budget_remaining: Option<u64>,
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be [`Send`] and [`Sync`]; the callback is shared
/// behind an [`Arc`](std::sync::Arc) in [`RunOptions`](crate::RunOptions).
pub trait ProgressCallback: Send + Sync {
    /// Called after each directory entry is processed.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications; the default when none is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}
