//! # framesift
//!
//! Spread a fixed frame budget across a directory of videos and write the
//! sampled frames as JPEG images.
//!
//! `framesift` answers one question: given a directory of recordings and a
//! total number of frames you can afford to keep, which frames should be
//! written out so that every video contributes in proportion to its length?
//! It computes a single global sampling interval from the corpus, then walks
//! each video at that interval, threading the remaining budget from one video
//! to the next. Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! The crate also ships [`VideoReader`], a small façade that unifies indexed
//! Norpix-style `.seq` recordings and anything FFmpeg can open behind one
//! read-by-index interface with a single float-RGB frame type.
//!
//! ## Quick Start
//!
//! ### Sample a directory
//!
//! ```no_run
//! use framesift::RunOptions;
//!
//! let options = RunOptions::new("recordings/", "frames/", 5000).with_skip(100);
//! let summary = framesift::run(&options).unwrap();
//! println!("{} frames written", summary.frames_written);
//! ```
//!
//! ### Read frames through one interface
//!
//! ```no_run
//! use framesift::VideoReader;
//!
//! let mut reader = VideoReader::open("session.seq").unwrap();
//! let frame = reader.read_frame(12).unwrap();
//! assert_eq!(frame.dimensions(), (reader.width(), reader.height()));
//! ```
//!
//! ## How the budget is spread
//!
//! - **Count** — every supported video is opened once and
//!   `max(0, frame_count − skip)` is summed into the eligible total.
//!   Unreadable files are logged and contribute nothing.
//! - **Plan** — `sample_every = eligible total ÷ requested frames`, computed
//!   once for the whole run.
//! - **Extract** — each video is sampled starting at `skip + sample_every/2`,
//!   stepping by `sample_every`, capped by the budget still remaining; the
//!   actual number written is subtracted before the next video.
//!
//! Frames land at `<output_dir>/<video_stem>_<position:06>.jpg`, so a frame's
//! filename tells you exactly where it came from.
//!
//! ## Features
//!
//! - **Proportional sampling** — long videos yield more frames, short ones
//!   fewer, and the total never exceeds the budget
//! - **Fault tolerance** — unsupported extensions, unreadable files, and
//!   failed frame reads are logged and skipped, never fatal
//! - **Unified reading** — `.seq` headers and seek tables or FFmpeg streams
//!   behind the same `frame_count`/`read_frame`/`read_next` surface
//! - **Progress callbacks** — observe both passes without the library
//!   choosing how progress is drawn
//! - **Efficient seeking** — seeks to the nearest keyframe, then decodes
//!   forward
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system for the
//! decoder backend to build.

pub mod decoder;
pub mod error;
pub mod extract;
pub mod progress;
pub mod reader;
pub mod sampling;
pub mod seq;
pub mod source;

pub use decoder::FrameDecoder;
pub use error::FramesiftError;
pub use extract::{RunOptions, RunSummary, count_eligible_frames, extract_from_video, run};
pub use progress::{Pass, ProgressCallback, ProgressInfo};
pub use reader::VideoReader;
pub use sampling::{ExtractionPlan, SamplePositions};
pub use seq::{SeqHeader, SeqPixelFormat, SeqReader};
pub use source::{ContainerFormat, VideoSource};
