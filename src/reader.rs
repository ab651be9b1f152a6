//! Unified frame access across container families.
//!
//! [`VideoReader`] hides the difference between the indexed `.seq` container
//! and everything FFmpeg can demux behind one read-by-index interface. The
//! backend is chosen once, at [`open`](VideoReader::open), from the file
//! extension; after that no call site branches on container type again.
//!
//! Both backends surface frames as [`image::Rgb32FImage`] with components in
//! `[0.0, 1.0]`, so downstream numeric code sees one pixel type whether the
//! frame came from a raw monochrome block, a BGR block, an embedded JPEG, or
//! an FFmpeg codec.
//!
//! # Example
//!
//! ```no_run
//! use framesift::VideoReader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut reader = VideoReader::open("recording.seq")?;
//!     println!(
//!         "{} frames at {}x{} ({} fps)",
//!         reader.frame_count(),
//!         reader.width(),
//!         reader.height(),
//!         reader.fps(),
//!     );
//!     let first = reader.read_frame(0)?;
//!     assert_eq!(first.dimensions(), (reader.width(), reader.height()));
//!     reader.close();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use image::{DynamicImage, Rgb32FImage, RgbImage};

use crate::{decoder::FrameDecoder, error::FramesiftError, seq::SeqReader};

/// Rate assumed when a container reports no usable frame rate.
const FALLBACK_FPS: f64 = 30.0;

/// A frame source with one interface over two container families.
#[derive(Debug)]
pub enum VideoReader {
    /// Indexed Norpix-style `.seq` container.
    Seq(SeqReader),
    /// Any container FFmpeg can open.
    Ffmpeg(FrameDecoder),
}

impl VideoReader {
    /// Open a video, choosing the backend from the file extension.
    ///
    /// Exactly the extension `seq` (case-sensitive) selects the indexed
    /// backend; every other path goes to FFmpeg.
    ///
    /// # Errors
    ///
    /// Returns the opening error of the selected backend; a reader is never
    /// half-initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framesift::VideoReader;
    ///
    /// let reader = VideoReader::open("session.mp4")?;
    /// assert!(matches!(reader, VideoReader::Ffmpeg(_)));
    /// # Ok::<(), framesift::FramesiftError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref();
        if is_seq_path(path) {
            Ok(Self::Seq(SeqReader::open(path)?))
        } else {
            Ok(Self::Ffmpeg(FrameDecoder::open(path)?))
        }
    }

    /// Total number of frames (exact for `.seq`, estimated for FFmpeg).
    pub fn frame_count(&self) -> u64 {
        match self {
            Self::Seq(reader) => reader.frame_count(),
            Self::Ffmpeg(decoder) => decoder.frame_count(),
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Seq(reader) => reader.width(),
            Self::Ffmpeg(decoder) => decoder.width(),
        }
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Seq(reader) => reader.height(),
            Self::Ffmpeg(decoder) => decoder.height(),
        }
    }

    /// Frames per second.
    ///
    /// `.seq` headers carry the rate directly. FFmpeg streams that report no
    /// usable rate fall back to 30.0 so downstream timing math never divides
    /// by zero.
    pub fn fps(&self) -> f64 {
        match self {
            Self::Seq(reader) => reader.fps(),
            Self::Ffmpeg(decoder) => {
                let fps = decoder.fps();
                if fps > 0.0 && fps.is_finite() {
                    fps
                } else {
                    FALLBACK_FPS
                }
            }
        }
    }

    /// The path the reader was opened from.
    pub fn path(&self) -> &Path {
        match self {
            Self::Seq(reader) => reader.path(),
            Self::Ffmpeg(decoder) => decoder.path(),
        }
    }

    /// Read the frame at `index`, positioning the backend explicitly first.
    ///
    /// Indexed access is repeatable: the same index returns the same pixels,
    /// regardless of any sequential reads in between. The sequential cursor
    /// is left just past `index`.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FrameOutOfRange`] when `index` is at or
    /// past [`frame_count`](VideoReader::frame_count), or a backend decode
    /// error.
    pub fn read_frame(&mut self, index: u64) -> Result<Rgb32FImage, FramesiftError> {
        let total_frames = self.frame_count();
        if index >= total_frames {
            return Err(FramesiftError::FrameOutOfRange {
                frame_number: index,
                total_frames,
            });
        }
        let frame = match self {
            Self::Seq(reader) => reader.read_frame(index)?,
            Self::Ffmpeg(decoder) => {
                decoder.seek(index);
                decoder.read()?
            }
        };
        Ok(float_frame(frame))
    }

    /// Read the frame at the sequential cursor and advance it.
    ///
    /// Returns `Ok(None)` past the last frame. For the FFmpeg backend the
    /// frame count is an estimate, so a stream that ends a little early also
    /// yields `Ok(None)` rather than an error.
    ///
    /// # Errors
    ///
    /// Backend decode failures for in-range frames.
    pub fn read_next(&mut self) -> Result<Option<Rgb32FImage>, FramesiftError> {
        match self {
            Self::Seq(reader) => Ok(reader.read_next()?.map(float_frame)),
            Self::Ffmpeg(decoder) => {
                if decoder.position() >= decoder.frame_count() {
                    return Ok(None);
                }
                match decoder.read() {
                    Ok(frame) => Ok(Some(float_frame(frame))),
                    // The duration-based estimate overshot the real stream.
                    Err(FramesiftError::VideoDecode(_)) => Ok(None),
                    Err(error) => Err(error),
                }
            }
        }
    }

    /// Position the sequential cursor at `frame_number`.
    pub fn seek(&mut self, frame_number: u64) {
        match self {
            Self::Seq(reader) => reader.seek(frame_number),
            Self::Ffmpeg(decoder) => decoder.seek(frame_number),
        }
    }

    /// Release the underlying file and codec handles.
    ///
    /// Consuming `self` makes the release point explicit and double release
    /// unrepresentable; plain drop is equivalent.
    pub fn close(self) {
        drop(self);
    }
}

fn is_seq_path(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "seq")
}

/// Boundary conversion shared by both backends: RGB8 in, float RGB out.
fn float_frame(frame: RgbImage) -> Rgb32FImage {
    DynamicImage::ImageRgb8(frame).into_rgb32f()
}
