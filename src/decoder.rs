//! FFmpeg-backed frame decoding.
//!
//! [`FrameDecoder`] is the single decode engine in the crate: the extractor
//! drives it directly, and [`VideoReader`](crate::VideoReader) embeds it as
//! the backend for everything that is not a `.seq` file.
//!
//! The decoder exposes cursor semantics: [`seek`](FrameDecoder::seek) records
//! a target frame index, and [`read`](FrameDecoder::read) decodes the frame
//! at the cursor and advances it by one. Backward targets and far-forward
//! targets map the frame index to a stream timestamp, ask FFmpeg for the
//! nearest preceding keyframe, flush the codec, and decode forward until the
//! target is reached; targets a short distance ahead skip the container seek
//! and roll forward on the current decode state, which keeps densely sampled
//! reads from re-decoding the same group of pictures over and over.
//!
//! # Errors
//!
//! [`read`](FrameDecoder::read) distinguishes two failure levels:
//! [`FramesiftError::VideoDecode`] means this one frame could not be
//! produced and the decoder remains usable, while any other variant means
//! the decoder itself failed. Callers that loop over positions skip the
//! former and bail on the latter.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::error::FramesiftError;

/// Forward seeks within this many frames decode ahead on the current
/// decoder state instead of repositioning the demuxer.
const SEEK_AHEAD_WINDOW: u64 = 64;

/// A stateful decoder for one video file.
///
/// Opened via [`FrameDecoder::open`]; dropping it releases the underlying
/// FFmpeg contexts. Decoded frames are scaled to RGB24 at the source
/// resolution and returned as [`image::RgbImage`] values.
pub struct FrameDecoder {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    fps: f64,
    frame_count: u64,
    width: u32,
    height: u32,
    path: PathBuf,
    /// Next frame index [`read`](FrameDecoder::read) will produce.
    cursor: u64,
    /// Frame index the next decoded frame is expected to carry;
    /// `u64::MAX` once the stream has been fully drained.
    stream_position: u64,
    /// Set by [`seek`](FrameDecoder::seek); the next read decides whether
    /// the demuxer must be repositioned before decoding.
    pending_seek: bool,
    eof_sent: bool,
    decoded: VideoFrame,
    scaled: VideoFrame,
}

impl Debug for FrameDecoder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameDecoder")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("frame_count", &self.frame_count)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl FrameDecoder {
    /// Open a video file for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the
    /// best video stream, and prepares a codec context plus an RGB24 scaler.
    /// The frame count is estimated from the container duration and the
    /// stream frame rate, the way demuxers themselves report it for most
    /// containers.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FileOpen`] if the file cannot be opened and
    /// [`FramesiftError::NoVideoStream`] if no video stream exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref();
        let owned_path = path.to_path_buf();

        log::debug!("Opening video file: {}", owned_path.display());

        // Safe to call repeatedly.
        ffmpeg_next::init().map_err(|error| FramesiftError::FileOpen {
            path: owned_path.clone(),
            reason: format!("FFmpeg initialization failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| FramesiftError::FileOpen {
            path: owned_path.clone(),
            reason: error.to_string(),
        })?;

        let (stream_index, time_base, fps, decoder) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or(FramesiftError::NoVideoStream)?;

            // Prefer the average frame rate; fall back to the raw stream
            // rate, then to 0.0 for containers that report neither.
            let average = stream.avg_frame_rate();
            let fps = if average.denominator() != 0 {
                average.numerator() as f64 / average.denominator() as f64
            } else {
                let rate = stream.rate();
                if rate.denominator() != 0 {
                    rate.numerator() as f64 / rate.denominator() as f64
                } else {
                    0.0
                }
            };

            let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
                |error| FramesiftError::FileOpen {
                    path: owned_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                },
            )?;
            let decoder =
                decoder_context
                    .decoder()
                    .video()
                    .map_err(|error| FramesiftError::FileOpen {
                        path: owned_path.clone(),
                        reason: format!("Failed to create video decoder: {error}"),
                    })?;

            (stream.index(), stream.time_base(), fps, decoder)
        };

        let duration_microseconds = input.duration();
        let duration_seconds = if duration_microseconds > 0 {
            duration_microseconds as f64 / 1_000_000.0
        } else {
            0.0
        };
        let frame_count = if fps > 0.0 {
            (duration_seconds * fps) as u64
        } else {
            0
        };

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Opened {}: {}x{} @ {:.2} fps, ~{} frames",
            owned_path.display(),
            width,
            height,
            fps,
            frame_count,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            fps,
            frame_count,
            width,
            height,
            path: owned_path,
            cursor: 0,
            stream_position: 0,
            pending_seek: false,
            eof_sent: false,
            decoded: VideoFrame::empty(),
            scaled: VideoFrame::empty(),
        })
    }

    /// Estimated total number of frames.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames per second as reported by the stream; `0.0` when unknown.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// The path this decoder was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The frame index the next [`read`](FrameDecoder::read) will produce.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Set the cursor to `frame_number`.
    ///
    /// The demuxer is repositioned lazily on the next read, so consecutive
    /// seeks cost nothing. Targets at most [`SEEK_AHEAD_WINDOW`] frames ahead
    /// of the current decode position skip the reposition entirely and roll
    /// forward instead.
    pub fn seek(&mut self, frame_number: u64) {
        self.cursor = frame_number;
        self.pending_seek = true;
    }

    /// Decode the frame at the cursor and advance the cursor past it.
    ///
    /// # Errors
    ///
    /// [`FramesiftError::VideoDecode`] when the stream ends before the
    /// cursor (this single read failed; the decoder stays usable and a later
    /// seek resets it). Other variants indicate demuxer or codec failures
    /// that poison the decoder for the rest of the file.
    pub fn read(&mut self) -> Result<RgbImage, FramesiftError> {
        let target = self.cursor;

        if self.pending_seek {
            let rolls_forward = target >= self.stream_position
                && target - self.stream_position <= SEEK_AHEAD_WINDOW;
            if !rolls_forward {
                let timestamp = stream_timestamp_for_frame(target, self.fps, self.time_base);
                self.input.seek(timestamp, ..timestamp)?;
                self.decoder.flush();
                self.eof_sent = false;
            }
            self.pending_seek = false;
        }

        loop {
            // Drain whatever the codec has buffered first.
            if self.decoder.receive_frame(&mut self.decoded).is_ok() {
                let pts = self.decoded.pts().unwrap_or(0);
                let number = frame_number_for_pts(pts, self.time_base, self.fps);
                if number < target {
                    continue;
                }
                // At (or just past, for streams with gaps) the target.
                self.scaler.run(&self.decoded, &mut self.scaled)?;
                self.cursor = number + 1;
                self.stream_position = number + 1;
                let buffer = tight_rgb_buffer(&self.scaled, self.width, self.height);
                return RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
                    FramesiftError::VideoDecode(
                        "Failed to construct RGB image from decoded frame data".to_string(),
                    )
                });
            }

            if self.eof_sent {
                // Codec fully drained: the stream is shorter than its
                // estimated frame count. Later seeks must reposition.
                self.stream_position = u64::MAX;
                return Err(FramesiftError::VideoDecode(format!(
                    "no frame at or after index {target} (stream ended)"
                )));
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                    // Packets for other streams are skipped.
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Transient demuxer hiccup; try the next packet.
                }
            }
        }
    }
}

/// Convert a frame index to a timestamp in the stream's time base.
///
/// Saturates rather than panicking for degenerate rates, which only occur
/// when the stream reported no frame rate at all.
fn stream_timestamp_for_frame(frame_number: u64, fps: f64, time_base: Rational) -> i64 {
    let seconds = frame_number as f64 / fps;
    (seconds * time_base.denominator() as f64 / time_base.numerator() as f64) as i64
}

/// Map a PTS value back to a frame index.
fn frame_number_for_pts(pts: i64, time_base: Rational, fps: f64) -> u64 {
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * fps) as u64
}

/// Copy pixel data from a scaled frame into a tightly-packed RGB buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3);
/// this strips it so the result can go straight into
/// [`image::RgbImage::from_raw`].
fn tight_rgb_buffer(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}
