//! Norpix-style `.seq` container reading.
//!
//! A `.seq` file is a 1024-byte little-endian header followed by frame
//! blocks. Raw frames occupy fixed-size blocks, so random access is a
//! multiplication; JPEG-compressed frames are length-prefixed, so a seek
//! table is built once at open by walking the prefixes. Either way
//! [`SeqReader::read_frame`] is an exact indexed read — no decode-forward,
//! no keyframes.
//!
//! Frames are surfaced as [`image::RgbImage`] regardless of how they are
//! stored: monochrome bytes are replicated across channels and BGR data is
//! reordered.

use std::{
    fs::File,
    io::{Read as _, Seek as _, SeekFrom},
    path::{Path, PathBuf},
};

use image::{ImageFormat, RgbImage};

use crate::error::FramesiftError;

/// Total header length in bytes.
const HEADER_SIZE: usize = 1024;
/// Expected value of the magic field.
const MAGIC: u32 = 0xFEED;

// Byte offsets of the header fields we consume.
const OFFSET_MAGIC: usize = 0;
const OFFSET_VERSION: usize = 28;
const OFFSET_HEADER_SIZE: usize = 32;
const OFFSET_WIDTH: usize = 548;
const OFFSET_HEIGHT: usize = 552;
const OFFSET_BIT_DEPTH: usize = 556;
const OFFSET_REAL_BIT_DEPTH: usize = 560;
const OFFSET_IMAGE_SIZE: usize = 564;
const OFFSET_IMAGE_FORMAT: usize = 568;
const OFFSET_FRAME_COUNT: usize = 572;
const OFFSET_TRUE_IMAGE_SIZE: usize = 580;
const OFFSET_FPS: usize = 584;

/// Fixed trailer after each JPEG payload (timestamp seconds + subseconds).
const JPEG_FRAME_TRAILER: u64 = 10;

/// How pixel data is stored inside each frame block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqPixelFormat {
    /// One byte per pixel, no compression.
    RawMonochrome,
    /// Three bytes per pixel in BGR order, no compression.
    RawBgr,
    /// Length-prefixed JPEG, grayscale.
    JpegMonochrome,
    /// Length-prefixed JPEG, color.
    JpegBgr,
}

impl SeqPixelFormat {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            100 => Some(Self::RawMonochrome),
            101 => Some(Self::RawBgr),
            102 => Some(Self::JpegMonochrome),
            103 => Some(Self::JpegBgr),
            _ => None,
        }
    }

    /// Whether frame blocks are length-prefixed JPEG rather than fixed-size.
    pub fn is_compressed(self) -> bool {
        matches!(self, Self::JpegMonochrome | Self::JpegBgr)
    }
}

/// Parsed `.seq` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeqHeader {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
    pub real_bit_depth: u32,
    /// Bytes of pixel data per frame (nominal for compressed files).
    pub image_size: u32,
    pub format: SeqPixelFormat,
    pub frame_count: u32,
    /// Bytes per frame block on disk, including trailing padding.
    pub true_image_size: u32,
    pub fps: f64,
}

impl SeqHeader {
    /// Parse and validate a raw 1024-byte header.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::SeqHeader`] for a bad magic value, an
    /// unknown image format code, or dimensions inconsistent with the
    /// declared frame size.
    pub fn parse(bytes: &[u8; HEADER_SIZE], path: &Path) -> Result<Self, FramesiftError> {
        let header_error = |reason: String| FramesiftError::SeqHeader {
            path: path.to_path_buf(),
            reason,
        };

        let magic = u32_at(bytes, OFFSET_MAGIC);
        if magic != MAGIC {
            return Err(header_error(format!(
                "bad magic 0x{magic:08X}, expected 0x{MAGIC:08X}"
            )));
        }

        let header_size = u32_at(bytes, OFFSET_HEADER_SIZE);
        if header_size as usize != HEADER_SIZE {
            return Err(header_error(format!(
                "declared header size {header_size}, expected {HEADER_SIZE}"
            )));
        }

        let format_code = u32_at(bytes, OFFSET_IMAGE_FORMAT);
        let format = SeqPixelFormat::from_code(format_code)
            .ok_or_else(|| header_error(format!("unsupported image format code {format_code}")))?;

        let width = u32_at(bytes, OFFSET_WIDTH);
        let height = u32_at(bytes, OFFSET_HEIGHT);
        if width == 0 || height == 0 {
            return Err(header_error(format!("degenerate dimensions {width}x{height}")));
        }

        let bit_depth = u32_at(bytes, OFFSET_BIT_DEPTH);
        let image_size = u32_at(bytes, OFFSET_IMAGE_SIZE);
        let true_image_size = u32_at(bytes, OFFSET_TRUE_IMAGE_SIZE);

        // Uncompressed blocks must actually hold width x height pixels at the
        // depth we know how to unpack (JPEG sizes are nominal, skip them).
        match format {
            SeqPixelFormat::RawMonochrome => {
                if bit_depth != 8 {
                    return Err(header_error(format!(
                        "unsupported monochrome bit depth {bit_depth}"
                    )));
                }
                let expected = width as u64 * height as u64;
                if u64::from(image_size) != expected {
                    return Err(header_error(format!(
                        "image size {image_size} does not match {width}x{height} monochrome"
                    )));
                }
            }
            SeqPixelFormat::RawBgr => {
                if bit_depth != 24 {
                    return Err(header_error(format!("unsupported BGR bit depth {bit_depth}")));
                }
                let expected = width as u64 * height as u64 * 3;
                if u64::from(image_size) != expected {
                    return Err(header_error(format!(
                        "image size {image_size} does not match {width}x{height} BGR"
                    )));
                }
            }
            SeqPixelFormat::JpegMonochrome | SeqPixelFormat::JpegBgr => {}
        }

        if !format.is_compressed() && true_image_size < image_size {
            return Err(header_error(format!(
                "frame block size {true_image_size} smaller than image size {image_size}"
            )));
        }

        Ok(Self {
            version: u32_at(bytes, OFFSET_VERSION),
            width,
            height,
            bit_depth,
            real_bit_depth: u32_at(bytes, OFFSET_REAL_BIT_DEPTH),
            image_size,
            format,
            frame_count: u32_at(bytes, OFFSET_FRAME_COUNT),
            true_image_size,
            fps: f64_at(bytes, OFFSET_FPS),
        })
    }
}

fn u32_at(bytes: &[u8; HEADER_SIZE], offset: usize) -> u32 {
    let mut raw = [0_u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn f64_at(bytes: &[u8; HEADER_SIZE], offset: usize) -> f64 {
    let mut raw = [0_u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    f64::from_le_bytes(raw)
}

/// An open `.seq` file with its seek table.
#[derive(Debug)]
pub struct SeqReader {
    file: File,
    header: SeqHeader,
    /// Byte offset of each frame block.
    seek_table: Vec<u64>,
    /// Next frame index [`read_next`](SeqReader::read_next) will produce.
    cursor: u64,
    path: PathBuf,
}

impl SeqReader {
    /// Open a `.seq` file, parse its header, and build the seek table.
    ///
    /// For raw formats the table is computed from the fixed block size and
    /// validated against the file length; for JPEG formats it is built by
    /// walking the length prefixes, so a truncated file fails here rather
    /// than on a later read.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FileOpen`] if the file cannot be opened and
    /// [`FramesiftError::SeqHeader`] for a malformed header or a file
    /// shorter than its declared frame count.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref();
        let owned_path = path.to_path_buf();

        let mut file = File::open(path).map_err(|error| FramesiftError::FileOpen {
            path: owned_path.clone(),
            reason: error.to_string(),
        })?;

        let mut header_bytes = [0_u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes)
            .map_err(|error| FramesiftError::SeqHeader {
                path: owned_path.clone(),
                reason: format!("header truncated: {error}"),
            })?;
        let header = SeqHeader::parse(&header_bytes, path)?;

        let file_length = file.metadata()?.len();
        let seek_table = if header.format.is_compressed() {
            build_jpeg_seek_table(&mut file, &header, file_length, path)?
        } else {
            build_raw_seek_table(&header, file_length, path)?
        };

        log::debug!(
            "Opened seq file {}: {}x{} @ {:.2} fps, {} frames ({:?})",
            owned_path.display(),
            header.width,
            header.height,
            header.fps,
            header.frame_count,
            header.format,
        );

        Ok(Self {
            file,
            header,
            seek_table,
            cursor: 0,
            path: owned_path,
        })
    }

    /// Number of frames declared by the header.
    pub fn frame_count(&self) -> u64 {
        u64::from(self.header.frame_count)
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Frames per second declared by the header.
    pub fn fps(&self) -> f64 {
        self.header.fps
    }

    /// The parsed header.
    pub fn header(&self) -> &SeqHeader {
        &self.header
    }

    /// The path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Position the sequential cursor at `frame_number`.
    pub fn seek(&mut self, frame_number: u64) {
        self.cursor = frame_number;
    }

    /// Read the frame at `index` and leave the cursor just past it.
    ///
    /// Indexed access is exact: the same index always yields the same
    /// pixels.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FrameOutOfRange`] when `index` is at or
    /// past the frame count.
    pub fn read_frame(&mut self, index: u64) -> Result<RgbImage, FramesiftError> {
        let total_frames = self.frame_count();
        if index >= total_frames {
            return Err(FramesiftError::FrameOutOfRange {
                frame_number: index,
                total_frames,
            });
        }

        let offset = self.seek_table[index as usize];
        let image = match self.header.format {
            SeqPixelFormat::RawMonochrome => {
                let mut gray = vec![0_u8; self.header.image_size as usize];
                self.file.seek(SeekFrom::Start(offset))?;
                self.file.read_exact(&mut gray)?;
                let mut rgb = Vec::with_capacity(gray.len() * 3);
                for value in gray {
                    rgb.extend_from_slice(&[value, value, value]);
                }
                rgb_image_from_parts(self.header.width, self.header.height, rgb)?
            }
            SeqPixelFormat::RawBgr => {
                let mut bgr = vec![0_u8; self.header.image_size as usize];
                self.file.seek(SeekFrom::Start(offset))?;
                self.file.read_exact(&mut bgr)?;
                let mut rgb = Vec::with_capacity(bgr.len());
                for pixel in bgr.chunks_exact(3) {
                    rgb.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
                }
                rgb_image_from_parts(self.header.width, self.header.height, rgb)?
            }
            SeqPixelFormat::JpegMonochrome | SeqPixelFormat::JpegBgr => {
                self.file.seek(SeekFrom::Start(offset))?;
                let mut size_bytes = [0_u8; 4];
                self.file.read_exact(&mut size_bytes)?;
                // The prefix counts itself; the table build validated >= 4.
                let payload_length = u32::from_le_bytes(size_bytes) as usize - 4;
                let mut payload = vec![0_u8; payload_length];
                self.file.read_exact(&mut payload)?;
                image::load_from_memory_with_format(&payload, ImageFormat::Jpeg)?.to_rgb8()
            }
        };

        self.cursor = index + 1;
        Ok(image)
    }

    /// Read the frame at the cursor, or `None` past the last frame.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`read_frame`](SeqReader::read_frame)
    /// for in-range reads.
    pub fn read_next(&mut self) -> Result<Option<RgbImage>, FramesiftError> {
        if self.cursor >= self.frame_count() {
            return Ok(None);
        }
        self.read_frame(self.cursor).map(Some)
    }
}

fn rgb_image_from_parts(
    width: u32,
    height: u32,
    buffer: Vec<u8>,
) -> Result<RgbImage, FramesiftError> {
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramesiftError::VideoDecode("seq frame buffer does not match header dimensions".to_string())
    })
}

/// Seek table for fixed-size raw blocks: a stride walk from the header end.
fn build_raw_seek_table(
    header: &SeqHeader,
    file_length: u64,
    path: &Path,
) -> Result<Vec<u64>, FramesiftError> {
    let block = u64::from(header.true_image_size);
    let frames = u64::from(header.frame_count);
    let required = HEADER_SIZE as u64 + block * frames;
    if file_length < required {
        return Err(FramesiftError::SeqHeader {
            path: path.to_path_buf(),
            reason: format!(
                "file length {file_length} too short for {frames} frames of {block} bytes"
            ),
        });
    }
    Ok((0..frames).map(|i| HEADER_SIZE as u64 + i * block).collect())
}

/// Seek table for JPEG blocks: chase the length prefixes front to back.
fn build_jpeg_seek_table(
    file: &mut File,
    header: &SeqHeader,
    file_length: u64,
    path: &Path,
) -> Result<Vec<u64>, FramesiftError> {
    let table_error = |reason: String| FramesiftError::SeqHeader {
        path: path.to_path_buf(),
        reason,
    };

    let mut table = Vec::with_capacity(header.frame_count as usize);
    let mut offset = HEADER_SIZE as u64;

    for index in 0..header.frame_count {
        if offset + 4 > file_length {
            return Err(table_error(format!("seek table truncated at frame {index}")));
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut size_bytes = [0_u8; 4];
        file.read_exact(&mut size_bytes)
            .map_err(|error| table_error(format!("seek table read failed at frame {index}: {error}")))?;
        let block_size = u64::from(u32::from_le_bytes(size_bytes));
        if block_size < 4 {
            return Err(table_error(format!(
                "frame {index} declares block size {block_size}, below the 4-byte prefix"
            )));
        }
        let next = offset + block_size + JPEG_FRAME_TRAILER;
        if next > file_length {
            return Err(table_error(format!(
                "frame {index} block overruns the file ({next} > {file_length})"
            )));
        }
        table.push(offset);
        offset = next;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{
        HEADER_SIZE, MAGIC, OFFSET_BIT_DEPTH, OFFSET_FPS, OFFSET_FRAME_COUNT, OFFSET_HEADER_SIZE,
        OFFSET_HEIGHT, OFFSET_IMAGE_FORMAT, OFFSET_IMAGE_SIZE, OFFSET_MAGIC,
        OFFSET_TRUE_IMAGE_SIZE, OFFSET_VERSION, OFFSET_WIDTH, SeqHeader, SeqPixelFormat,
    };
    use crate::error::FramesiftError;

    fn header_bytes(
        width: u32,
        height: u32,
        bit_depth: u32,
        image_size: u32,
        format_code: u32,
        frame_count: u32,
        true_image_size: u32,
        fps: f64,
    ) -> [u8; HEADER_SIZE] {
        let mut bytes = [0_u8; HEADER_SIZE];
        bytes[OFFSET_MAGIC..OFFSET_MAGIC + 4].copy_from_slice(&MAGIC.to_le_bytes());
        bytes[OFFSET_VERSION..OFFSET_VERSION + 4].copy_from_slice(&3_u32.to_le_bytes());
        bytes[OFFSET_HEADER_SIZE..OFFSET_HEADER_SIZE + 4]
            .copy_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        bytes[OFFSET_WIDTH..OFFSET_WIDTH + 4].copy_from_slice(&width.to_le_bytes());
        bytes[OFFSET_HEIGHT..OFFSET_HEIGHT + 4].copy_from_slice(&height.to_le_bytes());
        bytes[OFFSET_BIT_DEPTH..OFFSET_BIT_DEPTH + 4].copy_from_slice(&bit_depth.to_le_bytes());
        bytes[OFFSET_IMAGE_SIZE..OFFSET_IMAGE_SIZE + 4].copy_from_slice(&image_size.to_le_bytes());
        bytes[OFFSET_IMAGE_FORMAT..OFFSET_IMAGE_FORMAT + 4]
            .copy_from_slice(&format_code.to_le_bytes());
        bytes[OFFSET_FRAME_COUNT..OFFSET_FRAME_COUNT + 4]
            .copy_from_slice(&frame_count.to_le_bytes());
        bytes[OFFSET_TRUE_IMAGE_SIZE..OFFSET_TRUE_IMAGE_SIZE + 4]
            .copy_from_slice(&true_image_size.to_le_bytes());
        bytes[OFFSET_FPS..OFFSET_FPS + 8].copy_from_slice(&fps.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_a_well_formed_monochrome_header() {
        let bytes = header_bytes(8, 4, 8, 32, 100, 12, 40, 29.97);
        let header = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap();
        assert_eq!(header.width, 8);
        assert_eq!(header.height, 4);
        assert_eq!(header.format, SeqPixelFormat::RawMonochrome);
        assert_eq!(header.frame_count, 12);
        assert_eq!(header.true_image_size, 40);
        assert!((header.fps - 29.97).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header_bytes(8, 4, 8, 32, 100, 12, 40, 30.0);
        bytes[0] = 0;
        let error = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap_err();
        assert!(matches!(error, FramesiftError::SeqHeader { .. }));
        assert!(error.to_string().contains("bad magic"));
    }

    #[test]
    fn rejects_unknown_format_code() {
        let bytes = header_bytes(8, 4, 8, 32, 999, 12, 40, 30.0);
        let error = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap_err();
        assert!(error.to_string().contains("format code 999"));
    }

    #[test]
    fn rejects_image_size_inconsistent_with_dimensions() {
        let bytes = header_bytes(8, 4, 8, 999, 100, 12, 1024, 30.0);
        let error = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap_err();
        assert!(error.to_string().contains("does not match"));
    }

    #[test]
    fn rejects_bgr_with_wrong_bit_depth() {
        let bytes = header_bytes(8, 4, 8, 96, 101, 12, 96, 30.0);
        let error = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap_err();
        assert!(error.to_string().contains("bit depth"));
    }

    #[test]
    fn jpeg_headers_skip_the_size_consistency_check() {
        // Compressed sizes are nominal; an arbitrary value must parse.
        let bytes = header_bytes(8, 4, 8, 12_345, 102, 3, 0, 30.0);
        let header = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap();
        assert_eq!(header.format, SeqPixelFormat::JpegMonochrome);
        assert!(header.format.is_compressed());
    }

    #[test]
    fn rejects_blocks_smaller_than_their_pixels() {
        let bytes = header_bytes(8, 4, 8, 32, 100, 12, 16, 30.0);
        let error = SeqHeader::parse(&bytes, Path::new("clip.seq")).unwrap_err();
        assert!(error.to_string().contains("smaller than image size"));
    }
}
