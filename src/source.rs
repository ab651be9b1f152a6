//! Input video discovery.
//!
//! This module defines [`ContainerFormat`], the fixed allow-list of container
//! extensions the extractor will touch, and [`VideoSource`], a discovered
//! input file. A `VideoSource` is cheap: it holds the path and the format
//! tag, nothing else. Decoder handles are opened lazily via
//! [`VideoSource::open`], once per pass over the file, and dropped when the
//! pass ends.

use std::path::{Path, PathBuf};

use crate::decoder::FrameDecoder;
use crate::error::FramesiftError;

/// Container formats the extractor accepts.
///
/// Matching is **exact and case-sensitive**: `video.MP4` is treated as
/// unsupported and skipped with a warning, same as any unknown suffix. This
/// mirrors the scan behavior the tool has always had; broaden deliberately,
/// not by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// `.mp4`
    Mp4,
    /// `.avi`
    Avi,
    /// `.mov`
    Mov,
    /// `.mpeg`
    Mpeg,
}

impl ContainerFormat {
    /// Derive the format tag from a path's extension.
    ///
    /// Returns `None` for anything outside the allow-list, including
    /// uppercase variants and extension-less paths.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            "mp4" => Some(ContainerFormat::Mp4),
            "avi" => Some(ContainerFormat::Avi),
            "mov" => Some(ContainerFormat::Mov),
            "mpeg" => Some(ContainerFormat::Mpeg),
            _ => None,
        }
    }

    /// The extension string this tag was derived from.
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Avi => "avi",
            ContainerFormat::Mov => "mov",
            ContainerFormat::Mpeg => "mpeg",
        }
    }
}

/// A supported video file found in the input directory.
///
/// Construction via [`VideoSource::scan`] performs only the extension check;
/// whether the file actually decodes is discovered when a pass opens it.
#[derive(Debug, Clone)]
pub struct VideoSource {
    path: PathBuf,
    format: ContainerFormat,
}

impl VideoSource {
    /// Classify a directory entry, returning `None` for unsupported
    /// extensions.
    pub fn scan<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let format = ContainerFormat::from_path(path)?;
        Some(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    /// The path this source was discovered at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The extension-derived format tag.
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Open a fresh decoder handle for this source.
    ///
    /// Each pass over the file opens its own handle; dropping the returned
    /// [`FrameDecoder`] releases it.
    ///
    /// # Errors
    ///
    /// Returns [`FramesiftError::FileOpen`] if FFmpeg cannot open the file
    /// and [`FramesiftError::NoVideoStream`] if it contains no video.
    pub fn open(&self) -> Result<FrameDecoder, FramesiftError> {
        FrameDecoder::open(&self.path)
    }

    /// The file name without its extension, used as the output basename.
    ///
    /// Falls back to the full file name for paths with no stem (which cannot
    /// occur for scanned sources, since scanning requires an extension).
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .or_else(|| self.path.file_name())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Build the output path for a frame sampled at `position`.
    ///
    /// The layout is `<output_dir>/<stem>_<position:06>.jpg`, with the
    /// truncated integer position zero-padded to six digits. Positions are
    /// strictly increasing within one video, so names cannot collide.
    pub fn frame_output_path(&self, output_dir: &Path, position: u64) -> PathBuf {
        output_dir.join(format!("{}_{:06}.jpg", self.stem(), position))
    }
}
