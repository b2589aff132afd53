// THEORY:
// Export turns one selected record into one JPEG on disk. The source is decoded
// fresh from its path, resized to the exact target dimensions, normalized to 8-bit
// RGB and encoded. The resize does not preserve aspect ratio; that is only safe
// because the selection already restricted inputs to the target ratio.
//
// The encoded bytes are built in memory and written with a single call, so an
// existing file with the same name is simply replaced and a second run over the
// same selection produces identical files. Within one run, though, two sources can
// flatten to the same name (`a/b/x.png` and `a_b/x.png`); `DestinationClaims`
// hands each name out once so the second source is reported instead of silently
// replacing the first.

use crate::core_modules::naming::output_file_name;
use crate::core_modules::record::{DiscoveredFile, OutputArtifact};
use crate::error::{Result, SieveError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_WIDTH: u32 = 1024;
pub const DEFAULT_TARGET_HEIGHT: u32 = 768;
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// How each selected image is transformed and encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSpec {
    pub target_width: u32,
    pub target_height: u32,
    pub filter: FilterType,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for ExportSpec {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            target_height: DEFAULT_TARGET_HEIGHT,
            filter: FilterType::Nearest,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Makes sure `dir` exists and is a directory, creating it first when asked to.
pub fn prepare_output_dir(dir: &Path, create: bool) -> Result<()> {
    let unusable = |source| SieveError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    };
    if create {
        fs::create_dir_all(dir).map_err(unusable)?;
    }
    let metadata = fs::metadata(dir).map_err(unusable)?;
    if !metadata.is_dir() {
        return Err(unusable(io::Error::other("not a directory")));
    }
    Ok(())
}

/// Output names already handed out in the current run, mapped to the source that got them.
#[derive(Debug, Default)]
pub struct DestinationClaims {
    claimed: HashMap<OsString, PathBuf>,
}

impl DestinationClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the flattened name of `file`, failing if another source already holds it.
    pub fn claim(&mut self, root: &Path, file: &DiscoveredFile) -> Result<()> {
        match self.claimed.entry(output_file_name(root, file)?) {
            Entry::Occupied(taken) => Err(SieveError::DuplicateOutput {
                path: file.path.clone(),
                name: PathBuf::from(taken.key()),
                first: taken.get().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(file.path.clone());
                Ok(())
            }
        }
    }
}

/// Resizes to the exact target size and converts to three-channel 8-bit color.
pub fn transform(image: DynamicImage, spec: &ExportSpec) -> RgbImage {
    match image.resize_exact(spec.target_width, spec.target_height, spec.filter) {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))?;
    Ok(bytes)
}

/// Re-reads `file`, transforms it and writes it into `out_dir` under its flattened name.
pub fn export_one(
    root: &Path,
    file: &DiscoveredFile,
    out_dir: &Path,
    spec: &ExportSpec,
) -> Result<OutputArtifact> {
    let destination = out_dir.join(output_file_name(root, file)?);

    let io_error = |source| SieveError::Io {
        path: file.path.clone(),
        source,
    };
    let image = ImageReader::open(&file.path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?
        .decode()
        .map_err(|source| SieveError::Decode {
            path: file.path.clone(),
            source,
        })?;

    let rgb = transform(image, spec);
    let bytes = encode_jpeg(&rgb, spec.jpeg_quality).map_err(|source| SieveError::Encode {
        path: destination.clone(),
        source,
    })?;
    fs::write(&destination, bytes).map_err(|source| SieveError::Io {
        path: destination.clone(),
        source,
    })?;

    tracing::debug!(
        source = %file.path.display(),
        destination = %destination.display(),
        "exported"
    );
    Ok(OutputArtifact {
        source: file.path.clone(),
        destination,
        width: rgb.width(),
        height: rgb.height(),
    })
}
