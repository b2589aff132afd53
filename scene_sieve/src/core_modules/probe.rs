// THEORY:
// The probe answers one question per file: what are its pixel dimensions? It reads
// only as much of the file as the codec needs to find the header, so even a tree
// of large photographs can be sized quickly. The format is sniffed from the file
// content rather than trusted from the extension, which means a mislabeled file
// still probes correctly and a non-image file is reported as a decode failure.

use crate::core_modules::policy::{ErrorPolicy, FileFailure, Stage};
use crate::core_modules::record::{DiscoveredFile, ImageRecord, ProbedSize};
use crate::error::{Result, SieveError};
use image::ImageReader;
use std::path::Path;

/// Reads the pixel dimensions of the image at `path` without decoding it.
pub fn probe_size(path: &Path) -> Result<ProbedSize> {
    let io_error = |source| SieveError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)?;
    let dimensions = reader.into_dimensions().map_err(|source| SieveError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ProbedSize::from(dimensions))
}

/// Probes every file in order, pairing each with its size.
pub fn probe_all(
    files: Vec<DiscoveredFile>,
    policy: ErrorPolicy,
) -> Result<(Vec<ImageRecord>, Vec<FileFailure>)> {
    let mut records = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    for file in files {
        match probe_size(&file.path) {
            Ok(size) => records.push(ImageRecord { file, size }),
            Err(error) => policy.absorb(error, &file.path, Stage::Probe, &mut failures)?,
        }
    }

    Ok((records, failures))
}
