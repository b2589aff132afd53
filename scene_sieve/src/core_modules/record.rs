// THEORY:
// The records are the only data that flows between stages. A walk produces
// `DiscoveredFile`s, the probe pairs each one with its `ProbedSize` to form an
// `ImageRecord`, and export turns a selected record into an `OutputArtifact`.
// Because the size travels inside the same record as the path, a skipped file
// can never shift the alignment between names and dimensions.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A regular file found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// The directory that immediately contains the file.
    pub dir: PathBuf,
    /// Bare file name, extension included.
    pub name: OsString,
}

impl DiscoveredFile {
    pub fn new(path: PathBuf, dir: PathBuf, name: OsString) -> Self {
        Self { path, dir, name }
    }

    /// The containing directory relative to `root`, or `None` when the file
    /// does not live under it.
    pub fn relative_dir(&self, root: &Path) -> Option<&Path> {
        self.dir.strip_prefix(root).ok()
    }
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbedSize {
    pub width: u32,
    pub height: u32,
}

impl ProbedSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for ProbedSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub file: DiscoveredFile,
    pub size: ProbedSize,
}

/// One JPEG written by the export stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub width: u32,
    pub height: u32,
}
