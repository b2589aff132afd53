// THEORY:
// Every stage of the sieve reports failures through one error type so that the
// pipelines can decide, in a single place, whether a failure halts the run or is
// recorded and skipped. Each variant carries the path that triggered it, since a
// batch run over thousands of files is useless to debug without it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SieveError {
    #[error("input root {path} cannot be read")]
    UnreadableRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {path}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output directory {path} is not usable")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} flattens to {name}, which {first} already claimed")]
    DuplicateOutput {
        path: PathBuf,
        name: PathBuf,
        first: PathBuf,
    },

    #[error("{path} does not lie under the input root {root}")]
    RelativePath { path: PathBuf, root: PathBuf },

    #[error("worker task failed")]
    Join(#[from] tokio::task::JoinError),
}

impl SieveError {
    /// Errors that end the run no matter which `ErrorPolicy` is active.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SieveError::UnreadableRoot { .. }
                | SieveError::OutputDirectory { .. }
                | SieveError::Join(_)
        )
    }
}

pub type Result<T, E = SieveError> = std::result::Result<T, E>;
