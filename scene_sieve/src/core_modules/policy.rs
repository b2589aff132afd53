// THEORY:
// A single bad file in a tree of tens of thousands should not have to end a run,
// but silently dropping data is just as dangerous for a dataset build. The
// `ErrorPolicy` makes that trade explicit. Under `Abort` the first failure halts
// the run; under `SkipAndLog` the failure is logged, recorded as a `FileFailure`
// and the stage moves on. Failures that make the whole run meaningless (see
// `SieveError::is_fatal`) halt regardless of the policy.

use crate::error::{Result, SieveError};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Halt the run at the first failing file.
    #[default]
    Abort,
    /// Log the failure, record it in the report and continue with the next file.
    SkipAndLog,
}

impl ErrorPolicy {
    /// Either propagates `error` or records it in `failures`, depending on the policy.
    pub(crate) fn absorb(
        self,
        error: SieveError,
        path: &Path,
        stage: Stage,
        failures: &mut Vec<FileFailure>,
    ) -> Result<()> {
        if self == ErrorPolicy::Abort || error.is_fatal() {
            return Err(error);
        }
        let failure = FileFailure {
            path: path.to_path_buf(),
            stage,
            message: error_chain(&error),
        };
        tracing::warn!(path = %failure.path.display(), %stage, "skipping: {}", failure.message);
        failures.push(failure);
        Ok(())
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ErrorPolicy::Abort),
            "skip" | "skip-and-log" => Ok(ErrorPolicy::SkipAndLog),
            other => Err(format!("unknown error policy `{other}` (expected abort or skip)")),
        }
    }
}

/// The pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Walk,
    Probe,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Walk => "walk",
            Stage::Probe => "probe",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub stage: Stage,
    pub message: String,
}

fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
