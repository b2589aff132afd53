// THEORY:
// The `pipeline` module is the top-level API of the sieve. It strings the stages
// together in a single sequential pass over the input tree: walk, probe, select,
// export. Every stage consumes the typed output of the previous one, so the only
// configuration a caller needs is a `SieveConfig` and the only output is a
// `RunReport`.
//
// Running sequentially gives the strongest abort guarantee: under
// `ErrorPolicy::Abort`, no file after the failing one in traversal order is ever
// exported. `ParallelSieve` trades that guarantee for throughput.

use crate::core_modules::discovery::discover;
use crate::core_modules::export::{DestinationClaims, export_one, prepare_output_dir};
use crate::core_modules::policy::{FileFailure, Stage};
use crate::core_modules::probe::probe_all;
use crate::core_modules::record::{ImageRecord, OutputArtifact};
use crate::core_modules::selection::{Selection, select};
use crate::error::{Result, SieveError};
use std::fs;
use std::path::{Path, PathBuf};

pub use crate::core_modules::export::ExportSpec;
pub use crate::core_modules::policy::ErrorPolicy;
pub use crate::core_modules::selection::{AspectRatio, RatioMatch, SelectionCriteria};

/// Configuration for a sieve run.
#[derive(Debug, Clone)]
pub struct SieveConfig {
    pub input_root: PathBuf,
    pub output_dir: PathBuf,
    pub criteria: SelectionCriteria,
    pub export: ExportSpec,
    pub error_policy: ErrorPolicy,
    /// Create the output directory when it does not exist yet.
    pub create_output_dir: bool,
    /// Upper bound on concurrent probe/export tasks. Only `ParallelSieve` reads it.
    pub workers: usize,
}

impl SieveConfig {
    pub fn new(input_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_dir: output_dir.into(),
            criteria: SelectionCriteria::default(),
            export: ExportSpec::default(),
            error_policy: ErrorPolicy::default(),
            create_output_dir: false,
            workers: num_cpus::get(),
        }
    }

    /// The input root as an absolute, symlink-free path.
    pub(crate) fn canonical_root(&self) -> Result<PathBuf> {
        canonical_root(&self.input_root)
    }
}

pub(crate) fn canonical_root(root: &Path) -> Result<PathBuf> {
    fs::canonicalize(root).map_err(|source| SieveError::UnreadableRoot {
        path: root.to_path_buf(),
        source,
    })
}

/// Everything learned about the input tree before any file is written.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub discovered: usize,
    pub records: Vec<ImageRecord>,
    pub selection: Selection,
    pub failures: Vec<FileFailure>,
}

impl ScanSummary {
    pub fn selected_records(&self) -> impl Iterator<Item = &ImageRecord> + '_ {
        self.selection.iter().map(|index| &self.records[index])
    }
}

/// The outcome of a full run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub probed: usize,
    pub selected: usize,
    pub artifacts: Vec<OutputArtifact>,
    pub failures: Vec<FileFailure>,
}

impl RunReport {
    pub(crate) fn from_scan(scan: &ScanSummary) -> Self {
        Self {
            discovered: scan.discovered,
            probed: scan.records.len(),
            selected: scan.selection.len(),
            artifacts: Vec::with_capacity(scan.selection.len()),
            failures: scan.failures.clone(),
        }
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &FileFailure> + '_ {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}

/// Sequential walk, probe, select and export.
pub struct SievePipeline {
    config: SieveConfig,
}

impl SievePipeline {
    pub fn new(config: SieveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    /// Walks, probes and selects without writing anything.
    pub fn scan(&self) -> Result<ScanSummary> {
        let root = self.config.canonical_root()?;
        self.scan_root(&root)
    }

    fn scan_root(&self, root: &Path) -> Result<ScanSummary> {
        let policy = self.config.error_policy;

        // Stage 1: Directory Walk
        let (files, mut failures) = discover(root, policy)?;
        let discovered = files.len();

        // Stage 2: Size Probe
        let (records, probe_failures) = probe_all(files, policy)?;
        failures.extend(probe_failures);

        // Stage 3: Predicate Filter
        let selection = select(records.iter().map(|r| r.size), &self.config.criteria);
        tracing::info!(
            root = %root.display(),
            discovered,
            probed = records.len(),
            selected = selection.len(),
            "scan complete"
        );

        Ok(ScanSummary {
            discovered,
            records,
            selection,
            failures,
        })
    }

    pub fn run(&self) -> Result<RunReport> {
        let root = self.config.canonical_root()?;
        let scan = self.scan_root(&root)?;
        let mut report = RunReport::from_scan(&scan);

        // Stage 4: Transform-and-Export
        prepare_output_dir(&self.config.output_dir, self.config.create_output_dir)?;
        let mut claims = DestinationClaims::new();
        for record in scan.selected_records() {
            let exported = claims.claim(&root, &record.file).and_then(|()| {
                export_one(&root, &record.file, &self.config.output_dir, &self.config.export)
            });
            match exported {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(error) => self.config.error_policy.absorb(
                    error,
                    &record.file.path,
                    Stage::Export,
                    &mut report.failures,
                )?,
            }
        }

        tracing::info!(
            exported = report.artifacts.len(),
            failed = report.failures.len(),
            output = %self.config.output_dir.display(),
            "run complete"
        );
        Ok(report)
    }
}
