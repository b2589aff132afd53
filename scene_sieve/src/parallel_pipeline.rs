// THEORY:
// Probing and exporting are independent per file, and both are dominated by codec
// work. `ParallelSieve` fans those two stages out over a bounded pool of blocking
// tasks while keeping the rest of the pipeline identical to `SievePipeline`.
//
// Results are consumed in submission order (`buffered`, not `buffer_unordered`), so
// records, selection indices and artifacts line up exactly as in a sequential run.
// Under `ErrorPolicy::Abort` the first failure in traversal order is returned, but
// exports that were already in flight on other workers may still land on disk.

use crate::core_modules::discovery::discover;
use crate::core_modules::export::{DestinationClaims, export_one, prepare_output_dir};
use crate::core_modules::policy::Stage;
use crate::core_modules::probe::probe_size;
use crate::core_modules::record::{DiscoveredFile, ImageRecord};
use crate::core_modules::selection::select;
use crate::error::{Result, SieveError};
use crate::pipeline::{RunReport, ScanSummary, SieveConfig, canonical_root};
use futures::stream::{self, Stream, StreamExt};
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use tokio::task::{JoinError, spawn_blocking};

/// Runs blocking jobs with bounded concurrency and yields their results in order.
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn run_ordered<T, R, F>(
        &self,
        items: Vec<T>,
        job: F,
    ) -> impl Stream<Item = Result<R, JoinError>> + use<T, R, F>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let job = Arc::new(job);
        stream::iter(items)
            .map(move |item| {
                let job = Arc::clone(&job);
                spawn_blocking(move || job(item))
            })
            .buffered(self.size)
    }
}

pub struct ParallelSieve {
    config: SieveConfig,
    pool: WorkerPool,
}

impl ParallelSieve {
    pub fn new(config: SieveConfig) -> Self {
        let pool = WorkerPool::new(config.workers);
        Self { config, pool }
    }

    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    pub async fn scan(&self) -> Result<ScanSummary> {
        let root = self.resolve_root().await?;
        self.scan_root(root).await
    }

    async fn resolve_root(&self) -> Result<Arc<PathBuf>> {
        let input_root = self.config.input_root.clone();
        let root = spawn_blocking(move || canonical_root(&input_root)).await??;
        Ok(Arc::new(root))
    }

    async fn scan_root(&self, root: Arc<PathBuf>) -> Result<ScanSummary> {
        let policy = self.config.error_policy;

        // Stage 1: Directory Walk
        let walk_root = Arc::clone(&root);
        let (files, mut failures) = spawn_blocking(move || discover(&walk_root, policy)).await??;
        let discovered = files.len();

        // Stage 2: Size Probe
        let mut records = Vec::with_capacity(files.len());
        let mut probes = pin!(self.pool.run_ordered(files, |file: DiscoveredFile| {
            let size = probe_size(&file.path);
            (file, size)
        }));
        while let Some(joined) = probes.next().await {
            let (file, size) = joined?;
            match size {
                Ok(size) => records.push(ImageRecord { file, size }),
                Err(error) => policy.absorb(error, &file.path, Stage::Probe, &mut failures)?,
            }
        }

        // Stage 3: Predicate Filter
        let selection = select(records.iter().map(|r| r.size), &self.config.criteria);
        tracing::info!(
            root = %root.display(),
            discovered,
            probed = records.len(),
            selected = selection.len(),
            workers = self.pool.size(),
            "scan complete"
        );

        Ok(ScanSummary {
            discovered,
            records,
            selection,
            failures,
        })
    }

    pub async fn run(&self) -> Result<RunReport> {
        let root = self.resolve_root().await?;
        let scan = self.scan_root(Arc::clone(&root)).await?;
        let mut report = RunReport::from_scan(&scan);

        // Stage 4: Transform-and-Export
        let output_dir = self.config.output_dir.clone();
        let create = self.config.create_output_dir;
        spawn_blocking(move || prepare_output_dir(&output_dir, create)).await??;

        // Names are claimed in traversal order up front; a collision travels with its
        // file so it surfaces at the same position a sequential run would report it.
        let mut claims = DestinationClaims::new();
        let selected: Vec<(DiscoveredFile, Option<SieveError>)> = scan
            .selected_records()
            .map(|r| (r.file.clone(), claims.claim(&root, &r.file).err()))
            .collect();
        let output_dir = Arc::new(self.config.output_dir.clone());
        let spec = self.config.export;
        let mut exports = pin!(self.pool.run_ordered(
            selected,
            move |(file, collision): (DiscoveredFile, Option<SieveError>)| {
                let artifact = match collision {
                    Some(error) => Err(error),
                    None => export_one(&root, &file, &output_dir, &spec),
                };
                (file, artifact)
            },
        ));
        while let Some(joined) = exports.next().await {
            let (file, artifact) = joined?;
            match artifact {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(error) => self.config.error_policy.absorb(
                    error,
                    &file.path,
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
