// THEORY:
// This file is the entry point for the `scene_sieve` library crate. It exposes the
// two ways of running the sieve, `SievePipeline` (sequential) and `ParallelSieve`
// (bounded concurrent probe and export), together with their configuration and
// report types. The individual stages live in `core_modules` and stay public so
// that callers can reuse one stage on its own, for example probing sizes without
// exporting anything.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::policy::{FileFailure, Stage};
pub use core_modules::record::{DiscoveredFile, ImageRecord, OutputArtifact, ProbedSize};
pub use error::SieveError;
pub use image::imageops::FilterType;
pub use parallel_pipeline::ParallelSieve;
pub use pipeline::{
    AspectRatio, ErrorPolicy, ExportSpec, RatioMatch, RunReport, ScanSummary, SelectionCriteria,
    SieveConfig, SievePipeline,
};
