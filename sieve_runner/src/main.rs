use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scene_sieve::{
    AspectRatio, ErrorPolicy, ExportSpec, FileFailure, FilterType, ParallelSieve, RatioMatch, RunReport,
    ScanSummary, SelectionCriteria, SieveConfig, SievePipeline,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Select 4:3 photographs from an image tree and export them as flat 1024x768 JPEGs.
#[derive(Debug, Parser)]
#[command(name = "sieve_runner", version)]
struct Args {
    /// Root of the image tree to scan.
    #[arg(env = "SIEVE_INPUT")]
    input_root: PathBuf,

    /// Directory the JPEGs are written to.
    #[arg(env = "SIEVE_OUTPUT")]
    output_dir: PathBuf,

    #[arg(long, default_value_t = 1024, env = "SIEVE_MIN_WIDTH")]
    min_width: u32,

    #[arg(long, default_value_t = 768, env = "SIEVE_MIN_HEIGHT")]
    min_height: u32,

    /// Required width:height ratio.
    #[arg(long, default_value = "4:3", env = "SIEVE_RATIO")]
    ratio: AspectRatio,

    #[arg(long, value_enum, default_value_t = RatioMode::Exact)]
    ratio_mode: RatioMode,

    /// Allowed deviation of width/height when --ratio-mode=tolerance.
    #[arg(long, default_value_t = 1e-9, value_parser = parse_tolerance)]
    tolerance: f64,

    /// Output size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1024x768", value_parser = parse_dimensions)]
    target: (u32, u32),

    #[arg(long, default_value_t = 75, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    #[arg(long, value_enum, default_value_t = Filter::Nearest)]
    filter: Filter,

    /// What to do when a single file cannot be read, decoded or written: abort or skip.
    #[arg(long, default_value = "abort", env = "SIEVE_ON_ERROR")]
    on_error: ErrorPolicy,

    #[arg(long)]
    create_output_dir: bool,

    /// Probe and export on a pool of worker threads.
    #[arg(long)]
    parallel: bool,

    /// Pool size for --parallel; defaults to the number of CPUs.
    #[arg(long, env = "SIEVE_WORKERS")]
    workers: Option<usize>,

    /// Report how many images match without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RatioMode {
    Exact,
    Tolerance,
    Rational,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Filter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Filter> for FilterType {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => FilterType::Nearest,
            Filter::Triangle => FilterType::Triangle,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("`{s}` must look like WIDTHxHEIGHT"))?;
    let w: u32 = w.parse().map_err(|e| format!("width: {e}"))?;
    let h: u32 = h.parse().map_err(|e| format!("height: {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("`{s}` must have non-zero dimensions"));
    }
    Ok((w, h))
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tolerance: f64 = s.parse().map_err(|e| format!("tolerance: {e}"))?;
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(format!("tolerance `{s}` must be a finite, non-negative number"));
    }
    Ok(tolerance)
}

impl Args {
    fn into_config(self) -> SieveConfig {
        let ratio_match = match self.ratio_mode {
            RatioMode::Exact => RatioMatch::Exact,
            RatioMode::Tolerance => RatioMatch::Tolerance(self.tolerance),
            RatioMode::Rational => RatioMatch::Rational,
        };
        let mut config = SieveConfig::new(self.input_root, self.output_dir);
        config.criteria = SelectionCriteria {
            min_width: self.min_width,
            min_height: self.min_height,
            ratio: self.ratio,
            ratio_match,
        };
        config.export = ExportSpec {
            target_width: self.target.0,
            target_height: self.target.1,
            filter: self.filter.into(),
            jpeg_quality: self.quality,
        };
        config.error_policy = self.on_error;
        config.create_output_dir = self.create_output_dir;
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Logging ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // --- 2. Argument Parsing & Setup ---
    let args = Args::parse();
    let parallel = args.parallel;
    let dry_run = args.dry_run;
    let config = args.into_config();
    tracing::debug!(?config, parallel, dry_run, "starting");
    let input_root = config.input_root.clone();

    // --- 3. Scan Only ---
    if dry_run {
        let scan: ScanSummary = if parallel {
            ParallelSieve::new(config).scan().await
        } else {
            tokio::task::spawn_blocking(move || SievePipeline::new(config).scan()).await?
        }
        .with_context(|| format!("scanning {}", input_root.display()))?;

        println!("{}", scan.selection.len());
        print_failures(&scan.failures);
        return Ok(());
    }

    // --- 4. Full Run ---
    let report: RunReport = if parallel {
        ParallelSieve::new(config).run().await
    } else {
        tokio::task::spawn_blocking(move || SievePipeline::new(config).run()).await?
    }
    .with_context(|| format!("processing {}", input_root.display()))?;

    println!("{}", report.selected);
    println!(
        "exported {} of {} selected ({} discovered, {} probed, {} failed)",
        report.artifacts.len(),
        report.selected,
        report.discovered,
        report.probed,
        report.failures.len()
    );
    print_failures(&report.failures);
    Ok(())
}

fn print_failures(failures: &[FileFailure]) {
    for failure in failures {
        eprintln!("{} [{}]: {}", failure.path.display(), failure.stage, failure.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_dimensions() {
        assert_eq!(parse_dimensions("1024x768"), Ok((1024, 768)));
        assert_eq!(parse_dimensions("640X480"), Ok((640, 480)));
        assert!(parse_dimensions("1024").is_err());
        assert!(parse_dimensions("0x768").is_err());
    }

    #[test]
    fn tolerance_must_be_finite_and_non_negative() {
        assert_eq!(parse_tolerance("0.002"), Ok(0.002));
        assert_eq!(parse_tolerance("0"), Ok(0.0));
        assert!(parse_tolerance("-0.1").is_err());
        assert!(parse_tolerance("NaN").is_err());
        assert!(parse_tolerance("inf").is_err());
        assert!(parse_tolerance("wide").is_err());
        assert!(Args::try_parse_from(["sieve_runner", "in", "out", "--tolerance=-1"]).is_err());
    }

    #[test]
    fn defaults_match_the_four_thirds_sieve() {
        let args = Args::try_parse_from(["sieve_runner", "in", "out"]).unwrap();

        let config = args.into_config();

        assert_eq!(config.criteria, SelectionCriteria::default());
        assert_eq!(config.export, ExportSpec::default());
        assert_eq!(config.error_policy, ErrorPolicy::Abort);
        assert!(!config.create_output_dir);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "sieve_runner",
            "in",
            "out",
            "--ratio",
            "16:9",
            "--ratio-mode",
            "tolerance",
            "--tolerance",
            "0.01",
            "--target",
            "1920x1080",
            "--filter",
            "lanczos3",
            "--on-error",
            "skip",
            "--workers",
            "2",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.criteria.ratio, AspectRatio { num: 16, den: 9 });
        assert_eq!(config.criteria.ratio_match, RatioMatch::Tolerance(0.01));
        assert_eq!((config.export.target_width, config.export.target_height), (1920, 1080));
        assert_eq!(config.export.filter, FilterType::Lanczos3);
        assert_eq!(config.error_policy, ErrorPolicy::SkipAndLog);
        assert_eq!(config.workers, 2);
    }
}
