// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod types;

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::archive::{archive_best_effort, ArchiveBundle, DirectoryArchiver};
use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile, Tool};
use crate::errors::Result;
use crate::exec::RealExecutor;
use crate::pipeline::{PipelineController, WorkFiles};
use crate::types::{Parameters, RawParameters};

pub use crate::pipeline::{run_pipeline, run_pipeline_with, RunReport};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - parameter validation
/// - one pipeline run with the real process executor
/// - best-effort archival of the result
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;

    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.run.timeout());
    let raw = RawParameters {
        threshold: Some(args.threshold.clone()),
        min_contour_size: Some(args.min_size.clone()),
        auto_threshold: args.auto_threshold,
    };
    let params = Parameters::parse(&raw, timeout)?;

    if args.dry_run {
        print_dry_run(&cfg, &args.work_dir, &params);
        return Ok(());
    }

    let executor = RealExecutor::new(cfg.run.grace_period());
    let mut controller =
        PipelineController::new(executor, cfg.tools.clone(), &args.work_dir, params);
    let report = controller.run().await?;

    if cfg.archive.enabled && !args.no_archive {
        let key = args
            .key
            .clone()
            .unwrap_or_else(|| default_archive_key(&args.work_dir));
        let bundle = ArchiveBundle::for_run(key, &report, &params);
        let archiver = DirectoryArchiver::new(&cfg.archive.root);
        if let Some(dir) = archive_best_effort(&archiver, &bundle) {
            info!(dir = %dir.display(), "archive saved");
        }
    } else {
        debug!("archival disabled for this run");
    }

    println!("{}", report.files.rendered().display());
    Ok(())
}

/// The working directory's own name, which is the request key upstream.
fn default_archive_key(work_dir: &Path) -> String {
    let dir = std::path::absolute(work_dir).unwrap_or_else(|_| work_dir.to_path_buf());
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string())
}

/// Simple dry-run output: parameters, tools and where files would go.
fn print_dry_run(cfg: &ConfigFile, work_dir: &Path, params: &Parameters) {
    let files = WorkFiles::new(work_dir);

    println!("scalepipe dry-run");
    println!("  work_dir = {}", files.root().display());
    println!("  input = {} (present: {})", files.input().display(), files.input().is_file());
    println!("  mode = {:?}", params.mode());
    println!("  threshold = {}", params.threshold());
    println!("  min_contour_size = {}", params.min_contour_size());
    println!("  timeout = {:?} per step", params.timeout());
    println!("  grace_period = {:?}", cfg.run.grace_period());
    println!();

    println!("tools ({}):", Tool::ALL.len());
    for tool in Tool::ALL {
        let path = cfg.tools.program_path(tool);
        println!("  - {tool}: {}", path.display());
        if let Some((key, value)) = cfg.tools.library_override(tool) {
            println!("      env: {key}={}", value.to_string_lossy());
        }
    }
    println!();

    if cfg.archive.enabled {
        println!("archive root: {}", cfg.archive.root.display());
    } else {
        println!("archive: disabled");
    }

    debug!("dry-run complete (no execution)");
}
