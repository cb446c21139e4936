//! Meshflow command-line entry point.
//!
//! # Usage
//!
//! ```bash
//! # Reconstruct ./photos into ./out, downloading the camera database
//! meshflow ./photos ./out --max-threads 8
//!
//! # Use a local camera database and custom tool locations
//! meshflow ./photos ./out sensors.txt --sfm-bin-dir /opt/openMVG/bin --mvs-bin-dir /opt/openMVS/bin
//!
//! # Print the twelve tool invocations without running them
//! meshflow ./photos ./out --dry-run
//!
//! # Verify that every tool can be found
//! meshflow ./photos ./out --check
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use meshflow::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshflow")]
#[command(about = "Turn a directory of photographs into a textured mesh", long_about = None)]
struct Args {
    /// Directory containing the input photographs
    input: PathBuf,

    /// Directory receiving final.obj and final.mtl
    output: PathBuf,

    /// Camera sensor database; downloaded for the run when omitted
    camera_db: Option<PathBuf>,

    /// Thread count passed to densification and refinement
    #[arg(long, default_value = "1")]
    max_threads: usize,

    /// Working directory shared by the conversion and MVS stages
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Parent directory for the run's temporary directories
    #[arg(long)]
    temp_root: Option<PathBuf>,

    /// JSON file overriding tool parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Textured mesh format: obj, ply, glb or gltf
    #[arg(long)]
    export_type: Option<MeshFormat>,

    /// Per-stage timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Directory holding the SfM binaries
    #[arg(long)]
    sfm_bin_dir: Option<PathBuf>,

    /// Directory holding the MVS binaries
    #[arg(long)]
    mvs_bin_dir: Option<PathBuf>,

    /// Fail a stage whose expected output files are missing
    #[arg(long)]
    verify_artifacts: bool,

    /// Also publish colorized.ply and sfm_data.bin
    #[arg(long)]
    publish_sparse: bool,

    /// Print the planned invocations and exit
    #[arg(long)]
    dry_run: bool,

    /// Check that every tool can be found and exit
    #[arg(long)]
    check: bool,

    /// Write a JSON run report to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut parameters = match &args.params {
        Some(path) => ToolParameters::from_json_file(path)?,
        None => ToolParameters::default(),
    };
    if let Some(format) = args.export_type {
        parameters = parameters.with_texture_export_type(format);
    }

    let mut builder = PipelineConfig::builder()
        .input_dir(&args.input)
        .output_dir(&args.output)
        .max_threads(args.max_threads)
        .parameters(parameters)
        .locations(ToolLocations {
            sfm_bin_dir: args.sfm_bin_dir.clone(),
            mvs_bin_dir: args.mvs_bin_dir.clone(),
        })
        .verify_artifacts(args.verify_artifacts)
        .publish_sparse(args.publish_sparse);

    if let Some(db) = &args.camera_db {
        builder = builder.camera_database(db);
    }
    if let Some(dir) = &args.build_dir {
        builder = builder.build_dir(dir);
    }
    if let Some(root) = &args.temp_root {
        builder = builder.temp_root(root);
    }
    if let Some(seconds) = args.timeout {
        builder = builder.stage_timeout_seconds(seconds);
    }

    Ok(builder.build()?)
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = build_config(&args)?;

    if args.check {
        let missing = check_toolchain(&config);
        for tool in &missing {
            println!("missing: {} ({})", tool.program.display(), tool.stage);
        }
        if missing.is_empty() {
            println!("all tools found");
            return Ok(ExitCode::SUCCESS);
        }
        return Ok(ExitCode::FAILURE);
    }

    let runner = PipelineRunner::new(config, Capabilities::local())
        .with_event_sink(Arc::new(LoggingEventSink::debug()));

    if args.dry_run {
        for invocation in runner.plan() {
            println!("{invocation}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = Arc::new(CancellationToken::new());
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current stage");
            interrupt.cancel("interrupted");
        }
    });

    let outcome = runner.execute(&cancel).await;

    if let Some(path) = &args.report {
        outcome
            .report
            .write_json(path)
            .with_context(|| format!("failed to write run report to {}", path.display()))?;
    }

    match outcome.error {
        None => {
            for path in &outcome.report.published {
                info!("wrote {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(err) => Err(anyhow::Error::new(err).context("pipeline failed")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
