//! cliprank binary: rank and render the best short clips from one video.

mod exit_codes;
mod summary;

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cliprank_pipeline::{JobReport, Pipeline, PipelineConfig, PipelineError};

use exit_codes::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cliprank",
    about = "Rank a long-form video's best moments and render them as vertical clips",
    version
)]
struct Args {
    /// Source video URL to process
    #[arg(long, required_unless_present = "health_check")]
    url: Option<String>,

    /// Number of top clips to produce
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    k: u32,

    /// Output directory for rendered clips and the job log
    #[arg(long, default_value = "rendered_clips")]
    output_dir: PathBuf,

    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the health of both model endpoints and exit
    #[arg(long)]
    health_check: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            eprintln!("{}", e);
            std::process::exit(ExitCode::Misuse.as_i32());
        }
        Err(e) => {
            // --help / --version
            print!("{}", e);
            std::process::exit(ExitCode::Success.as_i32());
        }
    };

    let code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime")
        .block_on(run(args));

    std::process::exit(code.as_i32());
}

async fn run(args: Args) -> ExitCode {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");
    dotenvy::dotenv().ok();
    init_tracing(args.verbose);

    // Configuration: file overlay on defaults, CLI output dir on top.
    let mut config = match &args.config {
        Some(path) => match PipelineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::Misuse;
            }
        },
        None => PipelineConfig::default(),
    };
    config.output_dir = args.output_dir.clone();

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{}", e);
            return ExitCode::Misuse;
        }
    };

    if args.health_check {
        return run_health_check(&pipeline).await;
    }

    let health = pipeline.check_health().await;
    if !health.all_healthy() {
        error!("Model endpoints unhealthy, refusing to start job");
        summary::print_health(&pipeline, health);
        return ExitCode::Unhealthy;
    }

    let url = args.url.expect("clap enforces --url outside health-check");
    let k = args.k as usize;

    // Ctrl-C flips the cancel signal; the orchestrator aborts at the
    // next stage boundary and kills in-flight subprocesses.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling job");
            let _ = cancel_tx.send(true);
        }
    });

    match pipeline.run(&url, k, cancel_rx).await {
        Ok(report) => {
            summary::print_report(&report, k);
            exit_code_for(&report, k)
        }
        Err(PipelineError::Cancelled) => {
            info!("Job cancelled");
            ExitCode::PartialSuccess
        }
        Err(PipelineError::Config(e)) => {
            error!("Configuration error: {}", e);
            ExitCode::Misuse
        }
        Err(PipelineError::Health(e)) => {
            error!("Endpoint health failure: {}", e);
            ExitCode::Unhealthy
        }
        Err(e) => {
            error!("Job failed: {}", e);
            ExitCode::JobFailed
        }
    }
}

/// Map a finished job onto the exit-code contract.
///
/// A legitimately empty result (no candidate windows) is success. A job
/// that selected clips but rendered none failed outright; one that
/// rendered some, or fell short of K because grading degraded, is
/// partial.
fn exit_code_for(report: &JobReport, k: usize) -> ExitCode {
    if report.outcomes.is_empty() {
        if report.windows_considered > 0 && report.degraded_windows > 0 {
            return ExitCode::PartialSuccess;
        }
        return ExitCode::Success;
    }
    if report.produced() == 0 {
        return ExitCode::JobFailed;
    }
    if report.failed() > 0 || (report.produced() < k && report.degraded_windows > 0) {
        return ExitCode::PartialSuccess;
    }
    ExitCode::Success
}

async fn run_health_check(pipeline: &Pipeline) -> ExitCode {
    let health = pipeline.check_health().await;
    summary::print_health(pipeline, health);
    if health.all_healthy() {
        ExitCode::Success
    } else {
        ExitCode::Unhealthy
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "cliprank=debug" } else { "cliprank=info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
