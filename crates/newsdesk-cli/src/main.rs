mod output;

use std::future::Future;
use std::num::NonZeroUsize;

use clap::{Parser, Subcommand};
use newsdesk_rag::{PipelineOptions, RunController, RunOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsdesk")]
#[command(about = "Daily market newsletter generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch company news and market movers and store them as documents
    Ingest,
    /// Generate a newsletter from the stored documents
    Generate {
        /// Documents to retrieve per domain (overrides NEWSDESK_TOP_K)
        #[arg(long)]
        top_k: Option<NonZeroUsize>,

        /// Run the company and market branches one after the other
        #[arg(long)]
        sequential: bool,
    },
    /// Ingest, then generate
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("newsdesk: choose `ingest`, `generate` or `run` (see --help)");
        return Ok(());
    };

    let config = newsdesk_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    let decorated = config.env.decorated_logs();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(decorated)
        .with_target(decorated)
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    let pipeline = newsdesk_rag::build_pipeline(&config).await?;
    let controller = RunController::new();

    match command {
        Commands::Ingest => {
            let pipeline = pipeline.clone();
            let ingest = async move { pipeline.ingest().await };
            if let Some(report) = run_cancellable(&controller, ingest).await? {
                print!("{}", output::render_ingest(&report));
            }
        }
        Commands::Generate { top_k, sequential } => {
            let options = generate_options(pipeline.options(), top_k, sequential);
            let pipeline = pipeline.with_options(options);
            let generate = async move { pipeline.generate().await };
            if let Some(run) = run_cancellable(&controller, generate).await? {
                print!("{}", output::render_newsletter(&run));
            }
        }
        Commands::Run => {
            let pipeline = pipeline.clone();
            let run = async move { pipeline.run().await };
            if let Some(report) = run_cancellable(&controller, run).await? {
                print!("{}", output::render_ingest(&report.ingest));
                print!("{}", output::render_newsletter(&report.newsletter));
            }
        }
    }

    Ok(())
}

fn generate_options(
    base: &PipelineOptions,
    top_k: Option<NonZeroUsize>,
    sequential: bool,
) -> PipelineOptions {
    let mut options = base.clone();
    if let Some(k) = top_k {
        options.top_k = k.get();
    }
    if sequential {
        options.parallel_branches = false;
    }
    options
}

/// Runs `fut` through the controller until it ends or Ctrl-C cancels it.
///
/// Returns `Ok(None)` when the run was cancelled.
async fn run_cancellable<F>(
    controller: &RunController,
    fut: F,
) -> anyhow::Result<Option<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = controller.trigger(fut);
    let outcome = tokio::select! {
        outcome = handle.outcome() => outcome,
        () = ctrl_c() => {
            controller.cancel();
            RunOutcome::Cancelled
        }
    };

    match outcome {
        RunOutcome::Finished(value) => Ok(Some(value)),
        RunOutcome::Cancelled => {
            println!("Run cancelled.");
            Ok(None)
        }
        RunOutcome::Failed(reason) => Err(anyhow::anyhow!("run failed: {reason}")),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable; run cannot be cancelled");
        std::future::pending::<()>().await;
    }
    tracing::info!("received ctrl-c, cancelling run");
}
