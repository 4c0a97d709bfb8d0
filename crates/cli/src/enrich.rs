use crate::{
    env::EnvManager,
    error::CliError,
    output,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use connectors::file::format::{FormatChoice, SourceOptions, loader_for, resolve_output};
use engine_core::progress::{ConsoleProgress, CostModel};
use engine_processing::{
    config::PipelineConfig,
    transform::{RowTransform, llm::ChatCompletionTransform},
};
use engine_runtime::execution::{
    executor::{self, EnrichmentJob, RunOutcome},
    sample::run_sample,
};
use model::core::column::{ensure_new_columns, parse_column_specs};
use std::{io::Write, path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct EnrichArgs {
    pub input: PathBuf,
    pub columns: String,
    pub prompt: String,
    pub output: Option<PathBuf>,
    pub format: FormatChoice,
    pub sample: usize,
    pub workers: usize,
    pub batch_size: usize,
    pub source: SourceOptions,
    pub yes: bool,
    pub env_file: Option<PathBuf>,
}

pub async fn run(args: EnrichArgs) -> Result<ExitCode, CliError> {
    let mut env = EnvManager::new();
    env.load(args.env_file.as_deref())?;
    let llm = env.llm_config()?;

    let columns = parse_column_specs(&args.columns)?;

    println!("Loading {}...", args.input.display());
    let table = loader_for(&args.input, args.source)?.load(&args.input)?;
    println!("Loaded {} rows with {} columns", table.len(), table.width());
    ensure_new_columns(&columns, table.headers())?;

    let (output_path, format) = resolve_output(&args.input, args.output.as_deref(), args.format);
    info!(output = %output_path.display(), %format, "Resolved output");

    let transform: Arc<dyn RowTransform> = Arc::new(ChatCompletionTransform::new(llm)?);

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();
    let cancel = shutdown.cancel_token();

    if args.sample > 0 {
        println!("\n=== TESTING ON SAMPLE ===");
        let rows = run_sample(
            transform.as_ref(),
            &table,
            &columns,
            &args.prompt,
            args.sample,
            &cancel,
        )
        .await;
        output::print_sample(&rows);

        if shutdown.is_shutdown_requested() {
            println!("Processing cancelled.");
            return Ok(ExitCode::ShutdownRequested);
        }

        if !args.yes && !confirm("\nProceed with full processing? (y/n): ", &cancel).await? {
            println!("Processing cancelled.");
            return Ok(if shutdown.is_shutdown_requested() {
                ExitCode::ShutdownRequested
            } else {
                ExitCode::Success
            });
        }
    }

    println!("\n=== PROCESSING FULL DATASET ===");
    let config = PipelineConfig::default()
        .with_workers(args.workers)
        .with_batch_size(args.batch_size);
    let cost = CostModel::default();

    let job = EnrichmentJob {
        table: Arc::new(table),
        columns,
        instruction: args.prompt,
        transform,
        writer: format.writer(),
        output: output_path,
        config,
    };
    let report = executor::run(job, Box::new(ConsoleProgress::new(cost)), cancel).await?;

    output::print_final_stats(&report.stats, cost);

    match report.outcome {
        RunOutcome::Completed => {
            println!("\nSaving final output...");
            let saved = report.finalize()?;
            println!("\nOutput saved to: {}", saved.display());
            Ok(ExitCode::Success)
        }
        RunOutcome::Cancelled => {
            println!(
                "\nInterrupted. Partial results saved to: {}",
                report.checkpoint_path().display()
            );
            println!(
                "Rows not yet processed keep empty values; re-run on the input to finish {}.",
                report.output_path().display()
            );
            Ok(ExitCode::ShutdownRequested)
        }
    }
}

/// Reads one answer from stdin; anything but `y` declines. A shutdown
/// signal while waiting also declines.
async fn confirm(question: &str, cancel: &CancellationToken) -> Result<bool, CliError> {
    print!("{question}");
    std::io::stdout().flush()?;

    let read = tokio::task::spawn_blocking(|| {
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer).map(|_| answer)
    });

    tokio::select! {
        _ = cancel.cancelled() => Ok(false),
        answer = read => {
            let answer = answer.map_err(|e| CliError::Io(std::io::Error::other(e)))??;
            Ok(is_yes(&answer))
        }
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
