use crate::{commands::Commands, enrich::EnrichArgs, error::CliError, shutdown::ExitCode};
use clap::Parser;
use connectors::file::format::SourceOptions;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod enrich;
mod env;
mod error;
mod inspect;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "enrich",
    version,
    about = "Enrich tabular data with AI-generated columns"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries reports and tables.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Commands::Enrich {
            input,
            columns,
            prompt,
            output,
            format,
            sample,
            workers,
            batch_size,
            delimiter,
            sheet,
            yes,
            env_file,
        } => {
            enrich::run(EnrichArgs {
                input,
                columns,
                prompt,
                output,
                format,
                sample,
                workers,
                batch_size,
                source: SourceOptions { delimiter, sheet },
                yes,
                env_file,
            })
            .await
        }
        Commands::Inspect {
            file,
            rows,
            sample,
            delimiter,
            sheet,
            json,
        } => {
            inspect::run(&file, rows, sample, SourceOptions { delimiter, sheet }, json)?;
            Ok(ExitCode::Success)
        }
    }
}
