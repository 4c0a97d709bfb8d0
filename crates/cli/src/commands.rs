use clap::Subcommand;
use connectors::file::{format::FormatChoice, metadata::SampleMode};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Add AI-generated columns to every row of a table
    Enrich {
        /// Input file (.csv, .tsv or .xlsx)
        input: PathBuf,

        #[arg(
            short,
            long,
            help = "New columns, comma separated, with optional type hints: \"country, risk:number\""
        )]
        columns: String,

        #[arg(short, long, help = "Instruction describing how to fill the new columns")]
        prompt: String,

        #[arg(short, long, help = "Output file (default: <input>_enriched.<ext>)")]
        output: Option<PathBuf>,

        #[arg(long, default_value = "same", help = "Output format: same, csv, tsv, jsonl or xlsx")]
        format: FormatChoice,

        #[arg(long, default_value_t = 5, help = "Rows to process in the dry run; 0 skips it")]
        sample: usize,

        #[arg(short, long, default_value_t = 10, help = "Concurrent requests")]
        workers: usize,

        #[arg(short, long, default_value_t = 100, help = "Checkpoint every N processed rows")]
        batch_size: usize,

        #[arg(long, help = "Field delimiter of the input file")]
        delimiter: Option<char>,

        #[arg(long, default_value_t = 1, help = "Excel sheet number (1-based)")]
        sheet: usize,

        #[arg(short, long, help = "Skip the confirmation prompt after the dry run")]
        yes: bool,

        #[arg(long, help = "Load environment variables from this file instead of ./.env")]
        env_file: Option<PathBuf>,
    },
    /// Profile the columns of a table and preview some rows
    Inspect {
        file: PathBuf,

        #[arg(short, long, default_value_t = 20, help = "Rows to preview")]
        rows: usize,

        #[arg(long, default_value = "first", help = "Which rows to preview: first or random")]
        sample: SampleMode,

        #[arg(long, help = "Field delimiter of the input file")]
        delimiter: Option<char>,

        #[arg(long, default_value_t = 1, help = "Excel sheet number (1-based)")]
        sheet: usize,

        #[arg(long, help = "Print the analysis as JSON")]
        json: bool,
    },
}
