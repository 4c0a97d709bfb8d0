use crate::{error::CliError, output};
use connectors::file::{
    format::{DataFormat, SourceOptions, loader_for},
    metadata::{SampleMode, TableMetadata},
};
use std::path::Path;

pub fn run(
    file: &Path,
    rows: usize,
    sample: SampleMode,
    source: SourceOptions,
    json: bool,
) -> Result<(), CliError> {
    let table = loader_for(file, source)?.load(file)?;
    let format = DataFormat::from_path(file)
        .map(|f| f.to_string())
        .unwrap_or_else(|| "Delimited text".to_string());

    let metadata = TableMetadata::build(
        &file.display().to_string(),
        &format,
        &table,
        rows,
        sample,
        &mut rand::thread_rng(),
    );

    if json {
        output::print_inspect_json(&metadata)
    } else {
        output::print_inspect(&metadata);
        Ok(())
    }
}
