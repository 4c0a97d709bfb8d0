use crate::error::CliError;
use connectors::file::metadata::{SampleMode, TableMetadata};
use engine_core::{
    metrics::StatsSnapshot,
    progress::{CostModel, format_elapsed},
};
use engine_runtime::execution::sample::SampleRow;
use model::core::utils::truncate_ellipsis;
use std::fmt::Write;

const SAMPLE_VALUE_WIDTH: usize = 50;
const ANALYSIS_WIDTH: usize = 120;
const PREVIEW_WIDTH: usize = 150;
const COLUMN_NAME_WIDTH: usize = 20;

pub fn print_sample(rows: &[SampleRow]) {
    println!("Testing on {} sample rows...\n", rows.len());

    for sample in rows {
        let number = sample.row_index + 1;
        match &sample.outcome {
            Err(err) => println!("Row {number}: ERROR - {err}"),
            Ok(values) => {
                let input: Vec<String> = sample
                    .row
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", truncate_ellipsis(v, SAMPLE_VALUE_WIDTH)))
                    .collect();
                let output: Vec<String> = values.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                println!("Row {number}:");
                println!("  Input: {{{}}}", input.join(", "));
                println!("  Output: {{{}}}", output.join(", "));
            }
        }
    }
}

pub fn print_final_stats(stats: &StatsSnapshot, cost: CostModel) {
    println!("\n=== FINAL STATISTICS ===");
    println!("Total rows processed: {}", stats.processed());
    println!("Successful: {}", stats.completed);
    println!("Failed: {}", stats.failed);
    println!("Total tokens used: {}", stats.cost_units);
    println!("Estimated cost: ${:.4}", cost.estimate(stats.cost_units));
    println!("Total time: {}", format_elapsed(stats.elapsed));
    if let Some(avg) = stats.average_per_success() {
        println!("Average time per row: {}ms", avg.as_millis());
    }
}

pub fn print_inspect_json(metadata: &TableMetadata) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(metadata)?;
    println!("{json}");
    Ok(())
}

pub fn print_inspect(metadata: &TableMetadata) {
    let separator = "=".repeat(80);

    println!("{separator}");
    println!("FILE: {}", metadata.name);
    println!("TYPE: {}", metadata.format);
    println!("{separator}\n");

    println!("SUMMARY STATISTICS:");
    println!("{:<16} {}", "Total Rows", metadata.total_rows);
    println!("{:<16} {}", "Total Columns", metadata.total_columns);
    println!(
        "{:<16} {} ({})\n",
        "Rows Displayed",
        metadata.rows.len(),
        metadata.sample_mode
    );

    println!("COLUMN ANALYSIS:");
    let headers = ["Idx", "Column Name", "Type", "Unique", "Nulls", "Sample Values"]
        .map(String::from)
        .to_vec();
    let rows: Vec<Vec<String>> = metadata
        .columns
        .iter()
        .map(|col| {
            let mut samples = col.samples.join(", ");
            if col.samples.len() < col.unique_count {
                samples.push_str("...");
            }
            vec![
                col.ordinal.to_string(),
                truncate_ellipsis(&col.name, COLUMN_NAME_WIDTH),
                col.data_type.to_string(),
                col.unique_count.to_string(),
                format!("{} ({})", col.null_count, percentage(col.null_count, col.total_count)),
                samples,
            ]
        })
        .collect();
    println!("{}\n", format_grid(&headers, &rows, ANALYSIS_WIDTH));

    match metadata.sample_mode {
        SampleMode::Random => println!("DATA PREVIEW (Random Sample):"),
        SampleMode::First => println!("DATA PREVIEW:"),
    }

    let mut headers = vec!["Row".to_string()];
    headers.extend(metadata.headers.iter().cloned());

    let mut rows = vec![
        std::iter::once(String::new())
            .chain(metadata.columns.iter().map(|c| format!("[{}]", c.data_type)))
            .collect::<Vec<_>>(),
    ];
    rows.extend(metadata.rows.iter().enumerate().map(|(i, row)| {
        std::iter::once((i + 1).to_string())
            .chain(row.iter().cloned())
            .collect()
    }));
    if metadata.total_rows > metadata.rows.len() {
        rows.push(vec!["...".to_string(); headers.len()]);
    }
    println!("{}", format_grid(&headers, &rows, PREVIEW_WIDTH));
    println!("\n[Showing {} of {} rows]\n", metadata.rows.len(), metadata.total_rows);

    println!("USAGE HINTS:");
    println!(
        "• Reference columns by index (0-{}) or by name",
        metadata.headers.len().saturating_sub(1)
    );
    println!("• To see more rows: enrich inspect {} --rows 50", metadata.name);
    match metadata.sample_mode {
        SampleMode::Random => {
            println!("• To see first rows instead: enrich inspect {} --sample first", metadata.name)
        }
        SampleMode::First => {
            println!("• To see a random sample: enrich inspect {} --sample random", metadata.name)
        }
    }
    println!("{separator}");
}

fn percentage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / total as f64)
}

/// Box-drawn grid; each column is capped at `max_width / columns` characters.
pub fn format_grid(headers: &[String], rows: &[Vec<String>], max_width: usize) -> String {
    if headers.is_empty() || rows.is_empty() {
        return String::new();
    }

    let cap = (max_width / headers.len()).max(4);
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    for width in &mut widths {
        *width = (*width).min(cap);
    }

    let border = |left: &str, mid: &str, right: &str| {
        let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}\n", parts.join(mid))
    };
    let line = |cells: &[String]| {
        let mut out = String::from("│");
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let _ = write!(out, " {:<width$} │", truncate_ellipsis(cell, *width), width = *width);
        }
        out.push('\n');
        out
    };

    let mut out = border("┌", "┬", "┐");
    out.push_str(&line(headers));
    out.push_str(&border("├", "┼", "┤"));
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&border("└", "┴", "┘"));
    out.pop();
    out
}
