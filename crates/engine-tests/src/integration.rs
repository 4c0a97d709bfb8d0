#[cfg(test)]
mod tests {
    use crate::utils::{CancelAfter, ScriptedTransform, columns, expected_value, job, numbered_table};
    use connectors::file::{
        TableLoader, TableWriter,
        csv::{destination::CsvDestination, source::CsvSource},
        format::{DataFormat, FormatChoice, SourceOptions, loader_for, resolve_output},
        xlsx::{XlsxDestination, XlsxSource},
    };
    use engine_core::{
        checkpoint::{CheckpointStatus, CheckpointWriter},
        progress::NullProgress,
    };
    use engine_processing::config::PipelineConfig;
    use engine_runtime::{
        error::PipelineError,
        execution::executor::{RunOutcome, run},
    };
    use model::{
        core::column::ColumnSpec,
        records::{output::OutputTable, table::Table},
    };
    use std::{collections::HashMap, fs, sync::Arc};
    use tempfile::tempdir;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn write_input(dir: &std::path::Path, rows: usize) -> std::path::PathBuf {
        let path = dir.join("companies.csv");
        let table = numbered_table(rows);
        let values: Vec<Vec<String>> = table.rows().iter().map(|r| r.values().to_vec()).collect();
        CsvDestination::default()
            .write(&path, table.headers(), &values)
            .unwrap();
        path
    }

    // Scenario: CSV in, CSV out, run to completion and finalize.
    // Expected Outcome: the enriched file sits next to the input with the new
    // columns appended and the working file removed.
    #[traced_test]
    #[tokio::test]
    async fn csv_round_trip_through_the_pipeline() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), 25);

        let table = loader_for(&input, SourceOptions::default()).unwrap().load(&input).unwrap();
        let (output, format) = resolve_output(&input, None, FormatChoice::Same);
        assert_eq!(output, dir.path().join("companies_enriched.csv"));

        let job = job(
            table,
            columns(&["country"]),
            Arc::new(ScriptedTransform::new(2)),
            format.writer(),
            output.clone(),
            PipelineConfig::default().with_workers(4).with_batch_size(10),
        );
        let report = run(job, Box::new(NullProgress), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);

        let checkpoint = report.checkpoint_path().to_path_buf();
        assert!(checkpoint.exists());
        let saved = report.finalize().unwrap();
        assert_eq!(saved, output);
        assert!(!checkpoint.exists());

        let enriched = CsvSource::default().load(&output).unwrap();
        assert_eq!(enriched.headers(), ["id", "name", "country"].map(String::from));
        assert_eq!(enriched.len(), 25);
        for (idx, row) in enriched.rows().iter().enumerate() {
            assert_eq!(row.get("id"), Some(idx.to_string().as_str()));
            assert_eq!(row.get("country"), Some(expected_value("country", idx).as_str()));
        }

        assert!(logs_contain("Enrichment run completed"));
    }

    // Scenario: Excel in, Excel out.
    // Expected Outcome: the enriched workbook keeps the input rows in order
    // with the new column appended on its single sheet.
    #[tokio::test]
    async fn xlsx_round_trip_through_the_pipeline() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("companies.xlsx");
        let table = numbered_table(12);
        let values: Vec<Vec<String>> = table.rows().iter().map(|r| r.values().to_vec()).collect();
        XlsxDestination.write(&input, table.headers(), &values).unwrap();

        let options = SourceOptions::default();
        let table = loader_for(&input, options).unwrap().load(&input).unwrap();
        let (output, format) = resolve_output(&input, None, FormatChoice::Same);
        assert_eq!(output, dir.path().join("companies_enriched.xlsx"));
        assert_eq!(format, DataFormat::Xlsx);

        let job = job(
            table,
            columns(&["country"]),
            Arc::new(ScriptedTransform::new(1)),
            format.writer(),
            output.clone(),
            PipelineConfig::default().with_workers(3).with_batch_size(5),
        );
        let report = run(job, Box::new(NullProgress), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        report.finalize().unwrap();

        let enriched = XlsxSource::default().load(&output).unwrap();
        assert_eq!(enriched.headers(), ["id", "name", "country"].map(String::from));
        assert_eq!(enriched.len(), 12);
        for (idx, row) in enriched.rows().iter().enumerate() {
            assert_eq!(row.get("id"), Some(idx.to_string().as_str()));
            assert_eq!(row.get("country"), Some(expected_value("country", idx).as_str()));
        }
    }

    // Scenario: a run on disk is cancelled part way.
    // Expected Outcome: the working file holds the partial table, no final
    // artifact is created and finalizing is refused.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_run_leaves_partial_checkpoint_on_disk() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("partial.csv");
        let cancel = CancellationToken::new();
        let (progress, _) = CancelAfter::new(10, cancel.clone());

        let job = job(
            numbered_table(300),
            columns(&["country"]),
            Arc::new(ScriptedTransform::new(1).with_latency(1, 2, 11)),
            Arc::new(CsvDestination::default()),
            output.clone(),
            PipelineConfig::default().with_workers(2).with_batch_size(50),
        );
        let report = run(job, Box::new(progress), cancel).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        let applied = report.stats.processed() as usize;

        let partial = CsvSource::default().load(report.checkpoint_path()).unwrap();
        assert_eq!(partial.len(), 300);
        let filled = partial
            .rows()
            .iter()
            .filter(|r| r.get("country").is_some_and(|v| !v.is_empty()))
            .count();
        assert_eq!(filled, applied);

        assert!(matches!(report.finalize(), Err(PipelineError::NotCompleted)));
        assert!(!output.exists());
    }

    // Scenario: two checkpoints with no result applied in between.
    // Expected Outcome: the second one is skipped and the file bytes are
    // identical; a fresh writer over the same table produces the same bytes.
    #[test]
    fn repeated_checkpoints_are_byte_identical() {
        let dir = tempdir().unwrap();
        let input = Table::new(
            vec!["city".into()],
            vec![vec!["Lyon".into()], vec!["Porto, PT".into()]],
        );
        let mut table = OutputTable::new(&input, &[ColumnSpec::text("country")]);
        table
            .apply(0, &HashMap::from([("country".to_string(), "France".to_string())]))
            .unwrap();

        let writer: Arc<dyn TableWriter> = Arc::new(CsvDestination::default());
        let mut checkpoints = CheckpointWriter::new(writer.clone(), dir.path().join("a.csv"));

        assert_eq!(checkpoints.checkpoint(&table).unwrap(), CheckpointStatus::Written);
        let first = fs::read(checkpoints.working_path()).unwrap();
        assert_eq!(checkpoints.checkpoint(&table).unwrap(), CheckpointStatus::Unchanged);
        let second = fs::read(checkpoints.working_path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(checkpoints.writes(), 1);

        let mut other = CheckpointWriter::new(writer, dir.path().join("b.csv"));
        other.checkpoint(&table).unwrap();
        assert_eq!(fs::read(other.working_path()).unwrap(), first);

        assert_eq!(
            String::from_utf8(first).unwrap(),
            "city,country\nLyon,France\n\"Porto, PT\",\n"
        );
    }
}
