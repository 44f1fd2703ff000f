use anyhow::Result;
use geoenrich::io::csv::read_table;
use geoenrich::io::jsonl::read_jsonl_vec;
use geoenrich::testing::*;
use geoenrich::{Config, EngineError, ErrorPolicy, ExecMode, Record, SinkKind, run};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn config(dir: &Path) -> Result<Config> {
    let input = write_sample_log(dir)?;
    let geo = write_range_csv(dir)?;
    Ok(Config::new(input)
        .with_geo_dataset(geo)
        .with_mode(ExecMode::Parallel { threads: Some(2) }))
}

#[test]
fn csv_sink_end_to_end() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config(tmp.path())?;
    let summary = run(&cfg)?;

    assert_eq!(summary.total, 5);
    assert_eq!(summary.enriched, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.rows_written, 5);
    assert_eq!(summary.threads, 2);
    assert_eq!(summary.output.as_deref(), Some(tmp.path().join("cowrie.csv").as_path()));
    assert_eq!(
        summary.summary_line(),
        "processed 5 records: 3 enriched, 0 skipped, 0 errors"
    );

    let table = read_table(&cfg.output)?;
    assert_table_rectangular(&table);
    assert_eq!(table.len(), 5);
    let row = table
        .rows
        .iter()
        .position(|r| r[table.column_index("src_ip").unwrap()] == "81.2.69.160")
        .unwrap();
    assert_eq!(table.cell(row, "src_ip_country"), Some("United Kingdom"));
    assert_eq!(table.cell(row, "dst_ip_city"), Some(""));

    assert!(!cfg.corrected_path().exists());
    assert!(!cfg.enhanced_path().exists());
    Ok(())
}

#[test]
fn intermediates_only_when_asked() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config(tmp.path())?.keep_intermediate(true);
    run(&cfg)?;

    let corrected: Vec<Value> = read_jsonl_vec(cfg.corrected_path())?;
    assert_eq!(corrected, sample_values());
    let enhanced: Vec<Record> = read_jsonl_vec(cfg.enhanced_path())?;
    assert_eq!(enhanced.len(), 5);
    assert_eq!(
        enhanced
            .iter()
            .filter(|r| r.contains_key("src_ip_code"))
            .count(),
        3
    );
    Ok(())
}

#[test]
fn summary_and_errors_json() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("events.json");
    fs::write(
        &input,
        r#"{"src_ip":"8.8.8.8","src_ip_code":"XX"}{"src_ip":"1.1.1.1"}"#,
    )?;
    let cfg = Config::new(&input)
        .with_geo_dataset(write_range_csv(tmp.path())?)
        .with_mode(ExecMode::Sequential)
        .with_error_policy(ErrorPolicy::Passthrough);
    let cfg = Config {
        summary_json: Some(tmp.path().join("summary.json")),
        errors_json: Some(tmp.path().join("errors.json")),
        ..cfg
    };
    let summary = run(&cfg)?;
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.rows_written, 2);

    let saved: Value = serde_json::from_str(&fs::read_to_string(tmp.path().join("summary.json"))?)?;
    assert_eq!(saved["total"], 2);
    assert_eq!(saved["sink"], "csv");
    let errors: Value = serde_json::from_str(&fs::read_to_string(tmp.path().join("errors.json"))?)?;
    assert_eq!(errors.as_array().map(Vec::len), Some(1));
    assert_eq!(errors[0]["index"], 0);
    Ok(())
}

#[test]
fn fail_policy_writes_nothing() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("events.json");
    fs::write(&input, r#"{"a":1}[1,2]"#)?;
    let cfg = Config::new(&input)
        .with_geo_dataset(write_range_csv(tmp.path())?)
        .with_error_policy(ErrorPolicy::Fail);
    assert!(matches!(
        run(&cfg).unwrap_err(),
        EngineError::Record { index: 1, .. }
    ));
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn missing_dataset_is_a_usage_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config(tmp.path())?.with_geo_dataset(tmp.path().join("nope.csv"));
    let err = run(&cfg).unwrap_err();
    assert!(matches!(err, EngineError::Load(_)));
    assert!(err.is_usage());
    assert!(!cfg.output.exists());
    Ok(())
}

#[test]
fn broken_input_is_a_usage_error() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("broken.json");
    fs::write(&input, r#"{"a":1}{"a""#)?;
    let cfg = Config::new(&input).with_geo_dataset(write_range_csv(tmp.path())?);
    let err = run(&cfg).unwrap_err();
    assert!(matches!(err, EngineError::Format(_)));
    assert!(err.is_usage());
    Ok(())
}

#[test]
fn zero_threads_fails_before_reading_input() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = Config::new(tmp.path().join("absent.json"))
        .with_geo_dataset(write_range_csv(tmp.path())?)
        .with_mode(ExecMode::Parallel { threads: Some(0) });
    let err = run(&cfg).unwrap_err();
    assert!(matches!(err, EngineError::Pool(_)));
    assert!(!err.is_usage());
    Ok(())
}

#[cfg(feature = "sql")]
mod sql_sink {
    use super::*;
    use geoenrich::SqliteSink;

    #[test]
    fn csv_is_removed_after_append() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let cfg = config(tmp.path())?.with_sink(SinkKind::Sql);
        let summary = run(&cfg)?;

        assert_eq!(summary.rows_appended, Some(5));
        assert_eq!(summary.output, None);
        assert!(!cfg.output.exists());
        assert_eq!(cfg.table_name, "cowrie_enriched_data");
        let sink = SqliteSink::open(tmp.path().join("cowrie.sqlite"))?;
        assert_eq!(sink.row_count(&cfg.table_name)?, 5);
        Ok(())
    }

    #[test]
    fn keep_csv_and_append_twice() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let cfg = config(tmp.path())?.with_sink(SinkKind::Sql).keep_csv(true);
        run(&cfg)?;
        let summary = run(&cfg)?;

        assert!(cfg.output.exists());
        assert_eq!(summary.output.as_deref(), Some(cfg.output.as_path()));
        let sink = SqliteSink::open(&cfg.database)?;
        assert_eq!(sink.row_count(&cfg.table_name)?, 10);
        Ok(())
    }

    #[test]
    fn sink_failure_keeps_the_csv() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let cfg = config(tmp.path())?
            .with_sink(SinkKind::Sql)
            .with_table_name("events");
        SqliteSink::open(&cfg.database)?
            .connection()
            .execute_batch("CREATE TABLE events (unrelated TEXT)")?;

        match run(&cfg).unwrap_err() {
            EngineError::Sink { kept, source } => {
                assert_eq!(kept, cfg.output);
                assert!(matches!(source, geoenrich::SinkError::SchemaMismatch { .. }));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(read_table(&cfg.output)?.len(), 5);
        Ok(())
    }
}
