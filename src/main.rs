//! geoenrich CLI.
//!
//! ```bash
//! # CSV next to the input: cowrie.csv
//! geoenrich cowrie.json
//!
//! # Append to a SQLite table as well, with an explicit dataset
//! geoenrich cowrie.json sql ./IP2LOCATION-LITE-DB9.CSV --database honeypot.sqlite
//!
//! # Four workers, keep going past bad records but keep them unenriched
//! geoenrich cowrie.json.gz --threads 4 --error-policy passthrough
//! ```

use clap::Parser;
use geoenrich::config::default_geo_dataset;
use geoenrich::{Config, EngineError, ErrorPolicy, ExecMode, SinkKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "geoenrich")]
#[command(about = "Repair a concatenated JSON event log and add IP geolocation columns")]
#[command(version)]
struct Cli {
    /// Log file of back-to-back JSON objects (optionally .gz/.zst)
    input: PathBuf,

    /// Output sink: csv or sql
    #[arg(default_value = "csv", value_parser = parse_sink)]
    sink: SinkKind,

    /// IP2Location-style CSV (defaults to IP2LOCATION-LITE-DB9.CSV beside the executable)
    geo_dataset: Option<PathBuf>,

    /// CSV output path [default: <input stem>.csv]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// SQLite database for the sql sink [default: <input stem>.sqlite]
    #[arg(long)]
    database: Option<PathBuf>,

    /// SQL table name [default: <input stem>_enriched_data]
    #[arg(long)]
    table: Option<String>,

    /// Worker threads [default: number of CPUs]
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// What to do with records that fail enrichment: drop, passthrough, fail
    #[arg(long, default_value = "drop", value_parser = parse_error_policy)]
    error_policy: ErrorPolicy,

    /// Keep <stem>.corrected.jsonl and <stem>.enhanced.jsonl
    #[arg(long)]
    keep_intermediate: bool,

    /// Keep the CSV after a successful sql append
    #[arg(long)]
    keep_csv: bool,

    /// Write the run summary as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Write per-record failures as JSON
    #[arg(long)]
    errors_json: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short = 'q', long)]
    quiet: bool,
}

fn parse_sink(s: &str) -> Result<SinkKind, String> {
    s.parse()
}

fn parse_error_policy(s: &str) -> Result<ErrorPolicy, String> {
    s.parse()
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.input)
            .with_sink(self.sink)
            .with_geo_dataset(self.geo_dataset.unwrap_or_else(default_geo_dataset))
            .with_mode(ExecMode::with_workers(self.threads))
            .with_error_policy(self.error_policy)
            .keep_intermediate(self.keep_intermediate)
            .keep_csv(self.keep_csv);
        if let Some(output) = self.output {
            config = config.with_output(output);
        }
        if let Some(database) = self.database {
            config = config.with_database(database);
        }
        if let Some(table) = self.table {
            config = config.with_table_name(table);
        }
        config.summary_json = self.summary_json;
        config.errors_json = self.errors_json;
        config
    }
}

fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the summary line
        .init();
}

fn print_usage(item: Option<(&Path, &str)>) {
    eprintln!();
    eprintln!("Usage: geoenrich <input_file> [csv|sql] [geo_dataset]");
    eprintln!(
        "    <input_file> should be a file of concatenated JSON documents that is to be converted."
    );
    if let Some((path, format)) = item {
        eprintln!(
            "    {} does not appear to be a valid {format} file.",
            path.display()
        );
    }
    eprintln!();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            print_usage(None);
            return ExitCode::FAILURE;
        }
        Err(e) => e.exit(),
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    init_logging(level);

    let config = cli.into_config();
    if !config.input.is_file() {
        print_usage(Some((config.input.as_path(), "JSON")));
        return ExitCode::FAILURE;
    }
    if !config.geo_dataset.is_file() {
        print_usage(Some((config.geo_dataset.as_path(), "CSV")));
        return ExitCode::FAILURE;
    }

    match geoenrich::run(&config) {
        Ok(summary) => {
            summary.print();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            if e.is_usage() {
                let (path, format) = match &e {
                    EngineError::Load(_) => (config.geo_dataset.as_path(), "CSV"),
                    _ => (config.input.as_path(), "JSON"),
                };
                print_usage(Some((path, format)));
            }
            ExitCode::FAILURE
        }
    }
}
