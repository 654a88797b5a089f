//! aura-runner: headless batch runner for the A.U.R.A churn engine.
//!
//! Usage:
//!   aura-runner --input data/sample_customers.csv
//!   aura-runner --sample 200 --seed 7 --strict --pretty
//!   aura-runner --input customers.json --config data/engine_config.json --chunk-size 500
//!   aura-runner --ipc-mode

mod loader;

use anyhow::{bail, Result};
use aura_core::{
    sample::SampleGenerator, BatchOutcome, BatchProcessor, BatchSummary, Confidence,
    CustomerRecord, EngineConfig, EngineError, FactorName, Priority, RawCustomerRecord, RiskLevel,
    ScoredCustomer, Segment, SkippedRecord,
};
use clap::Parser;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "aura-runner", version, about = "Score customers for churn risk and recommend retention actions")]
struct Args {
    /// CSV or JSON file of customer rows.
    #[arg(long, conflicts_with = "sample")]
    input: Option<PathBuf>,

    /// Generate this many synthetic customers instead of reading a file.
    #[arg(long)]
    sample: Option<usize>,

    /// Seed for --sample.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Engine config JSON file.
    #[arg(long, conflicts_with = "strict")]
    config: Option<String>,

    /// Use the built-in strict scoring table.
    #[arg(long)]
    strict: bool,

    /// Process in chunks of this many rows and merge the summaries.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Read JSON-lines commands on stdin instead of running one batch.
    #[arg(long)]
    ipc_mode: bool,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Score {
        record: serde_json::Map<String, serde_json::Value>,
    },
    Batch {
        records: Vec<serde_json::Value>,
    },
    Summary,
    Quit,
}

/// One flattened line of the results table.
#[derive(Debug, Serialize)]
struct ResultRow {
    customer_id:               String,
    name:                      Option<String>,
    segment:                   Option<Segment>,
    risk_score:                f64,
    risk_level:                RiskLevel,
    confidence:                Confidence,
    dominant_factor:           Option<FactorName>,
    strategy:                  String,
    priority:                  Priority,
    timeline:                  String,
    recommended_actions_count: usize,
    actions:                   Vec<String>,
}

impl From<&ScoredCustomer> for ResultRow {
    fn from(scored: &ScoredCustomer) -> Self {
        let rec = &scored.recommendation;
        Self {
            customer_id:               scored.record.customer_id.clone(),
            name:                      scored.record.name.clone(),
            segment:                   scored.record.segment,
            risk_score:                scored.risk.composite_score,
            risk_level:                scored.risk.risk_level,
            confidence:                scored.risk.confidence,
            dominant_factor:           scored.risk.dominant_factor().map(|f| f.name),
            strategy:                  rec.strategy_name.clone(),
            priority:                  rec.priority,
            timeline:                  rec.timeline.clone(),
            recommended_actions_count: rec.actions.len(),
            actions:                   rec.actions.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    run_id:         String,
    generated_at:   String,
    config_version: String,
    results:        Vec<ResultRow>,
    skipped:        Vec<SkippedRecord>,
    summary:        BatchSummary,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let processor = BatchProcessor::new(&config)?;

    if args.ipc_mode {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        return run_ipc_loop(&processor, stdin.lock(), &mut stdout);
    }

    let chunk_size = match args.chunk_size {
        Some(0) => bail!("--chunk-size must be at least 1"),
        Some(n) => n,
        None => usize::MAX,
    };

    let outcome = if let Some(path) = &args.input {
        let rows = loader::load_file(path)?;
        log::info!("loaded {} rows from {}", rows.len(), path.display());
        process_rows_chunked(&processor, rows, chunk_size)
    } else if let Some(n) = args.sample {
        let records = SampleGenerator::new(args.seed).generate(n);
        log::info!("generated {n} sample customers (seed {})", args.seed);
        process_records_chunked(&processor, &records, chunk_size)
    } else {
        bail!("nothing to do: pass --input, --sample or --ipc-mode");
    };

    let report = Report {
        run_id:         uuid::Uuid::new_v4().to_string(),
        generated_at:   chrono::Utc::now().to_rfc3339(),
        config_version: config.version.clone(),
        results:        outcome.results.iter().map(ResultRow::from).collect(),
        skipped:        outcome.skipped,
        summary:        outcome.summary,
    };
    log::info!("run {} complete", report.run_id);

    let mut stdout = io::stdout();
    if args.pretty {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let config = match (&args.config, args.strict) {
        (Some(path), _) => EngineConfig::load(path)?,
        (None, true) => EngineConfig::strict(),
        (None, false) => EngineConfig::default(),
    };
    log::info!("using engine config '{}'", config.version);
    Ok(config)
}

fn process_rows_chunked(
    processor: &BatchProcessor,
    rows: Vec<RawCustomerRecord>,
    chunk_size: usize,
) -> BatchOutcome {
    let mut combined: Option<BatchOutcome> = None;
    let mut offset = 0;
    let mut rows = rows.into_iter().peekable();

    while rows.peek().is_some() {
        let chunk: Vec<RawCustomerRecord> = rows.by_ref().take(chunk_size).collect();
        let len = chunk.len();
        let mut outcome = processor.process_raw(chunk);
        for skipped in &mut outcome.skipped {
            skipped.index += offset;
        }
        offset += len;
        combined = Some(combine(processor, combined, outcome));
    }

    combined.unwrap_or_else(|| processor.process_raw(Vec::<RawCustomerRecord>::new()))
}

fn process_records_chunked(
    processor: &BatchProcessor,
    records: &[CustomerRecord],
    chunk_size: usize,
) -> BatchOutcome {
    records
        .chunks(chunk_size)
        .map(|chunk| processor.process(chunk))
        .fold(None, |acc, outcome| Some(combine(processor, acc, outcome)))
        .unwrap_or_else(|| processor.process(&[]))
}

fn combine(
    processor: &BatchProcessor,
    acc: Option<BatchOutcome>,
    next: BatchOutcome,
) -> BatchOutcome {
    match acc {
        None => next,
        Some(mut acc) => {
            acc.summary = processor.merge(&acc.summary, &next.summary);
            acc.results.extend(next.results);
            acc.skipped.extend(next.skipped);
            acc
        }
    }
}

fn run_ipc_loop<R: BufRead, W: Write>(
    processor: &BatchProcessor,
    mut input: R,
    output: &mut W,
) -> Result<()> {
    let mut last_summary: Option<BatchSummary> = None;
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = input.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(output, e)?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Score { record } => {
                let raw = RawCustomerRecord::from_json_object(&record);
                match processor.ingest(&raw) {
                    Ok(record) => {
                        let scored = processor.evaluate(record);
                        writeln!(output, "{}", serde_json::to_string(&scored)?)?;
                    }
                    Err(e) => write_error(output, EngineError::from(e))?,
                }
            }
            IpcCommand::Batch { records } => {
                let outcome = processor.process_raw(records.iter().map(loader::raw_from_json));
                writeln!(output, "{}", serde_json::to_string(&outcome)?)?;
                last_summary = Some(outcome.summary);
            }
            IpcCommand::Summary => match &last_summary {
                Some(summary) => writeln!(output, "{}", serde_json::to_string(summary)?)?,
                None => write_error(output, "no batch processed yet")?,
            },
        }
        output.flush()?;
    }
    Ok(())
}

fn write_error<W: Write>(output: &mut W, error: impl std::fmt::Display) -> Result<()> {
    let err_json = serde_json::json!({ "error": error.to_string() });
    writeln!(output, "{}", err_json)?;
    output.flush()?;
    Ok(())
}
