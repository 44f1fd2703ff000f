//! Parallel dispatcher.
//!
//! [`Runner`] fans normalized records out over a fixed-size rayon pool. Every worker
//! reads the same `Arc<RangeTable>`; nothing else is shared, so no locking happens
//! during enrichment.
//!
//! Output order is **not** part of the contract. Callers that need a stable order
//! must derive it from row content (the table serializer does).

use crate::Record;
use crate::enrich::{EnrichOutcome, enrich_value};
use crate::error::{EngineError, RecordError};
use crate::geo::RangeTable;
use crate::validation::{ErrorCollector, ErrorPolicy};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Records between two progress log lines.
pub const PROGRESS_EVERY: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    /// Enrich on the calling thread
    Sequential,
    /// Enrich on a dedicated pool; `None` sizes it to the number of CPUs
    Parallel { threads: Option<usize> },
}

impl Default for ExecMode {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

impl ExecMode {
    /// Map a worker count to a mode: `1` runs sequentially.
    #[must_use]
    pub fn with_workers(workers: Option<usize>) -> Self {
        match workers {
            Some(1) => Self::Sequential,
            threads => Self::Parallel { threads },
        }
    }
}

/// Counters for one enrichment batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    /// Records handed to the runner
    pub total: usize,
    /// Records with at least one enriched field
    pub enriched: usize,
    /// Enriched fields across all records
    pub enriched_fields: usize,
    /// Failed records kept unenriched
    pub passed_through: usize,
    /// Failed records excluded from the output
    pub dropped: usize,
}

impl EnrichStats {
    #[must_use]
    pub fn errors(&self) -> usize {
        self.passed_through + self.dropped
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub records: Vec<Record>,
    pub stats: EnrichStats,
    pub errors: ErrorCollector,
}

enum Step {
    Done(EnrichOutcome),
    Failed {
        index: usize,
        error: RecordError,
        kept: Option<Record>,
    },
}

pub struct Runner {
    table: Arc<RangeTable>,
    policy: ErrorPolicy,
    pool: Option<rayon::ThreadPool>,
}

impl Runner {
    /// Build a runner, creating its worker pool up front.
    ///
    /// # Errors
    /// [`EngineError::Pool`] if a zero-sized pool is requested or the pool cannot
    /// be built.
    pub fn new(
        table: Arc<RangeTable>,
        mode: ExecMode,
        policy: ErrorPolicy,
    ) -> Result<Self, EngineError> {
        let pool = match mode {
            ExecMode::Sequential => None,
            ExecMode::Parallel { threads } => {
                let n = threads.unwrap_or_else(num_cpus::get);
                if n == 0 {
                    return Err(EngineError::Pool("worker count must be at least 1".into()));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("geoenrich-worker-{i}"))
                    .build()
                    .map_err(|e| EngineError::Pool(e.to_string()))?;
                Some(pool)
            }
        };
        Ok(Self {
            table,
            policy,
            pool,
        })
    }

    /// Number of threads enriching records.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, rayon::ThreadPool::current_num_threads)
    }

    #[must_use]
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Enrich every record.
    ///
    /// # Errors
    /// Under [`ErrorPolicy::Fail`], [`EngineError::Record`] for a failing record.
    /// Other policies never fail.
    pub fn run_all(&self, values: Vec<Value>) -> Result<RunOutput, EngineError> {
        let total = values.len();
        info!(
            records = total,
            threads = self.threads(),
            policy = %self.policy,
            "enriching records"
        );

        let table = self.table.as_ref();
        let policy = self.policy;
        let done = AtomicUsize::new(0);
        let step = |(index, value): (usize, Value)| {
            let result = process(table, policy, index, value);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if progress_due(n) {
                info!(done = n, total, "enrichment progress");
            }
            result
        };

        let steps: Result<Vec<Step>, (usize, RecordError)> = match &self.pool {
            None => values.into_iter().enumerate().map(step).collect(),
            Some(pool) => pool.install(|| values.into_par_iter().enumerate().map(step).collect()),
        };
        let steps = steps.map_err(|(index, source)| EngineError::Record { index, source })?;

        let mut out = RunOutput {
            records: Vec::with_capacity(steps.len()),
            stats: EnrichStats {
                total,
                ..EnrichStats::default()
            },
            errors: ErrorCollector::new(),
        };
        for s in steps {
            match s {
                Step::Done(outcome) => {
                    if outcome.enriched_fields > 0 {
                        out.stats.enriched += 1;
                        out.stats.enriched_fields += outcome.enriched_fields;
                    }
                    out.records.push(outcome.record);
                }
                Step::Failed { index, error, kept } => {
                    warn!(index, error = %error, kept = kept.is_some(), "record enrichment failed");
                    out.errors.add(index, &error, kept.is_some());
                    match kept {
                        Some(record) => {
                            out.stats.passed_through += 1;
                            out.records.push(record);
                        }
                        None => out.stats.dropped += 1,
                    }
                }
            }
        }
        debug!(stats = ?out.stats, "enrichment finished");
        Ok(out)
    }
}

fn progress_due(done: usize) -> bool {
    done % PROGRESS_EVERY == 0
}

fn process(
    table: &RangeTable,
    policy: ErrorPolicy,
    index: usize,
    value: Value,
) -> Result<Step, (usize, RecordError)> {
    match enrich_value(&value, table) {
        Ok(outcome) => Ok(Step::Done(outcome)),
        Err(error) => match policy {
            ErrorPolicy::Fail => Err((index, error)),
            ErrorPolicy::Drop => Ok(Step::Failed {
                index,
                error,
                kept: None,
            }),
            ErrorPolicy::Passthrough => Ok(Step::Failed {
                index,
                error,
                kept: match value {
                    Value::Object(record) => Some(record),
                    _ => None,
                },
            }),
        },
    }
}
