// src/execution.rs

use git2::{Oid, Repository};
use indicatif::ProgressBar;
use std::path::Path;
use std::thread;
use tracing::{debug, warn};

use crate::config::{ExtractionConfig, StrategyKind};
use crate::error::{Error, Result};
use crate::model::Record;
use crate::sink::{MemorySink, OutputHandler};

/// Schedules per-commit work. Both strategies emit the same set of
/// records for the same items; only the order across commits differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Items in input order on the calling thread
    Sequential,
    /// Rayon pool; each worker thread opens one repository handle, pulls
    /// items from a shared queue and results are merged as they complete
    Parallel { workers: Option<usize> },
}

#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Items whose output was merged into the sink
    pub completed: usize,
    /// Records merged into the sink
    pub records: usize,
    /// Earliest and latest author time among merged commit records
    pub time_span: Option<(i64, i64)>,
    pub failed: Vec<(Oid, Error)>,
}

impl ExecutionStrategy {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        match config.strategy {
            StrategyKind::Sequential => ExecutionStrategy::Sequential,
            StrategyKind::Parallel => ExecutionStrategy::Parallel {
                workers: config.workers,
            },
        }
    }

    /// Runs `work` once per item with a private accumulator, then moves a
    /// successful item's records into `sink`. A failed item's partial output
    /// is discarded and the failure recorded; the remaining items still run.
    pub fn run<F>(
        &self,
        repo_path: &Path,
        items: &[Oid],
        work: F,
        sink: &mut dyn OutputHandler,
        progress: &ProgressBar,
    ) -> Result<ExecutionReport>
    where
        F: Fn(&Repository, Oid, &mut MemorySink) -> Result<()> + Sync,
    {
        // Fails before any work is dispatched if the handle can't be opened.
        let repo = Repository::open(repo_path)?;
        progress.set_length(items.len() as u64);
        progress.set_position(0);

        let mut report = ExecutionReport::default();
        match *self {
            ExecutionStrategy::Sequential => {
                for &oid in items {
                    let result = run_one(&repo, oid, &work);
                    merge(&mut report, oid, result, sink)?;
                    progress.inc(1);
                }
            }
            ExecutionStrategy::Parallel { workers } => {
                drop(repo);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers.unwrap_or(0))
                    .build()
                    .map_err(|e| Error::WorkerSetup(e.to_string()))?;
                debug!(threads = pool.current_num_threads(), items = items.len(), "Dispatching");

                let (queue_tx, queue_rx) = crossbeam_channel::unbounded::<Oid>();
                for &oid in items {
                    queue_tx
                        .send(oid)
                        .map_err(|e| Error::WorkerSetup(e.to_string()))?;
                }
                drop(queue_tx);

                let (tx, rx) = crossbeam_channel::unbounded::<(Oid, Result<MemorySink>)>();
                thread::scope(|scope| -> Result<()> {
                    let work = &work;
                    let pool = &pool;
                    scope.spawn(move || {
                        pool.broadcast(|ctx| {
                            let repo = Repository::open(repo_path);
                            if let Err(e) = &repo {
                                warn!(worker = ctx.index(), error = %e, "Worker could not open repository");
                            }
                            for oid in queue_rx.iter() {
                                let result = match &repo {
                                    Ok(repo) => run_one(repo, oid, work),
                                    Err(e) => Err(Error::WorkerSetup(format!(
                                        "could not open repository: {e}"
                                    ))),
                                };
                                // The receiver only goes away after a sink error.
                                let _ = tx.send((oid, result));
                            }
                        });
                    });

                    for (oid, result) in rx {
                        merge(&mut report, oid, result, sink)?;
                        progress.inc(1);
                    }
                    Ok(())
                })?;
            }
        }
        Ok(report)
    }
}

fn run_one<F>(repo: &Repository, oid: Oid, work: &F) -> Result<MemorySink>
where
    F: Fn(&Repository, Oid, &mut MemorySink) -> Result<()>,
{
    let mut acc = MemorySink::new();
    work(repo, oid, &mut acc)?;
    Ok(acc)
}

fn merge(
    report: &mut ExecutionReport,
    oid: Oid,
    result: Result<MemorySink>,
    sink: &mut dyn OutputHandler,
) -> Result<()> {
    match result {
        Ok(acc) => {
            for record in acc.records() {
                if let Record::Commit(commit) = record {
                    let t = commit.author_time;
                    report.time_span = Some(match report.time_span {
                        Some((first, last)) => (first.min(t), last.max(t)),
                        None => (t, t),
                    });
                }
            }
            report.records += acc.drain_into(sink)?;
            report.completed += 1;
        }
        Err(e) => {
            warn!(commit = %oid, error = %e, "Commit extraction failed");
            report.failed.push((oid, e));
        }
    }
    Ok(())
}
