//! Task group scheduling.
//!
//! Each task group is owned by exactly one worker for its whole run; the
//! only state workers share is the read-only calculation and its score card.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::config::{EngineConfig, ExecutorKind};
use super::range::{self, RangeSummary};
use super::{Calculation, EngineError, TaskGroup, TaskGroupIdentifier};

/// What one execution did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    /// Task groups that completed.
    pub groups: usize,
    pub range: RangeSummary,
}

/// Runs task groups against a calculation.
pub trait TaskExecutor: Send + Sync {
    /// Run every group, writing results to the calculation's score card.
    ///
    /// # Errors
    ///
    /// Returns `Interrupted` if the calculation's interrupt was raised,
    /// otherwise the first task group failure.
    fn execute(
        &self,
        calculation: &Arc<Calculation>,
        groups: Vec<TaskGroup>,
    ) -> Result<ExecutionSummary, EngineError>;
}

/// The executor selected by configuration.
pub fn from_config(config: &EngineConfig) -> Box<dyn TaskExecutor> {
    match config.executor {
        ExecutorKind::Sequential => Box::new(SequentialExecutor),
        ExecutorKind::Parallel => Box::new(ParallelExecutor::from_config(config)),
    }
}

fn group_failed(id: &TaskGroupIdentifier, err: EngineError) -> EngineError {
    EngineError::TaskGroupFailed {
        origin: id.origin,
        run: id.run.clone(),
        source: Box::new(err),
    }
}

/// Runs groups one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl TaskExecutor for SequentialExecutor {
    fn execute(
        &self,
        calculation: &Arc<Calculation>,
        groups: Vec<TaskGroup>,
    ) -> Result<ExecutionSummary, EngineError> {
        let mut summary = ExecutionSummary::default();

        for group in &groups {
            calculation.interrupt().check()?;
            let range = range::run(calculation, group).map_err(|err| {
                if err.is_interrupted() {
                    EngineError::Interrupted
                } else {
                    error!(group = %group.id(), error = %err, "Task group failed");
                    group_failed(group.id(), err)
                }
            })?;
            summary.groups += 1;
            summary.range.merge(&range);
        }

        info!(
            groups = summary.groups,
            steps = summary.range.steps,
            records = summary.range.records_written,
            "Sequential execution finished"
        );
        Ok(summary)
    }
}

/// Runs groups on a dedicated worker pool.
#[derive(Debug, Clone)]
pub struct ParallelExecutor {
    /// Worker threads; `None` uses the available hardware parallelism.
    pub workers: Option<usize>,
    /// How long to wait for a result before logging that workers are still busy.
    pub poll_interval: Duration,
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self {
            workers: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl ParallelExecutor {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            workers: config.workers,
            poll_interval: config.poll_interval(),
        }
    }

    fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
    }
}

impl TaskExecutor for ParallelExecutor {
    fn execute(
        &self,
        calculation: &Arc<Calculation>,
        groups: Vec<TaskGroup>,
    ) -> Result<ExecutionSummary, EngineError> {
        let workers = self.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("reach-worker-{i}"))
            .panic_handler(|_| error!("Worker panicked while running a task group"))
            .build()?;

        let total = groups.len();
        info!(groups = total, workers, "Starting parallel execution");

        let (tx, rx) = mpsc::channel::<(TaskGroupIdentifier, Result<RangeSummary, EngineError>)>();
        for group in groups {
            let tx = tx.clone();
            let calculation = Arc::clone(calculation);
            pool.spawn(move || {
                let result = match calculation.interrupt().check() {
                    Ok(()) => range::run(&calculation, &group),
                    Err(err) => Err(err),
                };
                if tx.send((group.id().clone(), result)).is_err() {
                    debug!(group = %group.id(), "Result dropped after execution ended");
                }
            });
        }
        // Workers hold the only senders from here on
        drop(tx);

        let mut summary = ExecutionSummary::default();
        let mut first_failure = None;
        let mut pending = total;

        while pending > 0 {
            match rx.recv_timeout(self.poll_interval) {
                Ok((id, Ok(range))) => {
                    pending -= 1;
                    summary.groups += 1;
                    summary.range.merge(&range);
                    debug!(group = %id, pending, "Task group finished");
                }
                Ok((id, Err(err))) => {
                    pending -= 1;
                    if !err.is_interrupted() {
                        error!(group = %id, error = %err, "Task group failed");
                    }
                    if first_failure.is_none() {
                        first_failure = Some(group_failed(&id, err));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(pending, total, "Still waiting for task groups");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    error!(pending, "Workers exited without reporting");
                    return Err(EngineError::WorkerLost { pending });
                }
            }
        }

        if calculation.interrupt().is_raised() {
            return Err(EngineError::Interrupted);
        }
        if let Some(err) = first_failure {
            return Err(err);
        }

        info!(
            groups = summary.groups,
            steps = summary.range.steps,
            records = summary.range.records_written,
            "Parallel execution finished"
        );
        Ok(summary)
    }
}
