use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::config::{CleanupConfig, MAX_WORKERS};
use crate::error::TaskError;
use crate::platform::PlatformCapabilities;
use crate::registry::{DefaultTaskFactory, TaskFactory, TaskRegistry};
use crate::report::{OutcomeStatus, ResultReport, TaskOutcome};
use crate::task::{ExecutionMode, TaskId};

/// Progress notifications for front ends.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    TaskStarted(TaskId),
    TaskFinished {
        id: TaskId,
        status: OutcomeStatus,
        bytes: u64,
    },
}

type Observer = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Runs a selection of tasks and aggregates their outcomes.
///
/// Tasks run on a small dedicated pool, one worker per applicable task.
/// Every failure is contained at the task boundary: a task that errors or
/// panics yields a failed outcome and its siblings carry on. `run` itself
/// never fails.
pub struct ExecutionEngine {
    capabilities: PlatformCapabilities,
    factory: Arc<dyn TaskFactory>,
    cancel: CancelToken,
    workers: Option<usize>,
    observer: Option<Observer>,
}

impl ExecutionEngine {
    pub fn new(capabilities: PlatformCapabilities, factory: impl TaskFactory + 'static) -> Self {
        Self {
            capabilities,
            factory: Arc::new(factory),
            cancel: CancelToken::new(),
            workers: None,
            observer: None,
        }
    }

    /// Engine for the running host with the real tasks.
    pub fn for_host(config: CleanupConfig) -> Self {
        let capabilities = *PlatformCapabilities::current(&config.defrag_volume);
        let workers = config.workers;
        let mut engine = Self::new(capabilities, DefaultTaskFactory::new(config));
        engine.workers = workers;
        engine
    }

    /// Share an abort signal with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.clamp(1, MAX_WORKERS));
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(&EngineEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(
        &self,
        requested: impl IntoIterator<Item = TaskId>,
        expand_all: bool,
        mode: ExecutionMode,
    ) -> ResultReport {
        let resolution = TaskRegistry::new(&self.capabilities).resolve(requested, expand_all);
        tracing::info!(
            ?mode,
            applicable = ?resolution.applicable,
            skipped = ?resolution.skipped,
            "starting run"
        );

        let mut outcomes: Vec<TaskOutcome> = resolution
            .skipped
            .iter()
            .map(|&id| {
                tracing::info!(task = %id, "skipped: unsupported on this platform");
                TaskOutcome::skipped(id)
            })
            .collect();
        outcomes.extend(self.run_applicable(&resolution.applicable, mode));

        let report = ResultReport::new(outcomes);
        tracing::info!(
            total_bytes = report.total_bytes(),
            failures = report.has_failures(),
            "run finished"
        );
        report
    }

    fn run_applicable(&self, ids: &[TaskId], mode: ExecutionMode) -> Vec<TaskOutcome> {
        let workers = self
            .workers
            .unwrap_or(ids.len())
            .clamp(1, MAX_WORKERS)
            .min(ids.len().max(1));

        if workers == 1 {
            return ids.iter().map(|&id| self.run_one(id, mode)).collect();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sysclean-task-{i}"))
            .build();
        match pool {
            // indexed collect keeps input order regardless of completion order
            Ok(pool) => pool.install(|| ids.par_iter().map(|&id| self.run_one(id, mode)).collect()),
            Err(e) => {
                tracing::warn!("cannot start worker pool, running tasks serially: {e}");
                ids.iter().map(|&id| self.run_one(id, mode)).collect()
            }
        }
    }

    fn run_one(&self, id: TaskId, mode: ExecutionMode) -> TaskOutcome {
        if self.cancel.is_cancelled() {
            tracing::info!(task = %id, "cancelled before start");
            let outcome = TaskOutcome::cancelled(id);
            self.notify(&outcome);
            return outcome;
        }

        if let Some(observer) = &self.observer {
            observer(&EngineEvent::TaskStarted(id));
        }
        tracing::info!(task = %id, ?mode, "running task");

        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let task = self.factory.create(id);
            match mode {
                ExecutionMode::Analyze => task.estimate(&self.cancel),
                ExecutionMode::Execute => task.reclaim(&self.cancel),
            }
        }));
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(Ok(scan)) => TaskOutcome::from_scan(id, scan, elapsed),
            Ok(Err(TaskError::Cancelled)) => TaskOutcome::interrupted(id, elapsed),
            Ok(Err(e)) => {
                tracing::warn!(task = %id, "task failed: {e}");
                TaskOutcome::failed(id, e.to_string(), elapsed)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(task = %id, "task panicked: {message}");
                TaskOutcome::failed(id, format!("internal error: {message}"), elapsed)
            }
        };

        tracing::info!(
            task = %id,
            status = outcome.status.label(),
            bytes = outcome.bytes,
            item_errors = outcome.errors.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "task finished"
        );
        self.notify(&outcome);
        outcome
    }

    fn notify(&self, outcome: &TaskOutcome) {
        if let Some(observer) = &self.observer {
            observer(&EngineEvent::TaskFinished {
                id: outcome.id,
                status: outcome.status,
                bytes: outcome.bytes,
            });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsFamily, StorageMedium};
    use crate::task::{ScanEntry, ScanResult, Task};
    use std::sync::Mutex;

    /// Fixed results per id, so orchestration can be tested without disks.
    struct Scripted;

    struct ScriptedTask(TaskId);

    impl Task for ScriptedTask {
        fn id(&self) -> TaskId {
            self.0
        }

        fn discover(&self, _cancel: &CancelToken) -> Result<ScanResult, TaskError> {
            match self.0 {
                TaskId::Trash => Err(TaskError::Unavailable("trash store".to_string())),
                TaskId::Cache => panic!("cache exploded"),
                id => Ok(ScanResult::from_entries(vec![ScanEntry {
                    path: id.as_str().into(),
                    size_bytes: 100 * (id as u64 + 1),
                }])),
            }
        }
    }

    impl TaskFactory for Scripted {
        fn create(&self, id: TaskId) -> Box<dyn Task> {
            Box::new(ScriptedTask(id))
        }
    }

    fn linux_engine() -> ExecutionEngine {
        ExecutionEngine::new(
            PlatformCapabilities::new(OsFamily::Linux, StorageMedium::Unknown),
            Scripted,
        )
    }

    #[test]
    fn failures_are_contained_per_task() {
        let report = linux_engine().run(
            [TaskId::Temp, TaskId::Trash, TaskId::Cache, TaskId::EmptyDirs],
            false,
            ExecutionMode::Analyze,
        );
        let statuses: Vec<_> = report.outcomes().iter().map(|o| (o.id, o.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (TaskId::Temp, OutcomeStatus::Succeeded),
                (TaskId::Trash, OutcomeStatus::Failed),
                (TaskId::Cache, OutcomeStatus::Failed),
                (TaskId::EmptyDirs, OutcomeStatus::Succeeded),
            ]
        );
        assert_eq!(report.total_bytes(), 100 + 700);
        assert!(report
            .get(TaskId::Cache)
            .and_then(|o| o.message.as_deref())
            .is_some_and(|m| m.contains("cache exploded")));
    }

    #[test]
    fn unsupported_ids_are_reported_not_dropped() {
        let report = linux_engine().run([TaskId::Prefetch], false, ExecutionMode::Execute);
        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(report.outcomes()[0].status, OutcomeStatus::Skipped);
        assert_eq!(report.total_bytes(), 0);
        assert!(!report.has_failures());
        assert!(report.executed().is_empty());
    }

    #[test]
    fn order_is_canonical_for_any_worker_count() {
        for workers in [1, 2, 7] {
            let report = linux_engine()
                .with_workers(workers)
                .run([TaskId::EmptyDirs, TaskId::LargeOld, TaskId::Temp], false, ExecutionMode::Analyze);
            let ids: Vec<_> = report.outcomes().iter().map(|o| o.id).collect();
            assert_eq!(ids, vec![TaskId::Temp, TaskId::LargeOld, TaskId::EmptyDirs]);
        }
    }

    #[test]
    fn cancelled_engine_marks_everything_cancelled() {
        let engine = linux_engine();
        engine.cancel_token().cancel();
        let report = engine.run([TaskId::Temp, TaskId::LargeOld], false, ExecutionMode::Execute);
        assert!(report
            .outcomes()
            .iter()
            .all(|o| o.status == OutcomeStatus::Cancelled && !o.ran));
        assert_eq!(report.total_bytes(), 0);
    }

    #[test]
    fn observer_sees_start_and_finish() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let engine = linux_engine()
            .with_workers(1)
            .with_observer(move |event| sink.lock().unwrap().push(event.clone()));
        engine.run([TaskId::Temp], false, ExecutionMode::Analyze);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EngineEvent::TaskStarted(TaskId::Temp)));
        assert!(matches!(
            events[1],
            EngineEvent::TaskFinished {
                id: TaskId::Temp,
                status: OutcomeStatus::Succeeded,
                bytes: 100
            }
        ));
    }

    /// Frees one item, then the abort arrives and the rest are left alone.
    struct Halting;

    struct HaltingTask(TaskId);

    impl Task for HaltingTask {
        fn id(&self) -> TaskId {
            self.0
        }

        fn discover(&self, _cancel: &CancelToken) -> Result<ScanResult, TaskError> {
            Ok(ScanResult::from_entries(
                ["one", "two", "three"]
                    .into_iter()
                    .map(|name| ScanEntry {
                        path: name.into(),
                        size_bytes: 100,
                    })
                    .collect(),
            ))
        }

        fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
            if self.0 == TaskId::Trash {
                cancel.cancel();
                return Err(TaskError::Cancelled);
            }
            let mut done = Vec::new();
            let mut interrupted = false;
            for entry in self.discover(cancel)?.entries {
                if cancel.is_cancelled() {
                    interrupted = true;
                    break;
                }
                done.push(entry);
                cancel.cancel();
            }
            let mut result = ScanResult::from_entries(done);
            result.interrupted = interrupted;
            Ok(result)
        }
    }

    impl TaskFactory for Halting {
        fn create(&self, id: TaskId) -> Box<dyn Task> {
            Box::new(HaltingTask(id))
        }
    }

    fn halting_engine() -> ExecutionEngine {
        ExecutionEngine::new(
            PlatformCapabilities::new(OsFamily::Linux, StorageMedium::Unknown),
            Halting,
        )
        .with_workers(1)
    }

    #[test]
    fn cancellation_mid_task_keeps_completed_bytes() {
        let report = halting_engine().run([TaskId::Temp, TaskId::Cache], false, ExecutionMode::Execute);

        let temp = report.get(TaskId::Temp).unwrap();
        assert_eq!(temp.status, OutcomeStatus::Cancelled);
        assert_eq!(temp.bytes, 100);
        assert!(temp.ran);
        let cache = report.get(TaskId::Cache).unwrap();
        assert_eq!(cache.status, OutcomeStatus::Cancelled);
        assert!(!cache.ran);
        assert_eq!(report.total_bytes(), 100);
        assert!(!report.has_failures());
    }

    #[test]
    fn cancelled_error_from_a_running_task_counts_as_ran() {
        let report = halting_engine().run([TaskId::Trash], false, ExecutionMode::Execute);

        let trash = report.get(TaskId::Trash).unwrap();
        assert_eq!(trash.status, OutcomeStatus::Cancelled);
        assert!(trash.ran);
        assert_eq!(trash.message.as_deref(), Some("cancelled while running"));
        assert_eq!(report.executed(), vec![TaskId::Trash]);
    }

    #[test]
    fn nothing_requested_is_a_valid_empty_report() {
        let report = linux_engine().run([], false, ExecutionMode::Execute);
        assert!(report.is_empty());
        assert_eq!(report.total_bytes(), 0);
    }
}
