use std::time::Duration;

use crate::task::{ItemError, ScanEntry, ScanResult, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    /// Some items were processed, some failed.
    Partial,
    Failed,
    /// Not applicable on this platform.
    Skipped,
    /// Stopped by an abort signal, before or during the run.
    Cancelled,
}

impl OutcomeStatus {
    pub fn label(self) -> &'static str {
        match self {
            OutcomeStatus::Succeeded => "ok",
            OutcomeStatus::Partial => "partial",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped => "skipped",
            OutcomeStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the outcome's bytes reflect completed work.
    pub fn counts_toward_total(self) -> bool {
        matches!(
            self,
            OutcomeStatus::Succeeded | OutcomeStatus::Partial | OutcomeStatus::Cancelled
        )
    }
}

/// Result of running one task in one mode.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub id: TaskId,
    pub status: OutcomeStatus,
    /// Bytes estimated (Analyze) or actually reclaimed (Execute).
    pub bytes: u64,
    pub entries: Vec<ScanEntry>,
    pub errors: Vec<ItemError>,
    /// Diagnostic or remark: failure reason, skip reason, task note.
    pub message: Option<String>,
    pub elapsed: Duration,
    /// False for skipped tasks and tasks cancelled before they started.
    pub ran: bool,
}

impl TaskOutcome {
    pub fn skipped(id: TaskId) -> Self {
        Self::bare(id, OutcomeStatus::Skipped, "unsupported on this platform")
    }

    pub fn cancelled(id: TaskId) -> Self {
        Self::bare(id, OutcomeStatus::Cancelled, "cancelled before start")
    }

    /// The task started, then gave up on seeing the abort signal.
    pub fn interrupted(id: TaskId, elapsed: Duration) -> Self {
        Self {
            elapsed,
            ran: true,
            ..Self::bare(id, OutcomeStatus::Cancelled, "cancelled while running")
        }
    }

    pub fn failed(id: TaskId, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            elapsed,
            ran: true,
            ..Self::bare(id, OutcomeStatus::Failed, message)
        }
    }

    fn bare(id: TaskId, status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            bytes: 0,
            entries: Vec::new(),
            errors: Vec::new(),
            message: Some(message.into()),
            elapsed: Duration::ZERO,
            ran: false,
        }
    }

    /// Classify what a task returned.
    ///
    /// Per-item errors only fail the task when nothing at all succeeded.
    pub fn from_scan(id: TaskId, result: ScanResult, elapsed: Duration) -> Self {
        let status = if result.interrupted {
            OutcomeStatus::Cancelled
        } else if result.errors.is_empty() {
            OutcomeStatus::Succeeded
        } else if result.entries.is_empty() {
            OutcomeStatus::Failed
        } else {
            OutcomeStatus::Partial
        };

        let message = match status {
            OutcomeStatus::Failed => Some(format!(
                "nothing could be processed ({} error(s))",
                result.errors.len()
            )),
            OutcomeStatus::Cancelled => Some(
                result
                    .note
                    .unwrap_or_else(|| "cancelled while running".to_string()),
            ),
            _ => result.note,
        };

        Self {
            id,
            status,
            bytes: if status == OutcomeStatus::Failed {
                0
            } else {
                result.total_bytes
            },
            entries: result.entries,
            errors: result.errors,
            message,
            elapsed,
            ran: true,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Outcomes of one engine run, in canonical task order.
#[derive(Debug, Clone, Default)]
pub struct ResultReport {
    outcomes: Vec<TaskOutcome>,
}

impl ResultReport {
    pub fn new(mut outcomes: Vec<TaskOutcome>) -> Self {
        // stable: at most one outcome per id in practice
        outcomes.sort_by_key(|o| o.id);
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    /// Sum of bytes over outcomes that completed work. Failed and skipped
    /// outcomes contribute nothing.
    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .filter(|o| o.status.counts_toward_total())
            .map(|o| o.bytes)
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(TaskOutcome::is_failure)
    }

    pub fn was_cancelled(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == OutcomeStatus::Cancelled)
    }

    /// Ids of the tasks that actually ran.
    pub fn executed(&self) -> Vec<TaskId> {
        self.outcomes.iter().filter(|o| o.ran).map(|o| o.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
