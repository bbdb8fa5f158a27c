use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cancel::CancelToken;
use crate::error::TaskError;

/// One of the fixed cleanup categories.
///
/// Declaration order is the canonical order used for every report, so the
/// derived `Ord` sorts identifiers canonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskId {
    Temp,
    Trash,
    Cache,
    Prefetch,
    Defrag,
    LargeOld,
    EmptyDirs,
}

impl TaskId {
    /// Every identifier, in canonical order.
    pub const ALL: [TaskId; 7] = [
        TaskId::Temp,
        TaskId::Trash,
        TaskId::Cache,
        TaskId::Prefetch,
        TaskId::Defrag,
        TaskId::LargeOld,
        TaskId::EmptyDirs,
    ];

    /// Machine-readable name, identical to the CLI flag without dashes.
    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn descriptor(self) -> &'static TaskDescriptor {
        &DESCRIPTORS[self as usize]
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown task '{s}'"))
    }
}

/// Where a task can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    Everywhere,
    WindowsOnly,
    /// Windows, and only when the target volume is a rotational disk.
    WindowsHdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskNature {
    /// Deletes items.
    Destructive,
    /// Rearranges data in place (defragmentation).
    Consolidating,
    /// Only reports; never removes anything, even in Execute mode.
    Analytical,
}

/// Static metadata for a [`TaskId`].
#[derive(Debug)]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub name: &'static str,
    pub label: &'static str,
    pub applicability: Applicability,
    pub nature: TaskNature,
}

static DESCRIPTORS: [TaskDescriptor; 7] = [
    TaskDescriptor {
        id: TaskId::Temp,
        name: "temp",
        label: "Temporary Files",
        applicability: Applicability::Everywhere,
        nature: TaskNature::Destructive,
    },
    TaskDescriptor {
        id: TaskId::Trash,
        name: "trash",
        label: "Recycle Bin / Trash",
        applicability: Applicability::Everywhere,
        nature: TaskNature::Destructive,
    },
    TaskDescriptor {
        id: TaskId::Cache,
        name: "cache",
        label: "System & Browser Caches",
        applicability: Applicability::Everywhere,
        nature: TaskNature::Destructive,
    },
    TaskDescriptor {
        id: TaskId::Prefetch,
        name: "prefetch",
        label: "Prefetch Files",
        applicability: Applicability::WindowsOnly,
        nature: TaskNature::Destructive,
    },
    TaskDescriptor {
        id: TaskId::Defrag,
        name: "defrag",
        label: "Disk Defragmentation",
        applicability: Applicability::WindowsHdd,
        nature: TaskNature::Consolidating,
    },
    TaskDescriptor {
        id: TaskId::LargeOld,
        name: "large-old",
        label: "Large & Old Files",
        applicability: Applicability::Everywhere,
        nature: TaskNature::Analytical,
    },
    TaskDescriptor {
        id: TaskId::EmptyDirs,
        name: "empty-dirs",
        label: "Empty Directories",
        applicability: Applicability::Everywhere,
        nature: TaskNature::Destructive,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Read-only estimate. Never touches the filesystem.
    Analyze,
    /// Perform the reclaim action.
    Execute,
}

/// One item found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// A single item that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub path: PathBuf,
    pub message: String,
}

impl ItemError {
    pub fn new(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// What a task produced in one invocation.
///
/// For `discover`/`estimate` the entries are what would be reclaimed. After
/// `reclaim` they are what actually was.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub entries: Vec<ScanEntry>,
    pub total_bytes: u64,
    pub errors: Vec<ItemError>,
    /// Free-form remark for the report (e.g. "defragmentation completed").
    pub note: Option<String>,
    /// Set when the task stopped early because of cancellation.
    pub interrupted: bool,
}

impl ScanResult {
    pub fn from_entries(entries: Vec<ScanEntry>) -> Self {
        let total_bytes = entries.iter().map(|e| e.size_bytes).sum();
        Self {
            entries,
            total_bytes,
            ..Self::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The contract every cleanup category implements.
///
/// `discover` is the read-only scan. `estimate` and `reclaim` are what the
/// engine calls; their defaults cover the common "find items, delete each"
/// shape, and variants override them where they differ.
pub trait Task: Send + Sync {
    fn id(&self) -> TaskId;

    /// Find the items this task would act on. Must not modify anything.
    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError>;

    /// Reclaimable bytes, without deleting or modifying anything.
    fn estimate(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        self.discover(cancel)
    }

    /// Perform the reclaim and report bytes actually freed.
    fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let found = self.discover(cancel)?;
        Ok(crate::tasks::remove_entries(found, cancel))
    }
}
