use std::path::PathBuf;

use thiserror::Error;

/// A task-level failure. Per-item problems are recorded as
/// [`crate::task::ItemError`] instead and never surface here.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{0} is not available on this system")]
    Unavailable(String),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command `{program}` failed: {reason}")]
    Command { program: String, reason: String },

    #[error("cancelled")]
    Cancelled,
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A malformed command line, reported before the engine runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvocationError {
    #[error("no task selected: pass --all or at least one task flag (see --help)")]
    NoTasks,
}
