use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ScanEntry, ScanResult, Task, TaskId};

/// Directories to skip during the walk.
const SKIP_DIRS: &[&str] = &[".git", ".Trash", ".cargo", ".rustup", "node_modules"];

/// Finds files over a size threshold that have not been modified for a
/// while. Discovery only: nothing is ever deleted, in either mode.
pub struct LargeOldFiles {
    root: Option<PathBuf>,
    min_bytes: u64,
    min_age: Duration,
}

impl LargeOldFiles {
    pub fn new(root: Option<PathBuf>, min_bytes: u64, min_age: Duration) -> Self {
        Self {
            root,
            min_bytes,
            min_age,
        }
    }
}

impl Task for LargeOldFiles {
    fn id(&self) -> TaskId {
        TaskId::LargeOld
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| TaskError::Unavailable("home directory".to_string()))?;
        if !root.is_dir() {
            return Err(TaskError::io(root, io::Error::from(io::ErrorKind::NotFound)));
        }

        let cutoff = SystemTime::now()
            .checked_sub(self.min_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() > 0 && e.file_type().is_dir() {
                    let name = e.file_name().to_string_lossy();
                    return !SKIP_DIRS.iter().any(|&skip| name == skip);
                }
                true
            });

        let mut result = ScanResult::default();
        for entry in walker.filter_map(|e| e.ok()) {
            if cancel.is_cancelled() {
                result.interrupted = true;
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            // Single metadata call for size and mtime
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.len() <= self.min_bytes {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if modified >= cutoff {
                continue;
            }
            tracing::debug!(path = %entry.path().display(), size = meta.len(), "large old file");
            result.total_bytes += meta.len();
            result.entries.push(ScanEntry {
                path: entry.path().to_path_buf(),
                size_bytes: meta.len(),
            });
        }

        // Sort by size descending, biggest files first
        result
            .entries
            .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.path.cmp(&b.path)));
        if !result.entries.is_empty() {
            let note = format!(
                "found {} file(s); review and delete them manually",
                result.entries.len()
            );
            result = result.with_note(note);
        }
        Ok(result)
    }

    fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        // Report only, never auto-delete
        self.discover(cancel)
    }
}
