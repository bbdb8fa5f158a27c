use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ScanEntry, ScanResult, Task, TaskId};

/// Windows prefetch traces (`*.pf`).
pub struct PrefetchFiles {
    dir: Option<PathBuf>,
}

impl PrefetchFiles {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }
}

fn is_prefetch_trace(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pf"))
}

impl Task for PrefetchFiles {
    fn id(&self) -> TaskId {
        TaskId::Prefetch
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let dir = self
            .dir
            .as_ref()
            .ok_or_else(|| TaskError::Unavailable("prefetch directory".to_string()))?;

        if !dir.exists() {
            return Ok(ScanResult::default().with_note("prefetch directory not found"));
        }

        // Reading Prefetch needs elevation; without it the whole task fails
        let read_dir = std::fs::read_dir(dir).map_err(|e| TaskError::io(dir, e))?;

        let mut result = ScanResult::default();
        for entry in read_dir.flatten() {
            if cancel.is_cancelled() {
                result.interrupted = true;
                break;
            }
            let path = entry.path();
            if !is_prefetch_trace(&path) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            result.total_bytes += meta.len();
            result.entries.push(ScanEntry {
                path,
                size_bytes: meta.len(),
            });
        }
        result.entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }
}
