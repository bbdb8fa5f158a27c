use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ScanResult, Task, TaskId};

/// Everything directly inside the OS temp directories.
pub struct TempFiles {
    roots: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl Task for TempFiles {
    fn id(&self) -> TaskId {
        TaskId::Temp
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        Ok(super::scan_roots(&self.roots, cancel))
    }
}
