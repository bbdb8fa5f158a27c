use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ScanResult, Task, TaskId};

/// System and browser caches. Each child of a cache root is one item.
pub struct CacheFiles {
    roots: Vec<PathBuf>,
}

impl CacheFiles {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl Task for CacheFiles {
    fn id(&self) -> TaskId {
        TaskId::Cache
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        Ok(super::scan_roots(&self.roots, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_every_root_and_keeps_the_roots() {
        let dir = tempfile::tempdir().unwrap();
        let chrome = dir.path().join("Chrome/Default/Cache");
        let firefox = dir.path().join("Firefox/abc.default/cache2");
        std::fs::create_dir_all(chrome.join("Cache_Data")).unwrap();
        std::fs::create_dir_all(&firefox).unwrap();
        std::fs::write(chrome.join("Cache_Data/f_000001"), vec![0u8; 2_048]).unwrap();
        std::fs::write(firefox.join("entry"), vec![0u8; 1_024]).unwrap();

        let task = CacheFiles::new(vec![chrome.clone(), firefox.clone()]);
        let cancel = CancelToken::new();
        let estimate = task.estimate(&cancel).unwrap();
        assert_eq!(estimate.total_bytes, 3_072);
        assert_eq!(estimate.entries[0].size_bytes, 2_048);

        let reclaimed = task.reclaim(&cancel).unwrap();
        assert_eq!(reclaimed.total_bytes, 3_072);
        assert!(chrome.exists() && firefox.exists());
        assert_eq!(std::fs::read_dir(&chrome).unwrap().count(), 0);
    }
}
