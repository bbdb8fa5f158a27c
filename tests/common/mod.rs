#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sysclean::{CleanupConfig, TrashLocation};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A throwaway tree with one directory per task location.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for sub in [
            "temp",
            "trash/files",
            "trash/info",
            "cache",
            "Prefetch",
            "home",
        ] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn file(&self, rel: &str, size: usize) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, vec![0xA5u8; size]).unwrap();
        path
    }

    pub fn aged_file(&self, rel: &str, size: usize, days_old: u64) -> PathBuf {
        let path = self.file(rel, size);
        let mtime = SystemTime::now() - Duration::from_secs(days_old * 86_400);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    pub fn trashed(&self, name: &str, size: usize) -> PathBuf {
        self.file(&format!("trash/info/{name}.trashinfo"), 32);
        self.file(&format!("trash/files/{name}"), size)
    }

    pub fn empty_dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    /// Every task pointed into the sandbox.
    pub fn config(&self) -> CleanupConfig {
        CleanupConfig {
            temp_dirs: vec![self.path("temp")],
            trash_dirs: Some(vec![TrashLocation {
                files: self.path("trash/files"),
                info: Some(self.path("trash/info")),
            }]),
            cache_dirs: vec![self.path("cache")],
            prefetch_dir: Some(self.path("Prefetch")),
            scan_root: Some(self.path("home")),
            ..CleanupConfig::default()
        }
        .with_large_thresholds(1_024, Duration::from_secs(30 * 86_400))
    }

    /// Path -> content hash (directories hash to their name only).
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        WalkDir::new(self.dir.path())
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let digest = if e.file_type().is_file() {
                    let bytes = std::fs::read(e.path()).unwrap();
                    blake3::hash(&bytes).to_hex().to_string()
                } else {
                    "dir".to_string()
                };
                (e.path().to_path_buf(), digest)
            })
            .collect()
    }
}

pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
