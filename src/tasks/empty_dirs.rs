use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ItemError, ScanEntry, ScanResult, Task, TaskId};

/// Top-level user directories that should never be removed even if empty.
const PROTECTED_DIRS: &[&str] = &[
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Videos",
    "Public",
    "Templates",
];

/// Directories to skip entirely. Hidden directories are skipped as well.
const SKIP_DIRS: &[&str] = &["node_modules", "AppData", "Library"];

/// Deeper directories are treated as non-empty.
const MAX_DEPTH: usize = 64;

fn should_skip(name: &str) -> bool {
    SKIP_DIRS.iter().any(|&s| name == s) || name.starts_with('.')
}

fn is_empty_now(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok_and(|mut rd| rd.next().is_none())
}

/// Directories with no files anywhere beneath them.
pub struct EmptyDirs {
    root: Option<PathBuf>,
}

impl EmptyDirs {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn is_protected(&self, path: &Path, root: &Path) -> bool {
        path.parent() == Some(root)
            && path
                .file_name()
                .is_some_and(|n| PROTECTED_DIRS.iter().any(|&p| n == p))
    }

    /// Returns whether `dir` is (transitively) empty, collecting every
    /// removable empty directory below `root` with its depth.
    fn collect(
        &self,
        root: &Path,
        dir: &Path,
        depth: usize,
        cancel: &CancelToken,
        found: &mut Vec<(PathBuf, usize)>,
        interrupted: &mut bool,
    ) -> bool {
        if cancel.is_cancelled() {
            *interrupted = true;
            return false;
        }
        if depth > MAX_DEPTH {
            return false;
        }
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            // unreadable counts as occupied
            return false;
        };

        let mut empty = true;
        for entry in read_dir.flatten() {
            let Ok(file_type) = entry.file_type() else {
                empty = false;
                continue;
            };
            let name = entry.file_name();
            if !file_type.is_dir() || should_skip(&name.to_string_lossy()) {
                empty = false;
                continue;
            }
            let child = entry.path();
            if !self.collect(root, &child, depth + 1, cancel, found, interrupted) {
                empty = false;
            }
        }

        if !empty || self.is_protected(dir, root) {
            return false;
        }
        if depth > 0 {
            found.push((dir.to_path_buf(), depth));
        }
        true
    }

    fn candidates(&self, cancel: &CancelToken) -> Result<(Vec<(PathBuf, usize)>, bool), TaskError> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| TaskError::Unavailable("home directory".to_string()))?;
        std::fs::read_dir(root).map_err(|e| TaskError::io(root, e))?;

        let mut found = Vec::new();
        let mut interrupted = false;
        self.collect(root, root, 0, cancel, &mut found, &mut interrupted);
        // deepest first, then by path for stable output
        found.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok((found, interrupted))
    }
}

impl Task for EmptyDirs {
    fn id(&self) -> TaskId {
        TaskId::EmptyDirs
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let (found, interrupted) = self.candidates(cancel)?;
        let mut result = ScanResult::from_entries(
            found
                .into_iter()
                .map(|(path, _)| ScanEntry {
                    path,
                    size_bytes: 0,
                })
                .collect(),
        );
        result.interrupted = interrupted;
        if !result.entries.is_empty() {
            let note = format!("{} empty directories identified", result.entries.len());
            result = result.with_note(note);
        }
        Ok(result)
    }

    /// Removes level by level, deepest first, so a parent emptied by its
    /// children's removal goes in the same pass. Directories within one
    /// level are independent and removed in parallel.
    fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let (found, mut interrupted) = self.candidates(cancel)?;

        let mut levels: BTreeMap<usize, Vec<PathBuf>> = BTreeMap::new();
        for (path, depth) in found {
            levels.entry(depth).or_default().push(path);
        }

        let mut removed = Vec::new();
        let mut errors = Vec::new();
        for (_, dirs) in levels.into_iter().rev() {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }
            let outcomes: Vec<Option<Result<PathBuf, ItemError>>> = dirs
                .into_par_iter()
                .map(|dir| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    // a writer may have put something here since the scan
                    if !is_empty_now(&dir) {
                        tracing::debug!(path = %dir.display(), "no longer empty, kept");
                        return None;
                    }
                    Some(match std::fs::remove_dir(&dir) {
                        Ok(()) => Ok(dir),
                        Err(e) => Err(ItemError::new(dir, format!("failed to remove: {e}"))),
                    })
                })
                .collect();

            for outcome in outcomes.into_iter().flatten() {
                match outcome {
                    Ok(dir) => {
                        tracing::debug!(path = %dir.display(), "removed empty directory");
                        removed.push(ScanEntry {
                            path: dir,
                            size_bytes: 0,
                        });
                    }
                    Err(err) => {
                        tracing::warn!("{err}");
                        errors.push(err);
                    }
                }
            }
        }
        if cancel.is_cancelled() {
            interrupted = true;
        }

        let count = removed.len();
        let mut result = ScanResult::from_entries(removed);
        result.errors = errors;
        result.interrupted = interrupted;
        Ok(result.with_note(format!("removed {count} empty directories")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_empty_chain_is_removed_bottom_up() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join("keep/empty")).unwrap();
        std::fs::write(root.join("keep/file.txt"), b"x").unwrap();

        let task = EmptyDirs::new(Some(root.to_path_buf()));
        let cancel = CancelToken::new();
        let found = task.estimate(&cancel).unwrap();
        let paths: Vec<_> = found.entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                root.join("a/b/c"),
                root.join("a/b"),
                root.join("keep/empty"),
                root.join("a"),
            ]
        );
        assert_eq!(found.total_bytes, 0);

        let reclaimed = task.reclaim(&cancel).unwrap();
        assert_eq!(reclaimed.entries.len(), 4);
        assert!(reclaimed.errors.is_empty());
        assert!(!root.join("a").exists());
        assert!(root.join("keep/file.txt").exists());
        assert!(root.exists());
    }

    #[test]
    fn protected_and_hidden_directories_stay() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("Documents")).unwrap();
        std::fs::create_dir_all(root.join(".config/empty")).unwrap();
        std::fs::create_dir_all(root.join("project/.hidden")).unwrap();

        let task = EmptyDirs::new(Some(root.to_path_buf()));
        let found = task.estimate(&CancelToken::new()).unwrap();
        assert!(found.entries.is_empty());
    }

    #[test]
    fn recheck_sees_late_writes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("racy")).unwrap();

        assert!(is_empty_now(&root.join("racy")));
        std::fs::write(root.join("racy/new.txt"), b"late").unwrap();
        assert!(!is_empty_now(&root.join("racy")));

        let task = EmptyDirs::new(Some(root.to_path_buf()));
        let reclaimed = task.reclaim(&CancelToken::new()).unwrap();
        assert!(reclaimed.entries.is_empty());
        assert!(root.join("racy/new.txt").exists());
    }
}
