mod cache;
mod defrag;
mod empty_dirs;
mod large_old;
mod prefetch;
mod temp;
mod trash;

pub use cache::CacheFiles;
pub use defrag::Defrag;
pub use empty_dirs::EmptyDirs;
pub use large_old::LargeOldFiles;
pub use prefetch::PrefetchFiles;
pub use temp::TempFiles;
pub use trash::Trash;

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::task::{ItemError, ScanEntry, ScanResult};
use crate::utils;

/// List the direct children of `root` as scan entries, sized recursively.
///
/// A missing root contributes nothing. An unreadable one is returned to the
/// caller, which decides whether that is an item error or a skipped store.
pub(crate) fn top_level_entries(
    root: &Path,
    keep: impl Fn(&Path) -> bool,
    cancel: &CancelToken,
    result: &mut ScanResult,
) -> io::Result<()> {
    if !root.exists() {
        return Ok(());
    }

    for entry in std::fs::read_dir(root)?.flatten() {
        if cancel.is_cancelled() {
            result.interrupted = true;
            return Ok(());
        }
        let path = entry.path();
        if !keep(&path) {
            continue;
        }
        let size = utils::entry_size(&path);
        result.total_bytes += size;
        result.entries.push(ScanEntry {
            path,
            size_bytes: size,
        });
    }
    Ok(())
}

/// Top-level entries of every root, largest first. A root that cannot be
/// read is recorded as an error against the root.
pub(crate) fn scan_roots(roots: &[PathBuf], cancel: &CancelToken) -> ScanResult {
    let mut result = ScanResult::default();
    for root in roots {
        if let Err(e) = top_level_entries(root, |_| true, cancel, &mut result) {
            tracing::warn!(root = %root.display(), "cannot read directory: {e}");
            result
                .errors
                .push(ItemError::new(root, format!("cannot read directory: {e}")));
        }
        if result.interrupted {
            break;
        }
    }
    result
        .entries
        .sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.path.cmp(&b.path)));
    result
}

enum Removal {
    Removed(ScanEntry),
    Failed(ItemError),
    NotAttempted,
}

/// Delete every discovered entry independently.
///
/// Items are removed in parallel. One failure never stops the others, and
/// cancellation is checked before each item so no item is left half done
/// by an abort. The returned entries are the ones actually removed.
pub fn remove_entries(found: ScanResult, cancel: &CancelToken) -> ScanResult {
    let ScanResult {
        entries,
        mut errors,
        note,
        interrupted,
        ..
    } = found;

    let removals: Vec<Removal> = entries
        .into_par_iter()
        .map(|entry| {
            if cancel.is_cancelled() {
                return Removal::NotAttempted;
            }
            match utils::safe_remove(&entry.path) {
                Ok(freed) => {
                    tracing::debug!(path = %entry.path.display(), freed, "removed");
                    Removal::Removed(ScanEntry {
                        path: entry.path,
                        size_bytes: freed,
                    })
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path.display(), "failed to remove: {e}");
                    Removal::Failed(ItemError::new(entry.path, format!("failed to remove: {e}")))
                }
            }
        })
        .collect();

    let mut removed = Vec::new();
    let mut skipped_by_cancel = false;
    for removal in removals {
        match removal {
            Removal::Removed(entry) => removed.push(entry),
            Removal::Failed(err) => errors.push(err),
            Removal::NotAttempted => skipped_by_cancel = true,
        }
    }

    let mut result = ScanResult::from_entries(removed);
    result.errors = errors;
    result.note = note;
    result.interrupted = interrupted || skipped_by_cancel;
    result
}
