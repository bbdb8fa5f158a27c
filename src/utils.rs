use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use walkdir::WalkDir;

/// Attempts per item before a removal failure is recorded.
const REMOVE_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_millis(50);

pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Compute total size of a directory recursively.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Get size of a file or directory. Symlinks count as their own size.
pub fn entry_size(path: &Path) -> u64 {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => dir_size(path),
        Ok(meta) => meta.len(),
        Err(_) => 0,
    }
}

/// Errors worth another attempt: the item may be briefly held open.
fn is_transient(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Remove a file or directory. Returns bytes freed on success.
///
/// Transient failures are retried a bounded number of times. A symlink is
/// removed itself, never its target.
pub fn safe_remove(path: &Path) -> Result<u64, io::Error> {
    let meta = path.symlink_metadata()?;
    let size = if meta.is_dir() {
        dir_size(path)
    } else {
        meta.len()
    };

    let mut attempt = 1;
    loop {
        let result = if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            std::fs::remove_file(path)
        };
        match result {
            Ok(()) => return Ok(size),
            Err(e) if attempt < REMOVE_ATTEMPTS && is_transient(&e) => {
                tracing::debug!(path = %path.display(), attempt, "retrying removal: {e}");
                attempt += 1;
                std::thread::sleep(RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Parse human-readable size string ("100MB") into bytes.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let upper = s.to_ascii_uppercase();
    let (num_str, multiplier) = if let Some(n) = upper.strip_suffix("TB") {
        (n, 1_099_511_627_776u64)
    } else if let Some(n) = upper.strip_suffix("GB") {
        (n, 1_073_741_824)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1_048_576)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1_024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        // assume bytes if no suffix
        (upper.as_str(), 1)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{}'", num_str.trim()))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    Ok((num * multiplier as f64) as u64)
}

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_099_511_627_776 {
        format!("{:.2} TB", bytes as f64 / 1_099_511_627_776.0)
    } else if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1_024 {
        format!("{:.2} KB", bytes as f64 / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Shorten a path for display by replacing home dir with ~.
pub fn display_path(path: &Path) -> String {
    if let Some(home) = home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}
