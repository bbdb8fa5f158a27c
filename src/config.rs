use std::path::PathBuf;
use std::time::Duration;

use crate::utils;

/// Default threshold for the large-old finder: strictly larger than 100 MB.
pub const DEFAULT_LARGE_MIN_BYTES: u64 = 104_857_600;

/// Default age for the large-old finder: not modified for 30 days.
pub const DEFAULT_LARGE_MIN_AGE: Duration = Duration::from_secs(30 * 86_400);

/// Upper bound on concurrently running tasks.
pub const MAX_WORKERS: usize = 7;

/// A trash store: the directory holding trashed items, plus the sidecar
/// metadata directory when the platform keeps one (freedesktop `info/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashLocation {
    pub files: PathBuf,
    pub info: Option<PathBuf>,
}

/// Every location and threshold the tasks act on.
///
/// [`CleanupConfig::detect`] fills it from the running host. Tests and
/// callers can point individual fields somewhere else.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub temp_dirs: Vec<PathBuf>,
    /// `None` when no trash store could be located at all.
    pub trash_dirs: Option<Vec<TrashLocation>>,
    pub cache_dirs: Vec<PathBuf>,
    pub prefetch_dir: Option<PathBuf>,
    /// Drive passed to the defragmenter, e.g. `C:`.
    pub defrag_volume: String,
    /// Root for the large-old and empty-dirs walks.
    pub scan_root: Option<PathBuf>,
    pub large_min_bytes: u64,
    pub large_min_age: Duration,
    /// Worker threads for running tasks; `None` means one per task.
    pub workers: Option<usize>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            temp_dirs: Vec::new(),
            trash_dirs: Some(Vec::new()),
            cache_dirs: Vec::new(),
            prefetch_dir: None,
            defrag_volume: "C:".to_string(),
            scan_root: None,
            large_min_bytes: DEFAULT_LARGE_MIN_BYTES,
            large_min_age: DEFAULT_LARGE_MIN_AGE,
            workers: None,
        }
    }
}

impl CleanupConfig {
    /// Locations for the running host.
    pub fn detect() -> Self {
        let config = Self {
            temp_dirs: temp_dirs(),
            trash_dirs: trash_dirs(),
            cache_dirs: cache_dirs(),
            prefetch_dir: prefetch_dir(),
            defrag_volume: system_drive(),
            scan_root: utils::home_dir(),
            ..Self::default()
        };
        tracing::debug!(?config, "detected cleanup locations");
        config
    }

    pub fn with_scan_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scan_root = Some(root.into());
        self
    }

    pub fn with_large_thresholds(mut self, min_bytes: u64, min_age: Duration) -> Self {
        self.large_min_bytes = min_bytes;
        self.large_min_age = min_age;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.clamp(1, MAX_WORKERS));
        self
    }
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dir.as_os_str().is_empty() && !dirs.contains(&dir) {
        dirs.push(dir);
    }
}

fn temp_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(windows) {
        // TEMP and TMP usually point at the same place
        for var in ["TEMP", "TMP"] {
            if let Some(value) = std::env::var_os(var) {
                push_unique(&mut dirs, PathBuf::from(value));
            }
        }
    }
    push_unique(&mut dirs, std::env::temp_dir());
    dirs
}

fn system_drive() -> String {
    std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string())
}

fn trash_dirs() -> Option<Vec<TrashLocation>> {
    if cfg!(windows) {
        let bin = PathBuf::from(format!("{}\\", system_drive())).join("$Recycle.Bin");
        // One store per user SID
        let stores = match std::fs::read_dir(&bin) {
            Ok(rd) => rd
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .map(|files| TrashLocation { files, info: None })
                .collect(),
            Err(_) => Vec::new(),
        };
        return Some(stores);
    }

    let home = utils::home_dir()?;
    if cfg!(target_os = "macos") {
        return Some(vec![TrashLocation {
            files: home.join(".Trash"),
            info: None,
        }]);
    }

    let base = dirs::data_local_dir()
        .unwrap_or_else(|| home.join(".local/share"))
        .join("Trash");
    Some(vec![TrashLocation {
        files: base.join("files"),
        info: Some(base.join("info")),
    }])
}

fn cache_dirs() -> Vec<PathBuf> {
    if !cfg!(windows) {
        return dirs::cache_dir().into_iter().collect();
    }

    let mut found = Vec::new();
    let Some(local) = dirs::data_local_dir() else {
        return found;
    };

    // Chromium-based browsers keep Cache and Code Cache per profile
    for browser in ["Google\\Chrome", "Microsoft\\Edge"] {
        let user_data = local.join(browser).join("User Data");
        if let Ok(read_dir) = std::fs::read_dir(&user_data) {
            for entry in read_dir.flatten() {
                let profile = entry.path();
                for sub in ["Cache", "Code Cache"] {
                    let dir = profile.join(sub);
                    if dir.is_dir() {
                        found.push(dir);
                    }
                }
            }
        }
    }

    let firefox = local.join("Mozilla\\Firefox\\Profiles");
    if let Ok(read_dir) = std::fs::read_dir(&firefox) {
        for entry in read_dir.flatten() {
            let cache2 = entry.path().join("cache2");
            if cache2.is_dir() {
                found.push(cache2);
            }
        }
    }
    found
}

fn prefetch_dir() -> Option<PathBuf> {
    if !cfg!(windows) {
        return None;
    }
    std::env::var_os("WINDIR")
        .or_else(|| std::env::var_os("SystemRoot"))
        .map(|windir| PathBuf::from(windir).join("Prefetch"))
}
