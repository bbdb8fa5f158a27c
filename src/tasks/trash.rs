use std::path::Path;

use crate::cancel::CancelToken;
use crate::config::TrashLocation;
use crate::error::TaskError;
use crate::task::{ScanResult, Task, TaskId};

/// Sidecar extension used by the freedesktop trash layout.
const TRASHINFO_EXTENSION: &str = "trashinfo";

/// Items in the recycle bin / trash stores.
pub struct Trash {
    locations: Option<Vec<TrashLocation>>,
}

impl Trash {
    /// `None` means the platform has no locatable trash store.
    pub fn new(locations: Option<Vec<TrashLocation>>) -> Self {
        Self { locations }
    }

    fn locations(&self) -> Result<&[TrashLocation], TaskError> {
        self.locations
            .as_deref()
            .ok_or_else(|| TaskError::Unavailable("trash store".to_string()))
    }

    fn info_file(location: &TrashLocation, item: &Path) -> Option<std::path::PathBuf> {
        let info_dir = location.info.as_ref()?;
        let name = item.file_name()?;
        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(TRASHINFO_EXTENSION);
        Some(info_dir.join(file_name))
    }
}

impl Task for Trash {
    fn id(&self) -> TaskId {
        TaskId::Trash
    }

    fn discover(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let mut result = ScanResult::default();
        let mut inaccessible = 0;
        for location in self.locations()? {
            // desktop.ini is recycle bin bookkeeping, not user data
            let listed = super::top_level_entries(
                &location.files,
                |p| p.file_name().map_or(true, |n| n != "desktop.ini"),
                cancel,
                &mut result,
            );
            // another user's bin, not something this user can empty
            if let Err(e) = listed {
                tracing::debug!(store = %location.files.display(), "trash store skipped: {e}");
                inaccessible += 1;
            }
            if result.interrupted {
                break;
            }
        }
        if inaccessible > 0 {
            result = result.with_note(format!(
                "{inaccessible} trash store(s) not accessible to this user, skipped"
            ));
        }
        Ok(result)
    }

    fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        let locations = self.locations()?;
        let found = self.discover(cancel)?;
        let result = super::remove_entries(found, cancel);

        // Drop the metadata of everything that went away
        for entry in &result.entries {
            let info = locations
                .iter()
                .filter(|l| entry.path.starts_with(&l.files))
                .find_map(|l| Self::info_file(l, &entry.path));
            if let Some(info) = info {
                if let Err(e) = std::fs::remove_file(&info) {
                    tracing::debug!(path = %info.display(), "no trash metadata removed: {e}");
                }
            }
        }
        Ok(result)
    }
}
