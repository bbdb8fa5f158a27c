use std::collections::BTreeSet;

use crate::config::CleanupConfig;
use crate::platform::PlatformCapabilities;
use crate::task::{Task, TaskId};
use crate::tasks;

/// Requested ids partitioned against the platform, each in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub applicable: Vec<TaskId>,
    pub skipped: Vec<TaskId>,
}

/// Resolves selections and validates them against a capability snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TaskRegistry<'a> {
    capabilities: &'a PlatformCapabilities,
}

impl<'a> TaskRegistry<'a> {
    pub fn new(capabilities: &'a PlatformCapabilities) -> Self {
        Self { capabilities }
    }

    /// `expand_all` replaces the request with every task. Duplicates
    /// collapse; request order does not matter. Never fails.
    pub fn resolve(
        &self,
        requested: impl IntoIterator<Item = TaskId>,
        expand_all: bool,
    ) -> Resolution {
        let selected: BTreeSet<TaskId> = if expand_all {
            TaskId::ALL.into_iter().collect()
        } else {
            requested.into_iter().collect()
        };

        let (applicable, skipped): (Vec<TaskId>, Vec<TaskId>) = selected
            .into_iter()
            .partition(|id| self.capabilities.is_supported(*id));
        Resolution {
            applicable,
            skipped,
        }
    }
}

/// Builds a fresh task instance for each run.
pub trait TaskFactory: Send + Sync {
    fn create(&self, id: TaskId) -> Box<dyn Task>;
}

/// Builds the real tasks from a [`CleanupConfig`].
#[derive(Debug, Clone)]
pub struct DefaultTaskFactory {
    config: CleanupConfig,
}

impl DefaultTaskFactory {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }
}

impl TaskFactory for DefaultTaskFactory {
    fn create(&self, id: TaskId) -> Box<dyn Task> {
        let config = &self.config;
        match id {
            TaskId::Temp => Box::new(tasks::TempFiles::new(config.temp_dirs.clone())),
            TaskId::Trash => Box::new(tasks::Trash::new(config.trash_dirs.clone())),
            TaskId::Cache => Box::new(tasks::CacheFiles::new(config.cache_dirs.clone())),
            TaskId::Prefetch => Box::new(tasks::PrefetchFiles::new(config.prefetch_dir.clone())),
            TaskId::Defrag => Box::new(tasks::Defrag::new(config.defrag_volume.clone())),
            TaskId::LargeOld => Box::new(tasks::LargeOldFiles::new(
                config.scan_root.clone(),
                config.large_min_bytes,
                config.large_min_age,
            )),
            TaskId::EmptyDirs => Box::new(tasks::EmptyDirs::new(config.scan_root.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsFamily, StorageMedium};

    fn linux() -> PlatformCapabilities {
        PlatformCapabilities::new(OsFamily::Linux, StorageMedium::Unknown)
    }

    #[test]
    fn output_is_canonical_not_request_order() {
        let caps = linux();
        let resolution = TaskRegistry::new(&caps).resolve(
            [TaskId::EmptyDirs, TaskId::Prefetch, TaskId::Temp, TaskId::Temp],
            false,
        );
        assert_eq!(resolution.applicable, vec![TaskId::Temp, TaskId::EmptyDirs]);
        assert_eq!(resolution.skipped, vec![TaskId::Prefetch]);
    }

    #[test]
    fn all_dominates_explicit_ids() {
        let caps = linux();
        let registry = TaskRegistry::new(&caps);
        let alone = registry.resolve([], true);
        let mixed = registry.resolve([TaskId::Trash, TaskId::Defrag], true);
        assert_eq!(alone, mixed);
        assert_eq!(alone.applicable.len() + alone.skipped.len(), 7);
        assert_eq!(alone.skipped, vec![TaskId::Prefetch, TaskId::Defrag]);
    }

    #[test]
    fn empty_request_resolves_to_nothing() {
        let caps = linux();
        assert_eq!(TaskRegistry::new(&caps).resolve([], false), Resolution::default());
    }

    #[test]
    fn windows_hdd_runs_everything() {
        let caps = PlatformCapabilities::new(OsFamily::Windows, StorageMedium::Rotational);
        let resolution = TaskRegistry::new(&caps).resolve([], true);
        assert_eq!(resolution.applicable, TaskId::ALL.to_vec());
        assert!(resolution.skipped.is_empty());
    }

    #[test]
    fn factory_builds_matching_ids() {
        let factory = DefaultTaskFactory::new(CleanupConfig::default());
        for id in TaskId::ALL {
            assert_eq!(factory.create(id).id(), id);
        }
    }
}
