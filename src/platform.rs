use std::path::Path;
use std::sync::OnceLock;

use sysinfo::{DiskKind, Disks};

use crate::task::{Applicability, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            "linux" => OsFamily::Linux,
            _ => OsFamily::Other,
        }
    }
}

/// Storage medium of the volume the defragmenter would target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMedium {
    Rotational,
    SolidState,
    Unknown,
}

/// Read-only snapshot of what the host can do.
///
/// Computed once per process with [`PlatformCapabilities::current`]; tests
/// build arbitrary snapshots with [`PlatformCapabilities::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    os: OsFamily,
    medium: StorageMedium,
}

/// Snapshot for the running host, with the volume it was probed for.
static CURRENT: OnceLock<(String, PlatformCapabilities)> = OnceLock::new();

impl PlatformCapabilities {
    pub fn new(os: OsFamily, medium: StorageMedium) -> Self {
        Self { os, medium }
    }

    /// Process-wide snapshot for the running host.
    ///
    /// The medium is probed once, for the volume of the first call. Later
    /// calls get that same snapshot whatever `volume` they pass; use
    /// [`PlatformCapabilities::detect`] to probe another volume.
    pub fn current(volume: &str) -> &'static Self {
        let (probed, capabilities) =
            CURRENT.get_or_init(|| (volume.to_string(), Self::detect(volume)));
        if !probed.eq_ignore_ascii_case(volume) {
            tracing::warn!(
                probed = %probed,
                requested = volume,
                "capabilities already probed for another volume"
            );
        }
        capabilities
    }

    /// Probe the host. Medium detection only runs on Windows, the only
    /// place it matters.
    pub fn detect(volume: &str) -> Self {
        let os = OsFamily::current();
        let medium = if os == OsFamily::Windows {
            detect_medium(volume)
        } else {
            StorageMedium::Unknown
        };
        tracing::debug!(?os, ?medium, volume, "platform capabilities");
        Self { os, medium }
    }

    pub fn os(&self) -> OsFamily {
        self.os
    }

    pub fn medium(&self) -> StorageMedium {
        self.medium
    }

    /// Whether `id` may run here. An undetermined medium disables defrag.
    pub fn is_supported(&self, id: TaskId) -> bool {
        match id.descriptor().applicability {
            Applicability::Everywhere => true,
            Applicability::WindowsOnly => self.os == OsFamily::Windows,
            Applicability::WindowsHdd => {
                self.os == OsFamily::Windows && self.medium == StorageMedium::Rotational
            }
        }
    }
}

fn detect_medium(volume: &str) -> StorageMedium {
    let disks = Disks::new_with_refreshed_list();
    let Some(disk) = disks
        .list()
        .iter()
        .find(|d| mount_matches(d.mount_point(), volume))
    else {
        tracing::warn!(volume, "volume not found; treating medium as unknown");
        return StorageMedium::Unknown;
    };

    match disk.kind() {
        DiskKind::HDD => StorageMedium::Rotational,
        DiskKind::SSD => StorageMedium::SolidState,
        DiskKind::Unknown(_) => StorageMedium::Unknown,
    }
}

/// `C:` matches a mount point of `C:\`, case-insensitively.
fn mount_matches(mount_point: &Path, volume: &str) -> bool {
    let mount = mount_point.to_string_lossy();
    let mount = mount.trim_end_matches(['\\', '/']);
    let volume = volume.trim_end_matches(['\\', '/']);
    !volume.is_empty() && mount.eq_ignore_ascii_case(volume)
}
