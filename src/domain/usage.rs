use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};

use super::block::{root_disk_by_naming, Topology};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Per-mount-point usage sample. Ephemeral, one per collection call.
#[derive(Debug, Clone)]
pub struct FilesystemUsageEntry {
    pub device: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

/// Display view of one partition's usage, attached to a disk record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskPartitionUsage {
    pub device: String,
    pub mount: String,
    pub total_gb: f64,
    pub used_gb: f64,
    pub used_percent: f64,
}

impl From<&FilesystemUsageEntry> for DiskPartitionUsage {
    fn from(entry: &FilesystemUsageEntry) -> Self {
        Self {
            device: entry.device.clone(),
            mount: entry.mount_point.clone(),
            total_gb: entry.total_bytes as f64 / BYTES_PER_GB,
            used_gb: entry.used_bytes as f64 / BYTES_PER_GB,
            used_percent: entry.used_percent,
        }
    }
}

/// Group filesystem usage entries by owning physical disk path.
///
/// Each entry's device path is resolved through symlinks to a canonical path
/// (falling back to the raw path), looked up against the topology by kname
/// and explicit path, and walked up parent links to its root disk. Entries
/// absent from the topology fall back to the partition naming convention.
/// Entries attributable to no disk by any of these are dropped.
pub fn group_usage_by_disk(
    entries: &[FilesystemUsageEntry],
    topology: &Topology,
) -> HashMap<String, Vec<DiskPartitionUsage>> {
    let mut groups: HashMap<String, Vec<DiskPartitionUsage>> = HashMap::new();

    for entry in entries {
        let canonical = fs::canonicalize(&entry.device)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| entry.device.clone());

        let root = topology
            .lookup_path(&canonical)
            .or_else(|| topology.lookup_path(&entry.device))
            .and_then(|dev| topology.resolve_root_disk(dev))
            .or_else(|| root_disk_by_naming(&canonical));

        if let Some(disk_path) = root {
            groups.entry(disk_path).or_default().push(entry.into());
        }
    }

    groups
}

/// Sum total/used GB over partitions, counting only entries with a positive
/// total and non-negative used figure. Excluded entries stay visible in the
/// partition list; they just contribute nothing to the sums.
pub fn aggregate_partitions(partitions: &[DiskPartitionUsage]) -> (f64, f64, f64) {
    let mut total_gb = 0.0;
    let mut used_gb = 0.0;

    for part in partitions {
        if part.total_gb > 0.0 && part.used_gb >= 0.0 {
            total_gb += part.total_gb;
            used_gb += part.used_gb;
        }
    }

    let used_percent = if total_gb > 0.0 {
        used_gb / total_gb * 100.0
    } else {
        0.0
    };

    (total_gb, used_gb, used_percent)
}
