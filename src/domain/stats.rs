use serde::{Deserialize, Serialize};

use super::usage::DiskPartitionUsage;

/// Point-in-time system resource snapshot.
///
/// Every field is collected independently; a signal whose source failed is
/// left at its zero value without invalidating the rest of the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStats {
    pub uptime_sec: u64,
    pub cpu_load_1: f64,
    pub cpu_percent: f64,
    pub ram_total_mb: u64,
    pub ram_used_mb: u64,
    pub disk: Vec<DiskPartitionUsage>,
    pub temperature_c: f64,
}
