use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::adapters::{BlockDeviceInventory, SmartHealthProbe, SystemMetricsSampler};
use crate::domain::health::{compute_alerts, estimate_days_left};
use crate::domain::usage::{aggregate_partitions, group_usage_by_disk};
use crate::domain::{DiskHealthRecord, SystemStats, Topology};
use crate::error::Result;
use crate::ports::FilesystemUsageSource;

/// Main application service assembling the two telemetry products.
pub struct TelemetryService {
    inventory: BlockDeviceInventory,
    probe: SmartHealthProbe,
    usage_source: Arc<dyn FilesystemUsageSource>,
    sampler: Arc<SystemMetricsSampler>,
}

impl TelemetryService {
    pub fn new(
        inventory: BlockDeviceInventory,
        probe: SmartHealthProbe,
        usage_source: Arc<dyn FilesystemUsageSource>,
        sampler: Arc<SystemMetricsSampler>,
    ) -> Self {
        Self {
            inventory,
            probe,
            usage_source,
            sampler,
        }
    }

    /// One health record per physical disk.
    ///
    /// Probes run in parallel so the batch is bounded by the slowest device.
    /// A disk whose probe fails still appears as an UNAVAILABLE placeholder;
    /// failures never abort the batch. Only a failure to list devices at all
    /// is a hard error.
    pub async fn collect_disk_health(&self) -> Result<Vec<DiskHealthRecord>> {
        let disks = self.inventory.list_physical_disks().await?;

        let topology = match self.inventory.list_topology().await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "topology listing failed, falling back to naming convention");
                Topology::default()
            }
        };
        let sizes = topology.size_by_path();

        let usage = match self.usage_source.filesystem_usage().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "filesystem usage unavailable, disk records carry no usage");
                Vec::new()
            }
        };
        let mut groups = group_usage_by_disk(&usage, &topology);

        let paths: Vec<String> = disks.iter().map(|d| d.device_path()).collect();
        let results = join_all(paths.iter().map(|p| self.probe.probe(p))).await;

        let mut records = Vec::with_capacity(disks.len());
        for (device_path, result) in paths.iter().zip(results) {
            let mut record = match result {
                Ok(record) => record,
                Err(e) => {
                    // The placeholder keeps its zero numeric fields; usage
                    // data is not attached to a disk that was never probed.
                    warn!(device = %device_path, error = %e, "disk probe failed, reporting unavailable");
                    records.push(DiskHealthRecord::unavailable(device_path.as_str()));
                    continue;
                }
            };

            let partitions = groups.remove(device_path).unwrap_or_default();
            let (partition_total, used_gb, _) = aggregate_partitions(&partitions);

            // The physical disk's own size wins; the partition sum is only a
            // fallback for disks the size map does not cover.
            let total_gb = sizes
                .get(device_path)
                .copied()
                .filter(|v| *v > 0.0)
                .unwrap_or(partition_total);

            record.total_gb = total_gb;
            record.used_gb = used_gb;
            record.used_percent = if total_gb > 0.0 {
                used_gb / total_gb * 100.0
            } else {
                0.0
            };
            record.partitions = partitions;
            record.days_left_estimate =
                estimate_days_left(record.wear_percent_used, record.power_on_hours);
            record.alerts = compute_alerts(&record);

            records.push(record);
        }

        Ok(records)
    }

    /// Point-in-time system stats snapshot; individual signals degrade to
    /// zero values on failure.
    pub async fn collect_system_stats(&self) -> SystemStats {
        self.sampler.assemble().await
    }
}
