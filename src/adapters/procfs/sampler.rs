use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{DiskPartitionUsage, FilesystemUsageEntry, SystemStats};
use crate::error::Result;
use crate::ports::FilesystemUsageSource;

use super::parser;
use super::ProcfsPaths;

/// Collects uptime, load, CPU percent, memory, temperature and filesystem
/// usage from OS pseudo-files.
///
/// Every signal is point-in-time and collected independently; callers get a
/// snapshot where a failed signal is simply left at its zero value.
pub struct SystemMetricsSampler {
    paths: ProcfsPaths,
    cpu_sample_interval: Duration,
}

impl SystemMetricsSampler {
    pub fn new(paths: ProcfsPaths, cpu_sample_interval: Duration) -> Self {
        Self {
            paths,
            cpu_sample_interval,
        }
    }

    pub fn uptime(&self) -> Result<u64> {
        let content = fs::read_to_string(self.paths.proc_path.join("uptime"))?;
        parser::parse_uptime(&content)
    }

    pub fn load_average_1m(&self) -> Result<f64> {
        let content = fs::read_to_string(self.paths.proc_path.join("loadavg"))?;
        parser::parse_load1(&content)
    }

    /// Two-sample delta measurement. Suspends the calling task for the
    /// sampling interval; concurrent callers each run an independent window
    /// with no shared counters.
    pub async fn cpu_percent(&self) -> Result<f64> {
        let stat_path = self.paths.proc_path.join("stat");

        let first = parser::parse_cpu_counters(&fs::read_to_string(&stat_path)?)?;
        tokio::time::sleep(self.cpu_sample_interval).await;
        let second = parser::parse_cpu_counters(&fs::read_to_string(&stat_path)?)?;

        parser::cpu_percent_from_samples(first, second)
    }

    /// RAM (total, used) in MB.
    pub fn memory_mb(&self) -> Result<(u64, u64)> {
        let content = fs::read_to_string(self.paths.proc_path.join("meminfo"))?;
        parser::parse_memory_mb(&content)
    }

    pub fn temperature_c(&self) -> Result<f64> {
        let content = fs::read_to_string(
            self.paths
                .sys_path
                .join("class/thermal/thermal_zone0/temp"),
        )?;
        parser::parse_thermal_zone(&content)
    }

    fn collect_filesystem_usage(&self) -> Result<Vec<FilesystemUsageEntry>> {
        let content = fs::read_to_string(self.paths.proc_path.join("mounts"))?;
        let mut entries = Vec::new();

        for mount in parser::parse_mounts(&content) {
            // A stale or unreadable mount only loses its own entry.
            let Ok(stat) = nix::sys::statvfs::statvfs(mount.mount_point.as_str()) else {
                continue;
            };

            let block_size = stat.fragment_size() as u64;
            let total_bytes = stat.blocks() as u64 * block_size;
            let free_bytes = stat.blocks_free() as u64 * block_size;
            let used_bytes = total_bytes.saturating_sub(free_bytes);
            let used_percent = if total_bytes > 0 {
                used_bytes as f64 / total_bytes as f64 * 100.0
            } else {
                0.0
            };

            entries.push(FilesystemUsageEntry {
                device: mount.device,
                mount_point: mount.mount_point,
                total_bytes,
                used_bytes,
                used_percent,
            });
        }

        Ok(entries)
    }

    /// Assemble a full stats snapshot. Signals run independently; a failure
    /// in any one leaves that field at its zero value without aborting the
    /// others.
    pub async fn assemble(&self) -> SystemStats {
        let mut stats = SystemStats::default();

        match self.uptime() {
            Ok(v) => stats.uptime_sec = v,
            Err(e) => warn!(error = %e, "uptime unavailable"),
        }
        match self.load_average_1m() {
            Ok(v) => stats.cpu_load_1 = v,
            Err(e) => warn!(error = %e, "load average unavailable"),
        }
        match self.cpu_percent().await {
            Ok(v) => stats.cpu_percent = v,
            Err(e) => warn!(error = %e, "cpu percent unavailable"),
        }
        match self.memory_mb() {
            Ok((total, used)) => {
                stats.ram_total_mb = total;
                stats.ram_used_mb = used;
            }
            Err(e) => warn!(error = %e, "memory info unavailable"),
        }
        match self.collect_filesystem_usage() {
            Ok(entries) => {
                stats.disk = entries.iter().map(DiskPartitionUsage::from).collect();
            }
            Err(e) => warn!(error = %e, "filesystem usage unavailable"),
        }
        match self.temperature_c() {
            Ok(v) => stats.temperature_c = v,
            Err(e) => warn!(error = %e, "temperature unavailable"),
        }

        stats
    }
}

#[async_trait]
impl FilesystemUsageSource for SystemMetricsSampler {
    async fn filesystem_usage(&self) -> Result<Vec<FilesystemUsageEntry>> {
        self.collect_filesystem_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler_at(dir: &std::path::Path) -> SystemMetricsSampler {
        SystemMetricsSampler::new(
            ProcfsPaths::new(dir.join("proc"), dir.join("sys")),
            Duration::from_millis(10),
        )
    }

    fn write(path: &std::path::Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_assemble_degrades_per_signal() {
        // Only uptime and meminfo exist; everything else stays at zero.
        let dir = std::env::temp_dir().join(format!("healthmon-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        write(&dir.join("proc/uptime"), "500.25 1000.0\n");
        write(
            &dir.join("proc/meminfo"),
            "MemTotal: 2048000 kB\nMemFree: 1024000 kB\nBuffers: 0 kB\nCached: 0 kB\n",
        );

        let stats = sampler_at(&dir).assemble().await;

        assert_eq!(stats.uptime_sec, 500);
        assert_eq!(stats.ram_total_mb, 2000);
        assert_eq!(stats.ram_used_mb, 1000);
        assert_eq!(stats.cpu_load_1, 0.0);
        assert_eq!(stats.cpu_percent, 0.0);
        assert_eq!(stats.temperature_c, 0.0);
        assert!(stats.disk.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_cpu_percent_uses_independent_window() {
        let dir = std::env::temp_dir().join(format!("healthmon-cpu-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        // Counters never move between the two reads: invalid window.
        write(&dir.join("proc/stat"), "cpu  100 0 100 800 0 0 0 0\n");

        let err = sampler_at(&dir).cpu_percent().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::TelemetryError::SampleWindowInvalid
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
