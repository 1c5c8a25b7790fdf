use std::collections::HashMap;

use crate::error::{Result, TelemetryError};

/// Parse /proc/uptime: elapsed boot seconds, truncated to an integer.
pub fn parse_uptime(content: &str) -> Result<u64> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| TelemetryError::ParseIncomplete("empty uptime file".to_string()))?;

    let uptime_secs = first
        .parse::<f64>()
        .map_err(|e| TelemetryError::ParseIncomplete(format!("invalid uptime value: {}", e)))?;

    Ok(uptime_secs as u64)
}

/// Parse /proc/loadavg, 1-minute figure only.
pub fn parse_load1(content: &str) -> Result<f64> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| TelemetryError::ParseIncomplete("empty loadavg file".to_string()))?;

    first
        .parse::<f64>()
        .map_err(|e| TelemetryError::ParseIncomplete(format!("invalid load 1min: {}", e)))
}

/// Cumulative CPU-time counters from the aggregate line of /proc/stat.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuCounters {
    pub idle: u64,
    pub total: u64,
}

/// Parse the first line of /proc/stat. Total is the sum of all jiffy
/// columns; idle is the fourth column.
pub fn parse_cpu_counters(content: &str) -> Result<CpuCounters> {
    let first_line = content
        .lines()
        .next()
        .ok_or_else(|| TelemetryError::ParseIncomplete("empty stat file".to_string()))?;

    if !first_line.starts_with("cpu ") {
        return Err(TelemetryError::ParseIncomplete("missing cpu line".to_string()));
    }

    let fields: Vec<u64> = first_line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();

    if fields.len() < 4 {
        return Err(TelemetryError::ParseIncomplete("incomplete cpu stat".to_string()));
    }

    Ok(CpuCounters {
        idle: fields[3],
        total: fields.iter().sum(),
    })
}

/// CPU utilization from two cumulative samples: `(1 - Δidle/Δtotal) * 100`.
///
/// A zero total delta means the window is undefined; that is an error for
/// this metric, never 0% or 100%.
pub fn cpu_percent_from_samples(first: CpuCounters, second: CpuCounters) -> Result<f64> {
    let total_delta = second.total.saturating_sub(first.total);
    if total_delta == 0 {
        return Err(TelemetryError::SampleWindowInvalid);
    }
    let idle_delta = second.idle.saturating_sub(first.idle);
    Ok((1.0 - idle_delta as f64 / total_delta as f64) * 100.0)
}

/// Memory totals from /proc/meminfo in MB. Buffers and page cache count as
/// reclaimable, so `used = total - free - buffers - cached`.
pub fn parse_memory_mb(content: &str) -> Result<(u64, u64)> {
    let mut kb: HashMap<&str, u64> = HashMap::new();

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest.trim().trim_end_matches(" kB").trim();
        if let Ok(v) = value.parse::<u64>() {
            kb.insert(key.trim(), v);
        }
    }

    let total = *kb.get("MemTotal").unwrap_or(&0);
    if total == 0 {
        return Err(TelemetryError::ParseIncomplete("MemTotal missing or zero".to_string()));
    }

    let free = *kb.get("MemFree").unwrap_or(&0);
    let buffers = *kb.get("Buffers").unwrap_or(&0);
    let cached = *kb.get("Cached").unwrap_or(&0);

    let used = total
        .saturating_sub(free)
        .saturating_sub(buffers)
        .saturating_sub(cached);

    Ok((total / 1024, used / 1024))
}

/// Parse a thermal-zone sensor reading.
pub fn parse_thermal_zone(content: &str) -> Result<f64> {
    let raw = content
        .trim()
        .parse::<f64>()
        .map_err(|e| TelemetryError::ParseIncomplete(format!("invalid thermal value: {}", e)))?;
    Ok(celsius_from_raw(raw))
}

/// Sensor values above 1000 are assumed to be millidegrees.
///
/// There is no authoritative unit field to confirm this; a genuine reading
/// above 1000 whole degrees would be misclassified, which does not happen on
/// real hardware.
pub fn celsius_from_raw(raw: f64) -> f64 {
    if raw > 1000.0 {
        raw / 1000.0
    } else {
        raw
    }
}

/// One /proc/mounts row that survived the pseudo-filesystem filter.
#[derive(Debug, Clone)]
pub struct MountInfo {
    pub device: String,
    pub mount_point: String,
}

/// Filesystems with no backing storage, excluded from usage sampling.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "proc", "sysfs", "tmpfs", "devtmpfs", "devpts", "cgroup", "cgroup2", "securityfs",
    "debugfs", "tracefs", "pstore", "overlay", "squashfs", "autofs", "ramfs", "fusectl",
    "configfs", "bpf", "mqueue", "hugetlbfs",
];

/// Parse /proc/mounts, dropping pseudo-filesystems.
pub fn parse_mounts(content: &str) -> Vec<MountInfo> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            if PSEUDO_FILESYSTEMS.contains(&parts[2]) {
                return None;
            }
            Some(MountInfo {
                device: parts[0].to_string(),
                mount_point: parts[1].to_string(),
            })
        })
        .collect()
}
