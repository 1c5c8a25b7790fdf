use serde::{Deserialize, Serialize};

use super::usage::DiskPartitionUsage;

/// Overall SMART verdict for one device.
///
/// `Unavailable` marks a disk whose probe failed outright, so callers can
/// tell "not probed" apart from "probed and healthy".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmartStatus {
    Unknown,
    Unavailable,
    Disabled,
    Passed,
    Failed,
}

/// Storage media type inferred from the report or the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    Nvme,
    Sata,
    Mmc,
}

/// Alert codes derived from wear and SMART status. Codes may combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCode {
    WearWarn,
    WearErr,
    SmartFailed,
}

/// Health record for one physical disk. Constructed fresh per collection
/// call and immutable once returned; identity across calls is the device
/// path only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskHealthRecord {
    pub device: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub power_on_hours: u64,
    /// Rated write endurance consumed, 0-100. Zero means unknown or not
    /// applicable, not "brand new".
    pub wear_percent_used: u64,
    pub temperature_c: Option<f64>,
    /// Zero means unknown, not "zero days".
    pub days_left_estimate: u64,
    pub smart_status: SmartStatus,
    pub alerts: Vec<AlertCode>,
    pub total_gb: f64,
    pub used_gb: f64,
    pub used_percent: f64,
    pub partitions: Vec<DiskPartitionUsage>,
}

impl DiskHealthRecord {
    /// Placeholder for a disk that could not be probed at all. Numeric
    /// fields stay at zero; the record still appears in the batch.
    pub fn unavailable(device: impl Into<String>) -> Self {
        let device = device.into();
        let media_type = media_type_from_path(&device);
        Self {
            device,
            media_type,
            power_on_hours: 0,
            wear_percent_used: 0,
            temperature_c: None,
            days_left_estimate: 0,
            smart_status: SmartStatus::Unavailable,
            alerts: Vec::new(),
            total_gb: 0.0,
            used_gb: 0.0,
            used_percent: 0.0,
            partitions: Vec::new(),
        }
    }
}

/// Media type from the device naming convention, used before any report
/// attribute has had a chance to decide.
pub fn media_type_from_path(device_path: &str) -> MediaType {
    let name = device_path.strip_prefix("/dev/").unwrap_or(device_path);
    if name.starts_with("nvme") {
        MediaType::Nvme
    } else if name.starts_with("mmcblk") {
        MediaType::Mmc
    } else {
        MediaType::Sata
    }
}

const WEAR_WARN_THRESHOLD: u64 = 70;
const WEAR_ERR_THRESHOLD: u64 = 90;

/// Derive alert codes from a record's wear figure and SMART status.
pub fn compute_alerts(record: &DiskHealthRecord) -> Vec<AlertCode> {
    let mut alerts = Vec::new();

    if record.wear_percent_used >= WEAR_ERR_THRESHOLD {
        alerts.push(AlertCode::WearErr);
    } else if record.wear_percent_used >= WEAR_WARN_THRESHOLD {
        alerts.push(AlertCode::WearWarn);
    }

    if record.smart_status == SmartStatus::Failed {
        alerts.push(AlertCode::SmartFailed);
    }

    alerts
}

/// Estimate remaining lifetime in days from the observed wear rate.
///
/// Only meaningful when both wear and power-on hours are positive; otherwise
/// the estimate stays at zero, meaning unknown.
pub fn estimate_days_left(wear_percent_used: u64, power_on_hours: u64) -> u64 {
    if wear_percent_used == 0 || power_on_hours == 0 {
        return 0;
    }

    let wear = wear_percent_used as f64;
    let rate = wear / power_on_hours as f64;
    let hours_left = (100.0 - wear) / rate;
    (hours_left / 24.0).floor() as u64
}
