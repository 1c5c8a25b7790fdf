use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::{health::media_type_from_path, DiskHealthRecord, MediaType, SmartStatus};
use crate::error::Result;
use crate::ports::CommandExecutor;

/// Default diagnostic tool, located via PATH.
pub const SMARTCTL_BIN: &str = "smartctl";

/// SATA attribute-table rows that carry a drive temperature in the last
/// numeric column.
const TEMPERATURE_ATTRIBUTES: &[&str] = &[
    "Temperature_Celsius",
    "Temperature_Internal",
    "Airflow_Temperature_Cel",
    "Drive_Temperature",
];

/// Runs the per-device diagnostic tool and normalizes its text report.
pub struct SmartHealthProbe {
    runner: Arc<dyn CommandExecutor>,
    bin: String,
    timeout: Duration,
}

impl SmartHealthProbe {
    pub fn new(runner: Arc<dyn CommandExecutor>, bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            bin: bin.into(),
            timeout,
        }
    }

    /// Probe one device. A tool failure that still produced output is
    /// parsed as a partial report; a failure with no output at all means
    /// the device is unreachable and is a hard error.
    pub async fn probe(&self, device_path: &str) -> Result<DiskHealthRecord> {
        let report = match self
            .runner
            .run_privileged(&self.bin, &["-a", device_path], self.timeout)
            .await
        {
            Ok(out) => out,
            Err(err) => match err.partial_output() {
                Some(out) => {
                    warn!(device = device_path, error = %err, "diagnostic tool failed, parsing partial report");
                    out.to_string()
                }
                None => return Err(err),
            },
        };

        Ok(parse_report(device_path, &report))
    }
}

/// Line-by-line, case-insensitive scan of a health report.
///
/// Each signal has its own matcher so vendor-format quirks stay isolated:
/// status (a later marker overrides an earlier one), wear, power-on hours
/// (labeled line preferred over the attribute table) and temperature (an
/// attribute-table match is never overwritten). An unparsable row leaves its
/// field absent; it never aborts the probe.
pub fn parse_report(device_path: &str, report: &str) -> DiskHealthRecord {
    let mut media_type = media_type_from_path(device_path);
    let mut status = SmartStatus::Unknown;
    let mut wear: u64 = 0;
    let mut power_on_hours: u64 = 0;
    let mut poh_from_label = false;
    let mut temperature: Option<f64> = None;
    let mut temp_from_attr = false;

    for raw_line in report.lines() {
        let line = raw_line.trim();
        let lower = line.to_ascii_lowercase();

        if let Some(s) = match_status_marker(&lower) {
            status = s;
        }

        if let Some(w) = match_wear(&lower) {
            // Percentage Used is an NVMe-only attribute.
            wear = w.min(100);
            media_type = MediaType::Nvme;
        }

        if let Some(h) = match_power_on_hours_label(&lower) {
            if !poh_from_label {
                power_on_hours = h;
                poh_from_label = true;
            }
        } else if !poh_from_label && power_on_hours == 0 {
            if let Some(h) = match_power_on_hours_attr(line) {
                power_on_hours = h;
            }
        }

        if let Some(t) = match_temperature_attr(line) {
            if !temp_from_attr {
                temperature = Some(t);
                temp_from_attr = true;
            }
        } else if !temp_from_attr && temperature.is_none() {
            temperature = match_temperature_generic(&lower);
        }
    }

    DiskHealthRecord {
        device: device_path.to_string(),
        media_type,
        power_on_hours,
        wear_percent_used: wear,
        temperature_c: temperature,
        days_left_estimate: 0,
        smart_status: status,
        alerts: Vec::new(),
        total_gb: 0.0,
        used_gb: 0.0,
        used_percent: 0.0,
        partitions: Vec::new(),
    }
}

/// Explicit PASS/FAIL self-assessment, the NVMe/SCSI "Health Status: OK"
/// form, or an unsupported/disabled marker. Reports may contain a
/// preliminary marker followed by an authoritative one, so the caller lets
/// a later match win.
fn match_status_marker(lower: &str) -> Option<SmartStatus> {
    if lower.contains("self-assessment") {
        if lower.contains("passed") {
            return Some(SmartStatus::Passed);
        }
        if lower.contains("failed") {
            return Some(SmartStatus::Failed);
        }
    }
    if lower.contains("health status: ok") {
        return Some(SmartStatus::Passed);
    }
    if lower.contains("smart support is: unavailable") {
        return Some(SmartStatus::Unavailable);
    }
    if lower.contains("smart support is: disabled") {
        return Some(SmartStatus::Disabled);
    }
    None
}

/// First integer on the "Percentage Used" line.
fn match_wear(lower: &str) -> Option<u64> {
    if !lower.contains("percentage used") {
        return None;
    }
    first_uint(lower)
}

/// Labeled NVMe-style "Power On Hours: N" line.
fn match_power_on_hours_label(lower: &str) -> Option<u64> {
    if !lower.contains("power on hours") {
        return None;
    }
    first_uint(lower)
}

/// SATA attribute-table row named Power_On_Hours; the raw value sits in the
/// row's last numeric column.
fn match_power_on_hours_attr(line: &str) -> Option<u64> {
    let cols: Vec<&str> = line.split_whitespace().collect();
    if cols.len() < 3 || !cols[1].eq_ignore_ascii_case("power_on_hours") {
        return None;
    }
    last_numeric_column(&cols[2..])
}

/// Named SATA temperature attribute rows, last-column convention.
fn match_temperature_attr(line: &str) -> Option<f64> {
    let cols: Vec<&str> = line.split_whitespace().collect();
    if cols.len() < 3 {
        return None;
    }
    if !TEMPERATURE_ATTRIBUTES
        .iter()
        .any(|name| cols[1].eq_ignore_ascii_case(name))
    {
        return None;
    }
    last_numeric_column(&cols[2..]).map(|v| v as f64)
}

/// Fallback for reports without an attribute table: any "temperature: N"
/// line that is not about a warning/threshold/critical limit.
fn match_temperature_generic(lower: &str) -> Option<f64> {
    if !lower.contains("temperature") {
        return None;
    }
    if lower.contains("warning") || lower.contains("threshold") || lower.contains("critical") {
        return None;
    }
    let (_, after) = lower.split_once(':')?;
    first_decimal(after)
}

/// First contiguous run of digits, skipping everything before it.
fn first_uint(s: &str) -> Option<u64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Like [`first_uint`] but allows a single decimal point.
fn first_decimal(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let mut end = start;
    let mut seen_dot = false;
    for (i, c) in s[start..].char_indices() {
        if c.is_ascii_digit() {
            end = start + i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
    }
    s[start..end].parse().ok()
}

fn last_numeric_column(cols: &[&str]) -> Option<u64> {
    cols.iter().rev().find_map(|c| c.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::TelemetryError;

    const NVME_REPORT: &str = "\
smartctl 7.3 2022-02-28 r5338 [x86_64-linux-6.1.0] (local build)

=== START OF SMART DATA SECTION ===
SMART overall-health self-assessment test result: PASSED

SMART/Health Information (NVMe Log 0x02)
Critical Warning:                   0x00
Temperature:                        38 Celsius
Available Spare:                    100%
Percentage Used:                    3%
Data Units Read:                    12,477,104 [6.38 TB]
Power Cycles:                       1,733
Power On Hours:                     4520
Unsafe Shutdowns:                   57
Warning  Comp. Temperature Time:    0
Critical Comp. Temperature Time:    0
";

    const SATA_REPORT: &str = "\
=== START OF READ SMART DATA SECTION ===
SMART overall-health self-assessment test result: PASSED

ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
  9 Power_On_Hours          0x0032   096   096   000    Old_age   Always       -       18327
194 Temperature_Celsius     0x0022   035   041   000    Old_age   Always       -       35
";

    #[test]
    fn test_nvme_report() {
        let record = parse_report("/dev/nvme0n1", NVME_REPORT);
        assert_eq!(record.smart_status, SmartStatus::Passed);
        assert_eq!(record.media_type, MediaType::Nvme);
        assert_eq!(record.wear_percent_used, 3);
        assert_eq!(record.power_on_hours, 4520);
        assert_eq!(record.temperature_c, Some(38.0));
    }

    #[test]
    fn test_sata_report() {
        let record = parse_report("/dev/sda", SATA_REPORT);
        assert_eq!(record.smart_status, SmartStatus::Passed);
        assert_eq!(record.media_type, MediaType::Sata);
        assert_eq!(record.wear_percent_used, 0);
        assert_eq!(record.power_on_hours, 18327);
        assert_eq!(record.temperature_c, Some(35.0));
    }

    #[test]
    fn test_health_status_ok_line_passes() {
        let record = parse_report("/dev/sda", "SMART Health Status: OK\n");
        assert_eq!(record.smart_status, SmartStatus::Passed);
    }

    #[test]
    fn test_later_status_marker_overrides_earlier() {
        let report = "\
SMART Health Status: OK
SMART overall-health self-assessment test result: FAILED!
";
        let record = parse_report("/dev/sda", report);
        assert_eq!(record.smart_status, SmartStatus::Failed);
    }

    #[test]
    fn test_support_markers() {
        let record = parse_report(
            "/dev/sda",
            "SMART support is: Unavailable - device lacks SMART capability.\n",
        );
        assert_eq!(record.smart_status, SmartStatus::Unavailable);

        let record = parse_report(
            "/dev/sda",
            "SMART support is: Available\nSMART support is: Disabled\n",
        );
        assert_eq!(record.smart_status, SmartStatus::Disabled);
    }

    #[test]
    fn test_status_defaults_to_unknown() {
        let record = parse_report("/dev/sda", "no markers here\n");
        assert_eq!(record.smart_status, SmartStatus::Unknown);
    }

    #[test]
    fn test_percentage_used_forces_nvme_type() {
        let record = parse_report("/dev/sda", "Percentage Used: 12%\n");
        assert_eq!(record.media_type, MediaType::Nvme);
        assert_eq!(record.wear_percent_used, 12);
    }

    #[test]
    fn test_mmc_type_from_path() {
        let record = parse_report("/dev/mmcblk0", "");
        assert_eq!(record.media_type, MediaType::Mmc);
    }

    #[test]
    fn test_attr_temperature_not_overridden_by_critical_line() {
        let report = "\
194 Temperature_Celsius     0x0022   035   041   000    Old_age   Always       -       35
Temperature warning critical 60
";
        let record = parse_report("/dev/sda", report);
        assert_eq!(record.temperature_c, Some(35.0));
    }

    #[test]
    fn test_attr_temperature_replaces_earlier_generic_match() {
        let report = "\
Temperature: 38 Celsius
190 Airflow_Temperature_Cel 0x0022   060   050   045    Old_age   Always       -       40
";
        let record = parse_report("/dev/sda", report);
        assert_eq!(record.temperature_c, Some(40.0));
    }

    #[test]
    fn test_generic_temperature_skips_limit_lines() {
        let report = "\
Warning  Comp. Temperature Threshold:     70 Celsius
Current Drive Temperature:     29 C
";
        let record = parse_report("/dev/sda", report);
        assert_eq!(record.temperature_c, Some(29.0));
    }

    #[test]
    fn test_generic_temperature_allows_decimal() {
        let record = parse_report("/dev/sda", "Temperature: 36.5 Celsius\n");
        assert_eq!(record.temperature_c, Some(36.5));
    }

    #[test]
    fn test_labeled_power_on_hours_wins_over_attr_row() {
        let report = "\
  9 Power_On_Hours          0x0032   096   096   000    Old_age   Always       -       18327
Power On Hours:                     4520
";
        let record = parse_report("/dev/sda", report);
        assert_eq!(record.power_on_hours, 4520);
    }

    #[test]
    fn test_unparsable_rows_leave_fields_absent() {
        let report = "\
Percentage Used: n/a
  9 Power_On_Hours garbled
";
        let record = parse_report("/dev/nvme0n1", report);
        assert_eq!(record.wear_percent_used, 0);
        assert_eq!(record.power_on_hours, 0);
        assert_eq!(record.temperature_c, None);
    }

    #[test]
    fn test_first_uint_skips_leading_noise() {
        assert_eq!(first_uint("value = 42%"), Some(42));
        assert_eq!(first_uint("no digits"), None);
    }

    #[test]
    fn test_wear_is_clamped_to_100() {
        let record = parse_report("/dev/nvme0n1", "Percentage Used: 250%\n");
        assert_eq!(record.wear_percent_used, 100);
    }

    /// Executor whose unprivileged attempt exits non-zero but still emits a
    /// report, while escalation is not available at all.
    struct DeniedWithReport(&'static str);

    #[async_trait]
    impl crate::ports::CommandExecutor for DeniedWithReport {
        async fn run(
            &self,
            name: &str,
            _args: &[&str],
            _timeout: Duration,
        ) -> crate::error::Result<String> {
            Err(TelemetryError::CommandFailed {
                tool: name.to_string(),
                code: Some(64),
                output: self.0.to_string(),
            })
        }

        async fn run_privileged(
            &self,
            name: &str,
            args: &[&str],
            timeout: Duration,
        ) -> crate::error::Result<String> {
            let unprivileged = self.run(name, args, timeout).await.unwrap_err();
            Err(TelemetryError::PrivilegeDenied {
                tool: name.to_string(),
                unprivileged: Box::new(unprivileged),
                escalated: Box::new(TelemetryError::ToolUnavailable {
                    tool: "sudo".to_string(),
                }),
            })
        }
    }

    #[tokio::test]
    async fn test_probe_parses_report_from_failed_unprivileged_run() {
        let report = "\
SMART overall-health self-assessment test result: FAILED!
  9 Power_On_Hours          0x0032   096   096   000    Old_age   Always       -       18327
";
        let probe = SmartHealthProbe::new(
            Arc::new(DeniedWithReport(report)),
            "smartctl",
            Duration::from_secs(5),
        );

        let record = probe.probe("/dev/sda").await.unwrap();
        assert_eq!(record.smart_status, SmartStatus::Failed);
        assert_eq!(record.power_on_hours, 18327);
    }

    #[tokio::test]
    async fn test_probe_with_no_output_is_a_hard_error() {
        struct Silent;

        #[async_trait]
        impl crate::ports::CommandExecutor for Silent {
            async fn run(
                &self,
                name: &str,
                _args: &[&str],
                _timeout: Duration,
            ) -> crate::error::Result<String> {
                Err(TelemetryError::ToolUnavailable {
                    tool: name.to_string(),
                })
            }

            async fn run_privileged(
                &self,
                name: &str,
                args: &[&str],
                timeout: Duration,
            ) -> crate::error::Result<String> {
                self.run(name, args, timeout).await
            }
        }

        let probe = SmartHealthProbe::new(Arc::new(Silent), "smartctl", Duration::from_secs(5));
        let err = probe.probe("/dev/sda").await.unwrap_err();
        assert!(matches!(err, TelemetryError::ToolUnavailable { .. }));
    }
}
