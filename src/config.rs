use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub proc_path: PathBuf,
    pub sys_path: PathBuf,
    pub smartctl_bin: String,
    pub command_timeout: Duration,
    pub cpu_sample_interval: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("HEALTHMON_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3030),
            proc_path: env::var("HEALTHMON_PROC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/proc")),
            sys_path: env::var("HEALTHMON_SYS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/sys")),
            smartctl_bin: env::var("HEALTHMON_SMARTCTL_BIN")
                .unwrap_or_else(|_| crate::adapters::SMARTCTL_BIN.to_string()),
            command_timeout: Duration::from_secs(
                env::var("HEALTHMON_CMD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            cpu_sample_interval: Duration::from_millis(
                env::var("HEALTHMON_CPU_SAMPLE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            log_level: env::var("HEALTHMON_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
