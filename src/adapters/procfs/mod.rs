mod parser;
mod sampler;

use std::path::PathBuf;

pub use sampler::SystemMetricsSampler;

/// Pseudo-file roots, overridable for container mounts.
#[derive(Debug, Clone)]
pub struct ProcfsPaths {
    pub proc_path: PathBuf,
    pub sys_path: PathBuf,
}

impl ProcfsPaths {
    pub fn new(proc_path: impl Into<PathBuf>, sys_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_path: proc_path.into(),
            sys_path: sys_path.into(),
        }
    }

    pub fn host() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
        }
    }
}

impl Default for ProcfsPaths {
    fn default() -> Self {
        Self::host()
    }
}
