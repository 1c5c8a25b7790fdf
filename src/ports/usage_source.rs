use async_trait::async_trait;

use crate::domain::FilesystemUsageEntry;
use crate::error::Result;

/// Port for sampling per-mount-point filesystem usage.
#[async_trait]
pub trait FilesystemUsageSource: Send + Sync {
    /// Usage for every non-pseudo mounted filesystem at this instant.
    async fn filesystem_usage(&self) -> Result<Vec<FilesystemUsageEntry>>;
}
