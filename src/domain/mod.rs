pub mod block;
pub mod health;
pub mod stats;
pub mod usage;

pub use block::{BlockDevice, DeviceKind, Topology};
pub use health::{AlertCode, DiskHealthRecord, MediaType, SmartStatus};
pub use stats::SystemStats;
pub use usage::{DiskPartitionUsage, FilesystemUsageEntry};
