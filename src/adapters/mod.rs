pub mod command;
pub mod lsblk;
pub mod procfs;
pub mod smart;

pub use command::SystemCommandRunner;
pub use lsblk::BlockDeviceInventory;
pub use procfs::{ProcfsPaths, SystemMetricsSampler};
pub use smart::{SmartHealthProbe, SMARTCTL_BIN};
