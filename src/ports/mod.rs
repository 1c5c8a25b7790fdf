pub mod command_executor;
pub mod usage_source;

pub use command_executor::CommandExecutor;
pub use usage_source::FilesystemUsageSource;
