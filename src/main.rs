mod adapters;
mod application;
mod config;
mod domain;
mod error;
mod interface;
mod ports;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{
    BlockDeviceInventory, ProcfsPaths, SmartHealthProbe, SystemCommandRunner,
    SystemMetricsSampler,
};
use application::TelemetryService;
use config::Config;
use interface::http::create_router;
use ports::{CommandExecutor, FilesystemUsageSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("healthmon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting healthmon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Initialize adapters
    let runner: Arc<dyn CommandExecutor> = Arc::new(SystemCommandRunner::new());

    let inventory = BlockDeviceInventory::new(runner.clone(), config.command_timeout);
    let probe = SmartHealthProbe::new(
        runner.clone(),
        config.smartctl_bin.clone(),
        config.command_timeout,
    );

    let sampler = Arc::new(SystemMetricsSampler::new(
        ProcfsPaths::new(config.proc_path.clone(), config.sys_path.clone()),
        config.cpu_sample_interval,
    ));

    // Create telemetry service; the sampler doubles as the usage source for
    // disk records.
    let telemetry = Arc::new(TelemetryService::new(
        inventory,
        probe,
        sampler.clone() as Arc<dyn FilesystemUsageSource>,
        sampler,
    ));

    info!("✓ Telemetry service initialized");

    // Create HTTP server
    let app = create_router(telemetry);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ healthmon listening on {}", addr);
    info!("  → Disk health: http://localhost:{}/api/disks", config.port);
    info!("  → System stats: http://localhost:{}/api/stats", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
