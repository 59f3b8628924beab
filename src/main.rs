use anyhow::Context;
use prober::config::ServerConfig;
use prober::delays::DelayConfig;
use prober::server::{
    create_metrics, run_server, shutdown_channel, wait_for_signal, DrainOutcome, ServerState,
    ShutdownCoordinator,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting prober");

    let config = ServerConfig::from_env();
    let delays = DelayConfig::from_env();
    let snapshot = delays.snapshot();
    info!(
        startup_secs = snapshot.startup.delay.as_secs(),
        readiness_secs = snapshot.readiness.delay.as_secs(),
        liveness_secs = snapshot.liveness.delay.as_secs(),
        shutdown_timeout_secs = config.shutdown_timeout.as_secs(),
        "Probe delays loaded"
    );

    let metrics = create_metrics().context("Failed to create metrics registry")?;

    // Create shutdown channel for coordinated shutdown
    let (shutdown_controller, shutdown_signal) = shutdown_channel();

    let state = ServerState::new(delays, metrics, shutdown_signal);
    let server = tokio::spawn(run_server(config.port, state));

    let coordinator = ShutdownCoordinator::new(shutdown_controller, config.shutdown_timeout);
    match coordinator.run(server, wait_for_signal()).await {
        DrainOutcome::Drained => info!("Shut down gracefully"),
        DrainOutcome::ForcedClose => warn!("Shut down with requests still in flight"),
        DrainOutcome::ServerFailed(reason) => {
            warn!(error = %reason, "Shut down after server failure")
        }
    }

    // Shutdown errors are logged, never turned into a failing exit code
    info!("Server exiting");
    Ok(())
}
