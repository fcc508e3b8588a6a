use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use common::{config::DashboardConfig, logger};
use dashboard::{DashboardRuntime, actors::Supervisor, console};
use gateway::{GatewayClient, TraderGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = DashboardConfig::from_env()?;
    logger::setup_logger(&config.log_filter).context("Invalid DASHBOARD_LOG filter")?;
    debug!("Dashboard starting up with {:?}", config);

    let client = GatewayClient::new(&config.api_url, config.request_timeout)?;
    match client.health().await {
        Ok(health) => info!(
            "Backend at {} is {} ({} active traders)",
            client.base_url(),
            health.status,
            health
                .active_traders
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string())
        ),
        Err(e) => warn!("Backend health check failed, polling anyway: {}", e),
    }

    let gateway: Arc<dyn TraderGateway> = Arc::new(client);
    let runtime = DashboardRuntime::new(gateway, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut supervisor = Supervisor::new();
    runtime.register_actors(&mut supervisor, shutdown_rx.clone());

    let console_runtime = runtime.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = console::run(console_runtime) => {
                if let Err(e) = result {
                    warn!("Console stopped: {}", e);
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for ctrl-c: {}", e);
                }
            }
        }
        info!("Shutting down dashboard");
        let _ = shutdown_tx.send(true);
    });

    supervisor.start(shutdown_rx).await;
    Ok(())
}
