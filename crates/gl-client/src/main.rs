//! GridLink client — connects to the broker, issues the configured startup
//! subscriptions and retained publishes, then drives the connection.

use tracing_subscriber::EnvFilter;

use gl_client::config::ClientConfig;
use gl_client::startup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gridlink starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/gridlink/client.toml".to_string());

    let config = ClientConfig::from_file(&config_path)?;
    tracing::info!(
        path = %config_path,
        host = %config.broker.broker_host,
        client_id = %config.broker.client_id,
        "config loaded"
    );

    // ── Broker connection ───────────────────────────────────────
    let (client, driver) = gl_mqtt_channel::try_setup(&config.broker).await.map_err(|e| {
        tracing::error!(error = %e, "failed to initialize MQTT client");
        e
    })?;

    // The driver must be polling before startup requests fill the queue.
    let mut driver_task = tokio::spawn(driver.run());

    startup::run(&client, &config).await;

    tracing::info!("gridlink ready");

    tokio::select! {
        _ = &mut driver_task => {
            tracing::warn!("MQTT connection closed");
        }
        // Graceful shutdown on SIGINT
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    driver_task.abort();
    tracing::info!("gridlink stopped");
    Ok(())
}
