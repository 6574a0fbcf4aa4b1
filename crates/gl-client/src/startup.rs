//! Startup actions run against a freshly constructed client.

use gl_mqtt_channel::{BrokerClient, Channel};

use crate::config::ClientConfig;

/// Issue the configured subscriptions and retained publishes.
///
/// Neither waits for the connection; requests queue until the driver
/// connects. Skips the subscribe call entirely when no topics are configured.
pub async fn run<C: Channel>(client: &BrokerClient<C>, config: &ClientConfig) {
    if !config.subscribe.is_empty() {
        client.subscribe(config.subscribe.iter().cloned()).await;
    }

    for msg in &config.publish {
        client.publish(&msg.topic, &msg.message).await;
    }

    tracing::info!(
        subscriptions = config.subscribe.len(),
        publishes = config.publish.len(),
        "startup requests queued"
    );
}
