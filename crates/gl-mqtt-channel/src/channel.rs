//! Request seam between `BrokerClient` and the MQTT client library.

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS, SubscribeFilter};

use crate::error::{MqttError, MqttResult};

/// Abstraction for MQTT subscribe and publish requests.
///
/// Implemented by `rumqttc::AsyncClient`; enables mocking in tests without
/// a real MQTT broker. Implementations must not wait for queue space: a
/// request that cannot be queued right away is an error.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Subscribe to all filters in one request.
    async fn subscribe_many(&self, filters: Vec<SubscribeFilter>) -> MqttResult<()>;

    /// Publish a raw payload to a topic.
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool)
    -> MqttResult<()>;
}

#[async_trait]
impl Channel for AsyncClient {
    async fn subscribe_many(&self, filters: Vec<SubscribeFilter>) -> MqttResult<()> {
        self.try_subscribe_many(filters)
            .map_err(|e| MqttError::Subscribe(e.to_string()))
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        self.try_publish(topic, qos, retain, payload)
            .map_err(|e| MqttError::Publish(e.to_string()))
    }
}
