//! Mock MQTT channel for testing without a real broker.
//!
//! Records every subscribe batch and publish request for assertion in
//! tests. A failing variant rejects all requests.

use async_trait::async_trait;
use rumqttc::{QoS, SubscribeFilter};
use std::sync::Mutex;

use crate::channel::Channel;
use crate::error::{MqttError, MqttResult};

/// A recorded publish call.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Mock implementation of the `Channel` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscribe_requests: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscribe_requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A channel whose every request fails, as if the client queue were closed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Get all published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Get every subscribe request, one entry per batch.
    pub fn subscribe_requests(&self) -> Vec<Vec<String>> {
        self.subscribe_requests.lock().unwrap().clone()
    }

    /// Check whether any batch subscribed to the given filter.
    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        self.subscribe_requests
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .any(|f| f == filter)
    }

    /// Total number of requests that reached the channel.
    pub fn request_count(&self) -> usize {
        self.published.lock().unwrap().len() + self.subscribe_requests.lock().unwrap().len()
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        self.published.lock().unwrap().clear();
        self.subscribe_requests.lock().unwrap().clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn subscribe_many(&self, filters: Vec<SubscribeFilter>) -> MqttResult<()> {
        if self.fail {
            return Err(MqttError::Subscribe("request channel closed".into()));
        }
        self.subscribe_requests
            .lock()
            .unwrap()
            .push(filters.into_iter().map(|f| f.path).collect());
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        if self.fail {
            return Err(MqttError::Publish(format!("request channel closed: {topic}")));
        }
        self.published.lock().unwrap().push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }
}
