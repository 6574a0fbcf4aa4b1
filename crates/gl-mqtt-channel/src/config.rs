use std::time::Duration;

use serde::Deserialize;

use crate::error::{MqttError, MqttResult};

/// Broker connection configuration, loadable from TOML.
///
/// Every field has a default so an empty table connects to the demo
/// Event Grid namespace with the demo client identity.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    /// Broker hostname (e.g., an Event Grid MQTT namespace endpoint).
    #[serde(default = "default_host")]
    pub broker_host: String,
    /// Broker port for secure WebSocket.
    #[serde(default = "default_port")]
    pub broker_port: u16,
    /// WebSocket path on the broker.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// MQTT client ID. Randomized per process unless set.
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// MQTT username (the client authentication name).
    #[serde(default = "default_username")]
    pub username: String,
    /// MQTT password. Sent as empty when absent.
    #[serde(default)]
    pub password: Option<String>,
    /// Location of the client X.509 certificate (PEM).
    #[serde(default = "default_client_cert_path")]
    pub client_cert_path: String,
    /// Location of the client private key (PEM).
    #[serde(default = "default_client_key_path")]
    pub client_key_path: String,
    /// Extra CA certificate (PEM) trusted in addition to the platform roots.
    #[serde(default)]
    pub ca_cert_path: Option<String>,
    /// When set, certificate locations are fetched over HTTP relative to this URL.
    #[serde(default)]
    pub certificate_base_url: Option<String>,
    /// Fixed delay between a disconnect and the next reconnect attempt.
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    /// Keep-alive interval in seconds.
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u16,
    /// Capacity of the client's outgoing request queue.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
}

fn default_host() -> String {
    "demo-mqtt-dev.eastus-1.ts.eventgrid.azure.net".into()
}

fn default_port() -> u16 {
    443
}

fn default_ws_path() -> String {
    "/mqtt".into()
}

fn default_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("gridlink_{}", &id[..8])
}

fn default_username() -> String {
    "demo-mqtt-client-authn-ID".into()
}

fn default_client_cert_path() -> String {
    "/certificates/demo-mqtt-client-authn-ID.pem".into()
}

fn default_client_key_path() -> String {
    "/certificates/demo-mqtt-client-authn-ID.key".into()
}

fn default_reconnect_interval_ms() -> u64 {
    15_000
}

fn default_keepalive() -> u16 {
    60
}

fn default_request_capacity() -> usize {
    64
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: default_host(),
            broker_port: default_port(),
            ws_path: default_ws_path(),
            client_id: default_client_id(),
            username: default_username(),
            password: None,
            client_cert_path: default_client_cert_path(),
            client_key_path: default_client_key_path(),
            ca_cert_path: None,
            certificate_base_url: None,
            reconnect_interval_ms: default_reconnect_interval_ms(),
            keepalive_secs: default_keepalive(),
            request_capacity: default_request_capacity(),
        }
    }
}

impl MqttConfig {
    /// Full broker URL used by the WebSocket transport.
    pub fn broker_url(&self) -> String {
        format!("wss://{}:{}{}", self.broker_host, self.broker_port, self.ws_path)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Reject values that can never produce a working connection.
    pub fn validate(&self) -> MqttResult<()> {
        if self.broker_host.trim().is_empty() {
            return Err(MqttError::Config("broker_host must not be empty".into()));
        }
        if self.broker_port == 0 {
            return Err(MqttError::Config("broker_port must not be zero".into()));
        }
        if !self.ws_path.starts_with('/') {
            return Err(MqttError::Config(format!(
                "ws_path must start with '/': {}",
                self.ws_path
            )));
        }
        if self.username.is_empty() {
            return Err(MqttError::Config("username must not be empty".into()));
        }
        if self.client_cert_path.is_empty() || self.client_key_path.is_empty() {
            return Err(MqttError::Config(
                "client_cert_path and client_key_path are required".into(),
            ));
        }
        if self.reconnect_interval_ms == 0 {
            return Err(MqttError::Config(
                "reconnect_interval_ms must not be zero".into(),
            ));
        }
        if self.request_capacity == 0 {
            return Err(MqttError::Config(
                "request_capacity must not be zero".into(),
            ));
        }
        Ok(())
    }
}
