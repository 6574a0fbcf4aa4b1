//! Client configuration, loadable from TOML.

use gl_mqtt_channel::MqttConfig;
use serde::Deserialize;

/// Top-level configuration for the `gridlink` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Broker connection settings. Defaults to the demo namespace.
    #[serde(default)]
    pub broker: MqttConfig,
    /// Topics subscribed to once at startup.
    #[serde(default)]
    pub subscribe: Vec<String>,
    /// Retained messages published once at startup.
    #[serde(default)]
    pub publish: Vec<StartupMessage>,
}

/// A message to publish when the client starts.
#[derive(Debug, Clone, Deserialize)]
pub struct StartupMessage {
    pub topic: String,
    pub message: String,
}

impl ClientConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
