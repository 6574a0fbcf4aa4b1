//! MQTT channel error types.

use thiserror::Error;

/// Errors that can occur while setting up or using the broker connection.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("failed to load certificate from {path}: {reason}")]
    CertificateLoad { path: String, reason: String },

    #[error("initialization error: {0}")]
    Initialization(String),

    #[error("subscribe error: {0}")]
    Subscribe(String),

    #[error("publish error: {0}")]
    Publish(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("config error: {0}")]
    Config(String),
}

impl MqttError {
    /// Wrap a setup failure so callers see a single initialization error.
    ///
    /// Already-wrapped errors are passed through unchanged.
    pub fn into_initialization(self) -> Self {
        match self {
            MqttError::Initialization(_) => self,
            other => MqttError::Initialization(other.to_string()),
        }
    }
}

/// Convenience alias for MQTT results.
pub type MqttResult<T> = Result<T, MqttError>;
