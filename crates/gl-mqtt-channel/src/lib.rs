//! MQTT over secure WebSocket channel for GridLink.
//!
//! Provides a certificate-authenticated broker connection:
//! - `CertificateLoader` fetching client PEM material over HTTP or from disk
//! - `BrokerClient` with logged `subscribe`/`publish` helpers
//! - `ConnectionDriver` polling the event loop with a fixed reconnect interval
//! - `ConnectionMonitor` lifecycle state machine
//! - `Channel` trait and `MockChannel` for testing without a broker

pub mod certificates;
pub mod channel;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod mock;
pub mod tls;

// Re-exports for convenience.
pub use certificates::{CertificateLoader, ClientCredentials, load_credentials};
pub use channel::Channel;
pub use client::{BrokerClient, setup, try_setup, try_setup_with};
pub use config::MqttConfig;
pub use driver::ConnectionDriver;
pub use error::{MqttError, MqttResult};
pub use lifecycle::{ConnectionMonitor, ConnectionState, TransportEvent};
pub use mock::MockChannel;
