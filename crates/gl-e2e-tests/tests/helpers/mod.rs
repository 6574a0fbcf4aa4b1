//! Shared test harness for E2E integration tests.
//!
//! Serves client certificate material from a wiremock server so the real
//! HTTP loader, TLS setup and client construction run end to end.

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gl_mqtt_channel::MqttConfig;

pub const CERT_PEM: &str = include_str!("../../../gl-mqtt-channel/testdata/client.pem");
pub const KEY_PEM: &str = include_str!("../../../gl-mqtt-channel/testdata/client.key");

pub const CERT_PATH: &str = "/certificates/demo-mqtt-client-authn-ID.pem";
pub const KEY_PATH: &str = "/certificates/demo-mqtt-client-authn-ID.key";
pub const CA_PATH: &str = "/certificates/ca.pem";

/// Certificate server with per-path responses.
pub struct CertServer {
    pub server: MockServer,
}

impl CertServer {
    /// Serve the certificate, key and CA successfully.
    pub async fn healthy() -> Self {
        Self::with_statuses(200, 200).await
    }

    /// Serve the certificate and key with the given statuses; the CA is always served.
    pub async fn with_statuses(cert_status: u16, key_status: u16) -> Self {
        let server = MockServer::start().await;
        mount(&server, CERT_PATH, cert_status, CERT_PEM).await;
        mount(&server, KEY_PATH, key_status, KEY_PEM).await;
        mount(&server, CA_PATH, 200, CERT_PEM).await;
        Self { server }
    }

    /// Broker config pointing at this server for certificates.
    ///
    /// The broker itself is never contacted unless the returned driver runs.
    pub fn config(&self) -> MqttConfig {
        MqttConfig {
            certificate_base_url: Some(self.server.uri()),
            ca_cert_path: Some(CA_PATH.into()),
            ..Default::default()
        }
    }

    /// Paths requested so far, in arrival order.
    pub async fn requested_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }
}

async fn mount(server: &MockServer, at: &str, status: u16, body: &str) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_string(body)
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}
