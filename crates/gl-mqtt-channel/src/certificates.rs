//! Client certificate retrieval.
//!
//! Certificates are PEM text fetched either over HTTP (relative to a base
//! URL) or read from the local filesystem. Both artifacts must load before
//! a connection is opened.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::MqttConfig;
use crate::error::{MqttError, MqttResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where certificate artifacts come from.
pub enum CertificateLoader {
    /// GET `<base_url>/<path>`; any non-2xx status is a failure.
    Http {
        client: reqwest::Client,
        base_url: String,
    },
    /// Read `<root>/<path>`, or `path` as given when there is no root.
    File { root: Option<PathBuf> },
}

impl CertificateLoader {
    pub fn http(base_url: impl Into<String>) -> MqttResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| MqttError::Initialization(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::Http {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn file(root: Option<PathBuf>) -> Self {
        Self::File { root }
    }

    /// Pick the HTTP loader when a base URL is configured, the filesystem otherwise.
    pub fn from_config(config: &MqttConfig) -> MqttResult<Self> {
        match &config.certificate_base_url {
            Some(base_url) => Self::http(base_url.clone()),
            None => Ok(Self::file(None)),
        }
    }

    /// Retrieve a PEM artifact and return it as text.
    pub async fn load(&self, path: &str) -> MqttResult<String> {
        let bytes = match self {
            Self::Http { client, base_url } => {
                let url = format!(
                    "{}/{}",
                    base_url.trim_end_matches('/'),
                    path.trim_start_matches('/')
                );
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| load_error(path, e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(load_error(path, format!("HTTP {status}")));
                }

                response
                    .bytes()
                    .await
                    .map_err(|e| load_error(path, e))?
                    .to_vec()
            }
            Self::File { root } => {
                let full = match root {
                    Some(root) => root.join(path.trim_start_matches('/')),
                    None => PathBuf::from(path),
                };
                tokio::fs::read(&full)
                    .await
                    .map_err(|e| load_error(path, e))?
            }
        };

        let text = String::from_utf8(bytes).map_err(|e| load_error(path, e))?;
        tracing::debug!(path, bytes = text.len(), "certificate loaded");
        Ok(text)
    }
}

fn load_error(path: &str, reason: impl fmt::Display) -> MqttError {
    MqttError::CertificateLoad {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// PEM material needed for client certificate authentication.
#[derive(Clone)]
pub struct ClientCredentials {
    cert_pem: String,
    key_pem: String,
    ca_pem: Option<String>,
}

impl ClientCredentials {
    pub fn from_pem(
        cert_pem: impl Into<String>,
        key_pem: impl Into<String>,
        ca_pem: Option<String>,
    ) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
            ca_pem,
        }
    }

    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    pub fn key_pem(&self) -> &str {
        &self.key_pem
    }

    pub fn ca_pem(&self) -> Option<&str> {
        self.ca_pem.as_deref()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("cert_pem", &format_args!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &"<redacted>")
            .field("ca_pem", &self.ca_pem.as_ref().map(|c| c.len()))
            .finish()
    }
}

/// Load the client certificate, private key and optional CA concurrently.
///
/// Fails on the first artifact that cannot be retrieved.
pub async fn load_credentials(
    config: &MqttConfig,
    loader: &CertificateLoader,
) -> MqttResult<ClientCredentials> {
    let ca = async {
        match &config.ca_cert_path {
            Some(path) => loader.load(path).await.map(Some),
            None => Ok(None),
        }
    };

    let (cert_pem, key_pem, ca_pem) = tokio::try_join!(
        loader.load(&config.client_cert_path),
        loader.load(&config.client_key_path),
        ca,
    )?;

    Ok(ClientCredentials {
        cert_pem,
        key_pem,
        ca_pem,
    })
}
