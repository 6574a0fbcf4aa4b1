//! TLS configuration for certificate-authenticated WebSocket connections.
//!
//! Builds a rustls client config from PEM text: platform trust roots plus an
//! optional extra CA, and the client certificate chain / private key used
//! for mutual authentication.

use std::sync::Arc;

use rumqttc::{TlsConfiguration, Transport};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::certificates::ClientCredentials;
use crate::error::{MqttError, MqttResult};

/// Build a secure WebSocket transport from loaded credentials.
pub fn load_wss_transport(credentials: &ClientCredentials) -> MqttResult<Transport> {
    let config = client_config(credentials)?;
    Ok(Transport::wss_with_config(TlsConfiguration::Rustls(
        Arc::new(config),
    )))
}

fn client_config(credentials: &ClientCredentials) -> MqttResult<ClientConfig> {
    let roots = root_store(credentials.ca_pem())?;
    let chain = parse_certs(credentials.cert_pem(), "client cert")?;
    let key = parse_key(credentials.key_pem())?;

    ClientConfig::builder()
        .with_root_certificates(roots)
        .with_client_auth_cert(chain, key)
        .map_err(|e| MqttError::Tls(format!("invalid client certificate/key pair: {e}")))
}

fn root_store(ca_pem: Option<&str>) -> MqttResult<RootCertStore> {
    let mut roots = RootCertStore::empty();

    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = roots.add_parsable_certificates(certs);
            tracing::debug!(added, ignored, "loaded platform trust roots");
        }
        Err(e) => tracing::warn!(error = %e, "could not load platform trust roots"),
    }

    if let Some(pem) = ca_pem {
        for cert in parse_certs(pem, "CA cert")? {
            roots
                .add(cert)
                .map_err(|e| MqttError::Tls(format!("invalid CA cert: {e}")))?;
        }
    }

    if roots.is_empty() {
        return Err(MqttError::Tls("no trust anchors available".into()));
    }
    Ok(roots)
}

fn parse_certs(pem: &str, what: &str) -> MqttResult<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut pem.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| MqttError::Tls(format!("failed to parse {what}: {e}")))?;
    if certs.is_empty() {
        return Err(MqttError::Tls(format!("no PEM certificates found in {what}")));
    }
    Ok(certs)
}

fn parse_key(pem: &str) -> MqttResult<PrivateKeyDer<'static>> {
    rustls_pemfile::private_key(&mut pem.as_bytes())
        .map_err(|e| MqttError::Tls(format!("failed to parse client key: {e}")))?
        .ok_or_else(|| MqttError::Tls("no private key found in client key".into()))
}
