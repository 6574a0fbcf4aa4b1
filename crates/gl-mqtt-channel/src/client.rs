//! Broker client — owned handle with subscribe/publish helpers.
//!
//! Construction is a fetch-then-connect pipeline: both certificates load
//! first (concurrently), and only then are the TLS transport and MQTT client
//! built. Operations never return errors to the caller and never wait for
//! the connection or for queue space; outcomes are logged.

use std::collections::HashSet;
use std::time::Duration;

use rumqttc::{AsyncClient, MqttOptions, QoS, SubscribeFilter, Transport};

use crate::certificates::{CertificateLoader, ClientCredentials, load_credentials};
use crate::channel::Channel;
use crate::config::MqttConfig;
use crate::driver::ConnectionDriver;
use crate::error::{MqttError, MqttResult};
use crate::tls;

/// Handle to the single broker connection of this process.
///
/// Not `Clone`: whoever constructs it owns the connection and lends it out
/// by reference. The paired [`ConnectionDriver`] must be run for requests to
/// reach the broker.
pub struct BrokerClient<C: Channel = AsyncClient> {
    channel: C,
}

impl BrokerClient<AsyncClient> {
    /// Open the connection using already-loaded credentials.
    ///
    /// Returns `(client, driver)`. No network I/O happens until the driver runs.
    pub fn connect(
        config: &MqttConfig,
        credentials: &ClientCredentials,
    ) -> MqttResult<(Self, ConnectionDriver)> {
        config.validate()?;

        let transport = tls::load_wss_transport(credentials)?;
        let options = mqtt_options(config, transport);
        let (client, eventloop) = AsyncClient::new(options, config.request_capacity);

        tracing::info!(
            url = %config.broker_url(),
            client_id = %config.client_id,
            reconnect_ms = config.reconnect_interval_ms,
            "connecting to MQTT broker"
        );

        Ok((
            Self { channel: client },
            ConnectionDriver::new(eventloop, config.reconnect_interval()),
        ))
    }
}

impl<C: Channel> BrokerClient<C> {
    /// Wrap an existing channel (e.g. a mock in tests).
    pub fn with_channel(channel: C) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Subscribe to every topic in one batched request.
    ///
    /// An empty set is logged and ignored. Duplicate topics are sent once.
    /// Granted subscriptions are logged by the driver when the broker acks.
    pub async fn subscribe<I, S>(&self, topics: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = topics
            .into_iter()
            .map(Into::into)
            .filter(|topic: &String| seen.insert(topic.clone()))
            .collect();

        if unique.is_empty() {
            tracing::error!("no topics provided for subscription");
            return;
        }

        let filters = unique
            .iter()
            .map(|t| SubscribeFilter::new(t.clone(), QoS::AtMostOnce))
            .collect();

        match self.channel.subscribe_many(filters).await {
            Ok(()) => tracing::debug!(topics = ?unique, "subscription requested"),
            Err(e) => {
                tracing::error!(error = %e, topics = ?unique, "failed to subscribe to MQTT topics");
            }
        }
    }

    /// Publish `message` to `topic` as a retained message.
    ///
    /// Empty topic or message is logged and ignored. A full request queue
    /// (e.g. while offline) is logged as a publish failure.
    pub async fn publish(&self, topic: &str, message: &str) {
        if topic.is_empty() || message.is_empty() {
            tracing::error!("topic and message are required to publish");
            return;
        }

        match self
            .channel
            .publish(topic, message.as_bytes(), QoS::AtMostOnce, true)
            .await
        {
            Ok(()) => tracing::info!(topic, message, "topic published"),
            Err(e) => tracing::error!(error = %e, topic, "failed to publish to topic"),
        }
    }
}

/// MQTT options for a secure WebSocket connection.
///
/// With the WebSocket transport rumqttc takes the full `wss://` URL as the
/// broker address.
pub fn mqtt_options(config: &MqttConfig, transport: Transport) -> MqttOptions {
    let mut options =
        MqttOptions::new(&config.client_id, config.broker_url(), config.broker_port);
    options.set_keep_alive(Duration::from_secs(config.keepalive_secs.into()));
    options.set_credentials(
        config.username.clone(),
        config.password.clone().unwrap_or_default(),
    );
    options.set_transport(transport);
    options
}

/// Load certificates and open the connection, surfacing failures as a typed error.
///
/// Every failure is reported as [`MqttError::Initialization`]; no connection
/// is attempted unless both certificates loaded.
pub async fn try_setup(
    config: &MqttConfig,
) -> MqttResult<(BrokerClient<AsyncClient>, ConnectionDriver)> {
    let loader = CertificateLoader::from_config(config).map_err(MqttError::into_initialization)?;
    try_setup_with(config, &loader).await
}

/// Same as [`try_setup`] with an explicit certificate loader.
pub async fn try_setup_with(
    config: &MqttConfig,
    loader: &CertificateLoader,
) -> MqttResult<(BrokerClient<AsyncClient>, ConnectionDriver)> {
    let credentials = load_credentials(config, loader)
        .await
        .map_err(MqttError::into_initialization)?;
    BrokerClient::connect(config, &credentials).map_err(MqttError::into_initialization)
}

/// Factory that logs initialization failure and yields no client.
///
/// Callers must treat `None` as "no client available"; there is no retry.
pub async fn setup(config: &MqttConfig) -> Option<(BrokerClient<AsyncClient>, ConnectionDriver)> {
    match try_setup(config).await {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize MQTT client");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ConnectionState;
    use crate::mock::MockChannel;

    const CERT: &str = include_str!("../testdata/client.pem");
    const KEY: &str = include_str!("../testdata/client.key");

    fn credentials() -> ClientCredentials {
        ClientCredentials::from_pem(CERT, KEY, Some(CERT.to_string()))
    }

    #[tokio::test]
    async fn subscribe_batches_all_topics() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client
            .subscribe(["sensors/temp", "sensors/humidity", "alerts/#"])
            .await;

        let requests = client.channel().subscribe_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            vec!["sensors/temp", "sensors/humidity", "alerts/#"]
        );
    }

    #[tokio::test]
    async fn subscribe_dedupes_topics() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client.subscribe(vec!["a/b", "c/d", "a/b"]).await;

        let requests = client.channel().subscribe_requests();
        assert_eq!(requests, vec![vec!["a/b".to_string(), "c/d".to_string()]]);
    }

    #[tokio::test]
    async fn subscribe_keeps_first_seen_order() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client.subscribe(["z", "a", "z", "m", "a"]).await;
        assert_eq!(client.channel().subscribe_requests(), vec![vec!["z", "a", "m"]]);

        client.channel().reset();
        client.subscribe(["only"]).await;
        assert_eq!(client.channel().subscribe_requests().len(), 1);
        assert!(client.channel().is_subscribed_to("only"));
        assert!(!client.channel().is_subscribed_to("z"));
    }

    #[tokio::test]
    async fn subscribe_empty_is_noop() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client.subscribe(Vec::<String>::new()).await;
        assert!(client.channel().subscribe_requests().is_empty());
    }

    #[tokio::test]
    async fn subscribe_failure_is_swallowed() {
        let client = BrokerClient::with_channel(MockChannel::failing());
        client.subscribe(["a/b"]).await;
        assert!(client.channel().subscribe_requests().is_empty());
    }

    #[tokio::test]
    async fn publish_is_retained() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client.publish("devices/lamp/state", "on").await;

        let msgs = client.channel().published();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].topic, "devices/lamp/state");
        assert_eq!(msgs[0].payload, b"on");
        assert!(msgs[0].retain);
        assert_eq!(msgs[0].qos, QoS::AtMostOnce);
    }

    #[tokio::test]
    async fn publish_keeps_exact_bytes() {
        let client = BrokerClient::with_channel(MockChannel::new());
        let message = "{\"temp\": 21.5, \"unit\": \"°C\"}  ";
        client.publish("t", message).await;
        assert_eq!(client.channel().published()[0].payload, message.as_bytes());
    }

    #[tokio::test]
    async fn publish_requires_topic_and_message() {
        let client = BrokerClient::with_channel(MockChannel::new());
        client.publish("", "x").await;
        client.publish("t", "").await;
        assert!(client.channel().published().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_is_swallowed() {
        let client = BrokerClient::with_channel(MockChannel::failing());
        client.publish("t", "x").await;
        assert!(client.channel().published().is_empty());
    }

    #[test]
    fn options_use_secure_websocket() {
        let config = MqttConfig {
            client_id: "gridlink_test".into(),
            ..Default::default()
        };
        let transport = tls::load_wss_transport(&credentials()).unwrap();
        let options = mqtt_options(&config, transport);

        let (url, port) = options.broker_address();
        assert_eq!(
            url,
            "wss://demo-mqtt-dev.eastus-1.ts.eventgrid.azure.net:443/mqtt"
        );
        assert_eq!(port, 443);
        assert!(matches!(options.transport(), Transport::Wss(_)));
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert_eq!(
            options.credentials(),
            Some(("demo-mqtt-client-authn-ID".to_string(), String::new()))
        );
    }

    #[tokio::test]
    async fn connect_configures_reconnect_interval() {
        let config = MqttConfig::default();
        let (_client, driver) = BrokerClient::connect(&config, &credentials()).unwrap();
        assert_eq!(driver.reconnect_interval(), Duration::from_millis(15_000));
        assert_eq!(driver.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn full_queue_does_not_block_without_driver() {
        let config = MqttConfig {
            request_capacity: 2,
            ..Default::default()
        };
        let (client, driver) = BrokerClient::connect(&config, &credentials()).unwrap();

        let burst = async {
            for i in 0..10 {
                client.publish(&format!("burst/{i}"), "x").await;
                client.subscribe([format!("burst/{i}/ack")]).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), burst)
            .await
            .expect("requests beyond the queue capacity must not block");
        assert_eq!(driver.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn queued_requests_are_accepted_up_to_capacity() {
        let (client, _driver) =
            BrokerClient::connect(&MqttConfig::default(), &credentials()).unwrap();
        assert!(
            Channel::publish(client.channel(), "t", b"x", QoS::AtMostOnce, true)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn full_queue_reports_publish_error() {
        let config = MqttConfig {
            request_capacity: 1,
            ..Default::default()
        };
        let (client, _driver) = BrokerClient::connect(&config, &credentials()).unwrap();
        let channel = client.channel();

        Channel::publish(channel, "t", b"1", QoS::AtMostOnce, true)
            .await
            .unwrap();
        let err = Channel::publish(channel, "t", b"2", QoS::AtMostOnce, true)
            .await
            .unwrap_err();
        assert!(matches!(err, MqttError::Publish(_)));
    }

    #[tokio::test]
    async fn connect_rejects_invalid_config() {
        let config = MqttConfig {
            broker_host: String::new(),
            ..Default::default()
        };
        let err = BrokerClient::connect(&config, &credentials())
            .err()
            .expect("should fail");
        assert!(matches!(err, MqttError::Config(_)));
    }

    #[tokio::test]
    async fn connect_rejects_bad_credentials() {
        let creds = ClientCredentials::from_pem("garbage", KEY, Some(CERT.to_string()));
        let err = BrokerClient::connect(&MqttConfig::default(), &creds)
            .err()
            .expect("should fail");
        assert!(matches!(err, MqttError::Tls(_)));
    }
}
