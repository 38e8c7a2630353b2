//! MQTT source
//!
//! Subscribes to the gateway topic and yields each publish payload. The
//! subscription is (re)issued on every `ConnAck`, so a broker restart or a
//! clean-session reconnect does not silently stop the feed. Connection
//! errors surface as [`ConnectorError::Transport`]; the next poll lets
//! `rumqttc` reconnect.
//!
//! ```rust,no_run
//! use fuelgauge_connectors::{MqttSource, MqttSourceConfig};
//!
//! let config = MqttSourceConfig::new("broker.local", "fleet/+/fuel")
//!     .port(1883)
//!     .client_id("fuelgauge-ingest-01")
//!     .keep_alive_secs(30);
//! let source = MqttSource::connect(&config);
//! ```

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};

use crate::{ConnectorError, SampleSource};

/// MQTT subscription settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttSourceConfig {
    /// Broker host name or address
    pub host: String,
    /// Broker port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client identifier; must be unique per broker
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Topic filter, wildcards allowed
    pub topic: String,
    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    /// Requests buffered between client and event loop
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Shortest keep-alive sent to the broker
pub const MIN_KEEP_ALIVE_SECS: u64 = 5;

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "fuelgauge-ingest".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    64
}

impl MqttSourceConfig {
    /// Config for `topic` on `host` with default port and timings
    pub fn new(host: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            client_id: default_client_id(),
            topic: topic.into(),
            keep_alive_secs: default_keep_alive(),
            channel_capacity: default_channel_capacity(),
        }
    }

    /// Set broker port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set client identifier
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set keep-alive interval
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set request channel capacity
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS)));
        options
    }
}

/// Publish payloads from one MQTT subscription
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    host: String,
}

impl MqttSource {
    /// Create the client; the connection is made on the first poll
    pub fn connect(config: &MqttSourceConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(config.options(), config.channel_capacity.max(1));
        Self {
            client,
            eventloop,
            topic: config.topic.clone(),
            host: format!("{}:{}", config.host, config.port),
        }
    }

    /// Disconnect cleanly
    pub async fn disconnect(&self) -> Result<(), ConnectorError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SampleSource for MqttSource {
    async fn next_payload(&mut self) -> Result<Option<Vec<u8>>, ConnectorError> {
        loop {
            let event = self
                .eventloop
                .poll()
                .await
                .map_err(|e| ConnectorError::Transport(e.to_string()))?;

            match event {
                Event::Incoming(Packet::Publish(publish)) => {
                    return Ok(Some(publish.payload.to_vec()));
                }
                Event::Incoming(Packet::ConnAck(_)) => {
                    log::info!("Connected to {}, subscribing to {}", self.host, self.topic);
                    self.client
                        .subscribe(self.topic.clone(), QoS::AtLeastOnce)
                        .await
                        .map_err(|e| ConnectorError::Transport(e.to_string()))?;
                }
                Event::Incoming(Packet::Disconnect) => return Err(ConnectorError::Closed),
                _ => {}
            }
        }
    }

    fn describe(&self) -> String {
        format!("mqtt://{}/{}", self.host, self.topic)
    }
}
