//! Transports and Request Handling for the Fuel Level Engine
//!
//! ## Overview
//!
//! The engine itself is synchronous and transport-agnostic. This crate puts
//! it on the network:
//!
//! ```text
//! ┌──────────────┐   payload   ┌───────────┐  RawSample  ┌──────────────┐
//! │ SampleSource │────────────▶│ Consumer  │────────────▶│   Ingestor   │
//! │ (MQTT, chan) │             │  decode   │             │ calibrate +  │
//! └──────────────┘             └───────────┘             │   append     │
//!                                                        └──────┬───────┘
//!                                                               ▼
//! "YYYY-MM-DD HH:MM:SS" ──▶ FuelLevelHandler ──▶ QueryEngine ──▶ SampleStore
//!                               │
//!                               ▼
//!                  {"fuelLevel": .., "message": ..}
//! ```
//!
//! ## Sources
//!
//! ### MQTT
//!
//! **When to use:** gateways already publish to a broker. One subscription
//! per consumer, QoS 1, subscription renewed on every reconnect.
//!
//! ### Channel
//!
//! **When to use:** the producer lives in the same process (a serial
//! reader, a test). Backed by a bounded `tokio::sync::mpsc` channel, so a
//! slow consumer pushes back on the producer.
//!
//! ## Failure Model
//!
//! - A malformed record is logged and dropped; the consumer keeps going.
//! - A store failure on append is retried with the same reading; the
//!   reading is never skipped.
//! - Transport and store errors are retried with a delay until
//!   `max_consecutive_errors` is reached, then the consumer stops with the
//!   last error.
//! - Ingestion timestamps are read in the ingestor's reference zone.
//! - A closed source ends the consumer normally.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use fuelgauge_connectors::{ChannelSource, Consumer, ConsumerConfig, FuelLevelHandler};
//! use fuelgauge_core::{EngineConfig, FuelGauge, MemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))?;
//! let (sender, source) = ChannelSource::new(16);
//!
//! sender.send(br#"{"ServerDateTime":"2024-03-10 09:00:00.000","AnalogIN1":2561}"#.to_vec()).await?;
//! drop(sender);
//!
//! let stats = Consumer::new(source, gauge.ingestor().clone(), ConsumerConfig::default())
//!     .run()
//!     .await?;
//! assert_eq!(stats.records_ingested, 1);
//!
//! let handler = FuelLevelHandler::new(gauge.queries().clone());
//! assert_eq!(handler.handle("2024-03-10 08:00:00")?.fuel_level, 40.0);
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod consumer;
pub mod handler;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
pub use channel::ChannelSource;
pub use consumer::{Consumer, ConsumerConfig, PayloadFormat};
pub use handler::FuelLevelHandler;

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttSource, MqttSourceConfig};

use fuelgauge_core::StoreError;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConnectorError {
    #[error("Source closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Where ingestion payloads come from
///
/// Implementations yield one encoded record per call and `Ok(None)` once
/// the source is exhausted for good.
#[async_trait::async_trait]
pub trait SampleSource: Send {
    /// Wait for the next payload
    async fn next_payload(&mut self) -> Result<Option<Vec<u8>>, ConnectorError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Counters of one consumer run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectionStats {
    /// Payloads received from the source
    pub messages_received: u64,
    /// Readings calibrated and stored
    pub records_ingested: u64,
    /// Payloads that did not decode
    pub records_malformed: u64,
    /// Readings whose timestamp has no calendar day
    pub records_rejected: u64,
    /// Failed store appends, retried ones included
    pub store_errors: u64,
    /// Transport errors seen
    pub transport_errors: u64,
    /// Last error message
    pub last_error: Option<String>,
}
