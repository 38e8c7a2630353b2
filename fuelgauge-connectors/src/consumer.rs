//! Ingestion consumer loop
//!
//! One consumer per source: pull a payload, decode it into a reading, hand
//! it to the [`Ingestor`]. The loop is the only place where transport
//! concerns (retry, malformed input, store outages) meet the engine.

use std::time::Duration;

use apache_avro::Schema;
use serde::{Deserialize, Serialize};

use fuelgauge_core::{IngestError, Ingestor, RawSample, ReferenceZone, SampleStore};
use fuelgauge_schemas::schemas::fuel_sensor_event_v1;
use fuelgauge_schemas::{FuelSensorEvent, SchemaError};

use crate::{ConnectionStats, ConnectorError, SampleSource};

/// Encoding of incoming payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `{"ServerDateTime": .., "AnalogIN1": ..}`
    #[default]
    Json,
    /// Bare `FuelSensorEvent` datum
    Avro,
}

/// Consumer loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsumerConfig {
    /// Payload encoding
    pub format: PayloadFormat,
    /// Log a progress line every this many payloads (0 disables)
    pub log_every: u64,
    /// Stop after this many transport errors in a row, or this many failed
    /// appends of one reading
    pub max_consecutive_errors: u32,
    /// Pause after a transport or store error, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            format: PayloadFormat::Json,
            log_every: 1000,
            max_consecutive_errors: 10,
            retry_delay_ms: 1000,
        }
    }
}

impl ConsumerConfig {
    /// Set payload encoding
    pub fn format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Set progress log interval
    pub fn log_every(mut self, payloads: u64) -> Self {
        self.log_every = payloads;
        self
    }

    /// Set transport and store error budget
    pub fn max_consecutive_errors(mut self, errors: u32) -> Self {
        self.max_consecutive_errors = errors;
        self
    }

    /// Set pause between retries
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }
}

enum Decoder {
    Json,
    Avro(Schema),
}

impl Decoder {
    fn decode(&self, payload: &[u8], zone: &ReferenceZone) -> Result<RawSample, SchemaError> {
        let event = match self {
            Self::Json => FuelSensorEvent::from_json(payload)?,
            Self::Avro(schema) => FuelSensorEvent::from_avro(schema, payload)?,
        };
        event.to_raw_sample(zone)
    }
}

/// Drives one source into one ingestor
///
/// Timestamps are decoded in the ingestor's zone, so the consumer and the
/// query side always agree on which day a reading belongs to.
pub struct Consumer<Src, S> {
    source: Src,
    ingestor: Ingestor<S>,
    config: ConsumerConfig,
    stats: ConnectionStats,
}

impl<Src, S> Consumer<Src, S>
where
    Src: SampleSource,
    S: SampleStore,
{
    /// Consumer feeding `ingestor`
    pub fn new(source: Src, ingestor: Ingestor<S>, config: ConsumerConfig) -> Self {
        Self {
            source,
            ingestor,
            config,
            stats: ConnectionStats::default(),
        }
    }

    /// Run until the source closes or an error budget is spent
    ///
    /// Transport errors and store failures each get `max_consecutive_errors`
    /// attempts with `retry_delay_ms` between them. A reading the store
    /// refused is retried as is; it is never skipped.
    pub async fn run(mut self) -> Result<ConnectionStats, ConnectorError> {
        let decoder = match self.config.format {
            PayloadFormat::Json => Decoder::Json,
            PayloadFormat::Avro => Decoder::Avro(
                fuel_sensor_event_v1().map_err(|e| ConnectorError::Transport(e.to_string()))?,
            ),
        };

        let origin = self.source.describe();
        log::info!("Consumer started on {}", origin);

        let mut consecutive_errors = 0u32;
        loop {
            match self.source.next_payload().await {
                Ok(Some(payload)) => {
                    consecutive_errors = 0;
                    if let Some(raw) = self.decode(&decoder, &payload) {
                        self.store_reading(raw).await?;
                    }
                    self.log_progress();
                }
                Ok(None) | Err(ConnectorError::Closed) => break,
                Err(err) => {
                    consecutive_errors += 1;
                    self.stats.transport_errors += 1;
                    self.stats.last_error = Some(err.to_string());
                    log::warn!(
                        "Transport error on {} ({}/{}): {}",
                        origin,
                        consecutive_errors,
                        self.config.max_consecutive_errors,
                        err
                    );

                    if consecutive_errors >= self.config.max_consecutive_errors {
                        log::info!("Consumer on {} giving up", origin);
                        return Err(err);
                    }
                    self.pause().await;
                }
            }
        }

        log::info!(
            "Consumer on {} stopped: {} ingested, {} malformed, {} rejected",
            origin,
            self.stats.records_ingested,
            self.stats.records_malformed,
            self.stats.records_rejected
        );
        Ok(self.stats)
    }

    fn decode(&mut self, decoder: &Decoder, payload: &[u8]) -> Option<RawSample> {
        self.stats.messages_received += 1;

        match decoder.decode(payload, &self.ingestor.zone()) {
            Ok(raw) => Some(raw),
            Err(err) => {
                self.stats.records_malformed += 1;
                log::warn!("Dropping malformed record: {}", err);
                None
            }
        }
    }

    async fn store_reading(&mut self, raw: RawSample) -> Result<(), ConnectorError> {
        let mut failures = 0u32;
        loop {
            match self.ingestor.ingest(raw) {
                Ok(_) => {
                    self.stats.records_ingested += 1;
                    return Ok(());
                }
                Err(IngestError::InvalidTimestamp(err)) => {
                    self.stats.records_rejected += 1;
                    self.stats.last_error = Some(err.to_string());
                    log::warn!("Reading at {}ms has no day: {}", raw.timestamp, err);
                    return Ok(());
                }
                Err(IngestError::Store(err)) => {
                    failures += 1;
                    self.stats.store_errors += 1;
                    self.stats.last_error = Some(err.to_string());
                    log::warn!(
                        "Store failed for reading at {}ms ({}/{}): {}",
                        raw.timestamp,
                        failures,
                        self.config.max_consecutive_errors,
                        err
                    );

                    if failures >= self.config.max_consecutive_errors {
                        return Err(ConnectorError::Store(err));
                    }
                    self.pause().await;
                }
            }
        }
    }

    fn log_progress(&self) {
        let every = self.config.log_every;
        if every > 0 && self.stats.messages_received % every == 0 {
            log::debug!(
                "{} payloads, {} ingested",
                self.stats.messages_received,
                self.stats.records_ingested
            );
        }
    }

    async fn pause(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
    }
}
