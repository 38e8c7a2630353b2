//! Channel transport feeding a live engine while queries are served

use std::sync::Arc;

use fuelgauge_connectors::{ChannelSource, Consumer, ConsumerConfig, FuelLevelHandler};
use fuelgauge_core::{EngineConfig, FuelGauge, MemoryStore};
use fuelgauge_schemas::NO_DATA_MESSAGE;

fn payload(time: &str, raw: u16) -> Vec<u8> {
    format!(r#"{{"ServerDateTime":"{}","AnalogIN1":{}}}"#, time, raw).into_bytes()
}

#[tokio::test]
async fn spawned_consumer_feeds_handler() {
    let gauge = FuelGauge::from_config(&EngineConfig::default(), Arc::new(MemoryStore::new()))
        .unwrap();
    let handler = FuelLevelHandler::new(gauge.queries().clone());
    let (sender, source) = ChannelSource::new(4);

    let consumer = tokio::spawn(
        Consumer::new(source, gauge.ingestor().clone(), ConsumerConfig::default()).run(),
    );

    let response = handler.handle("2024-03-10 10:30:00").unwrap();
    assert_eq!(response.message.as_deref(), Some(NO_DATA_MESSAGE));

    for (time, raw) in [
        ("2024-03-10 09:00:00.000", 5836),
        ("2024-03-10 10:00:00.000", 4464),
        ("2024-03-10 11:00:00.000", 2561),
    ] {
        sender.send(payload(time, raw)).await.unwrap();
    }
    drop(sender);

    let stats = consumer.await.unwrap().unwrap();
    assert_eq!(stats.records_ingested, 3);

    let response = handler.handle("2024-03-10 10:30:00").unwrap();
    assert_eq!(response.fuel_level, 31.5);
    assert!(response.message.is_none());
}
