//! End-to-end ingestion and query scenarios

mod common;

use std::sync::Arc;
use std::thread;

use common::{feed, gauge, local, raw_for, TankSimulator};
use fuelgauge_core::{
    IngestQueue, MemoryStore, PartitionKey, QueryError, RawSample, SampleStore,
};

#[test]
fn hourly_refill_day() {
    let gauge = gauge();
    feed(
        &gauge,
        &[
            ("2024-03-10 09:00:00", raw_for(0.0)),
            ("2024-03-10 10:00:00", raw_for(20.0)),
            ("2024-03-10 11:00:00", raw_for(40.0)),
        ],
    );

    let level = |t: &str| gauge.query_local(t).unwrap().map(|s| s.fuel_level);

    assert_eq!(level("2024-03-10 08:00:00"), Some(0.0));
    assert_eq!(level("2024-03-10 10:00:00"), Some(14.62));
    // Decayed average, not the arithmetic mean of 20
    assert_eq!(level("2024-03-10 10:30:00"), Some(31.5));
    assert_eq!(level("2024-03-10 11:00:01"), None);
}

#[test]
fn answer_is_stamped_with_the_matched_sample() {
    let gauge = gauge();
    feed(&gauge, &[("2024-03-10 09:00:00", 2561), ("2024-03-10 09:45:00", 2561)]);

    let hit = gauge.query_local("2024-03-10 09:00:01").unwrap().unwrap();
    assert_eq!(hit.timestamp, local("2024-03-10 09:45:00"));
    assert_eq!(gauge.zone().format(hit.timestamp).unwrap(), "2024-03-10 09:45:00.000");
}

#[test]
fn saturation_and_interpolation() {
    let gauge = gauge();
    feed(
        &gauge,
        &[
            ("2024-03-10 01:00:00", 65535),
            ("2024-03-11 01:00:00", 0),
            ("2024-03-12 01:00:00", 5150),
        ],
    );

    let level = |t: &str| gauge.query_local(t).unwrap().map(|s| s.fuel_level);
    assert_eq!(level("2024-03-10 00:00:00"), Some(0.0));
    assert_eq!(level("2024-03-11 00:00:00"), Some(70.0));
    assert_eq!(level("2024-03-12 00:00:00"), Some(10.0));
}

#[test]
fn arrival_order_does_not_matter() {
    let in_order = gauge();
    let shuffled = gauge();
    let readings = [
        ("2024-03-10 09:00:00", 5836),
        ("2024-03-10 10:00:00", 4464),
        ("2024-03-10 11:00:00", 2561),
    ];

    feed(&in_order, &readings);
    feed(&shuffled, &[readings[2], readings[0], readings[1]]);

    for t in ["2024-03-10 09:00:00", "2024-03-10 09:59:59", "2024-03-10 10:30:00"] {
        assert_eq!(in_order.query_local(t).unwrap(), shuffled.query_local(t).unwrap());
    }
}

#[test]
fn days_are_independent() {
    let gauge = gauge();
    feed(
        &gauge,
        &[("2024-03-10 23:00:00", raw_for(70.0)), ("2024-03-11 00:30:00", raw_for(0.0))],
    );

    // Previous day's full tank does not leak into the new day's average
    let hit = gauge.query_local("2024-03-11 00:00:00").unwrap().unwrap();
    assert_eq!(hit.fuel_level, 0.0);

    // And the next day is never consulted for a late query
    assert_eq!(gauge.query_local("2024-03-10 23:30:00").unwrap(), None);
}

#[test]
fn empty_store_and_bad_input() {
    let gauge = gauge();
    assert_eq!(gauge.query_local("2024-03-10 12:00:00").unwrap(), None);
    assert!(matches!(
        gauge.query_local("2024-13-40 99:00:00"),
        Err(QueryError::InvalidTarget(_))
    ));
}

#[test]
fn smoothed_day_stays_within_observed_range() {
    let gauge = gauge();
    let start = local("2024-03-10 06:00:00");
    let readings = TankSimulator::new(60.0).day(start, 30_000, 1_000);
    for raw in &readings {
        gauge.ingest(*raw).unwrap();
    }

    let day = PartitionKey::from_ymd(2024, 3, 10).unwrap();
    let stored = gauge.ingestor().store().scan_partition(day).unwrap();
    let smoothed = gauge.queries().smoothed_partition(day).unwrap();
    assert_eq!(stored.len(), smoothed.len());

    let min = stored.iter().map(|s| s.liters).fold(f64::INFINITY, f64::min);
    let max = stored.iter().map(|s| s.liters).fold(f64::NEG_INFINITY, f64::max);
    for s in &smoothed {
        assert!(s.fuel_level >= min - 0.005 && s.fuel_level <= max + 0.005);
    }

    // Identical input, identical output
    assert_eq!(smoothed, gauge.queries().smoothed_partition(day).unwrap());
}

#[test]
fn concurrent_days_do_not_interfere() {
    let gauge = gauge();

    let handles: Vec<_> = (1..=8u32)
        .map(|d| {
            let gauge = gauge.clone();
            thread::spawn(move || {
                let date = format!("2024-03-{:02}", d);
                for minute in 0..60 {
                    let t = local(&format!("{} 10:{:02}:00", date, minute));
                    gauge.ingest(RawSample::new(t, 2561)).unwrap();
                    gauge.query_local(&format!("{} 10:00:00", date)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let store = gauge.ingestor().store();
    assert_eq!(store.partitions().unwrap().len(), 8);
    for d in 1..=8 {
        let day = PartitionKey::from_ymd(2024, 3, d).unwrap();
        assert_eq!(store.len(day).unwrap(), 60);
        let hit = gauge.query_local(&format!("2024-03-{:02} 10:59:00", d)).unwrap();
        assert_eq!(hit.map(|s| s.fuel_level), Some(40.0));
    }
}

#[test]
fn producers_hand_off_through_queue() {
    let gauge = gauge();
    let queue: Arc<IngestQueue<256>> = Arc::new(IngestQueue::new());
    let start = local("2024-03-10 08:00:00");

    let producers: Vec<_> = (0..2)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..50 {
                    let ts = start + (i * 2 + p) * 1_000;
                    queue.push(RawSample::new(ts, 477)).unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    let report = gauge.ingestor().drain_queue(&queue).unwrap();
    assert_eq!(report.ingested, 100);
    assert_eq!(report.rejected, 0);

    let store: &Arc<MemoryStore> = gauge.ingestor().store();
    let day = gauge.zone().partition_of(start).unwrap();
    let samples = store.scan_partition(day).unwrap();
    assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}
