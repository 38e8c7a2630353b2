//! Re-ingesting a recorded gateway log

mod common;

use common::gauge;
use fuelgauge_core::stream::ReplayStream;

const LOG: &str = "\
ServerDateTime,AnalogIN1
2024-03-10 09:00:00.000,5836
2024-03-10 10:00:00.000,4464
not a reading
2024-03-10 11:00:00.000,2561
";

#[test]
fn replayed_log_answers_like_live_ingestion() {
    let gauge = gauge();
    let mut stream = ReplayStream::new(LOG.as_bytes(), gauge.zone()).with_skip_lines(1);

    let report = gauge.ingestor().pump(&mut stream).unwrap();
    assert_eq!(report.ingested, 3);
    assert_eq!(report.malformed, 1);
    assert!(report.finished);
    assert_eq!(stream.stats().lines_processed, 5);

    let hit = gauge.query_local("2024-03-10 10:30:00").unwrap().unwrap();
    assert_eq!(hit.fuel_level, 31.5);
}
