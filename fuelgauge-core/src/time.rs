//! Time model for the engine
//!
//! Instants are milliseconds since the Unix epoch. Everything a human types
//! or a sensor gateway emits is local wall-clock time in one fixed reference
//! zone, and the calendar day in that zone is the partition key:
//!
//! ```text
//! "2024-03-10 10:30:00" ──parse_query──► Timestamp (UTC ms)
//!                                            │
//!                                    partition_of
//!                                            ▼
//!                                  PartitionKey(2024-03-10)
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset};

use crate::errors::{ConfigError, ConfigResult, TimeError, TimeResult};

/// Timestamp in milliseconds since the Unix epoch (UTC)
pub type Timestamp = i64;

/// Offset of the reference deployment (+03:30)
pub const DEFAULT_REFERENCE_OFFSET_SECS: i32 = 3 * 3600 + 30 * 60;

/// Query layout, second precision
pub const QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ingestion layouts, tried in order
const INGEST_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    QUERY_FORMAT,
];

const MILLIS_PER_SECOND: f64 = 1000.0;

/// One calendar day in the reference zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey(pub NaiveDate);

impl PartitionKey {
    /// Build a key from a calendar date
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The calendar date
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl core::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Fixed reference time zone used for parsing and partitioning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    offset: FixedOffset,
}

impl ReferenceZone {
    /// Zone at `offset_secs` east of UTC
    pub fn from_offset_secs(offset_secs: i32) -> ConfigResult<Self> {
        FixedOffset::east_opt(offset_secs)
            .map(|offset| Self { offset })
            .ok_or(ConfigError::InvalidOffset { offset_secs })
    }

    /// UTC
    pub fn utc() -> Self {
        Self { offset: chrono::Utc.fix() }
    }

    /// Seconds east of UTC
    pub fn offset_secs(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Interpret a local wall-clock time in this zone
    pub fn from_local(&self, local: NaiveDateTime) -> Timestamp {
        local.and_utc().timestamp_millis() - i64::from(self.offset_secs()) * 1000
    }

    /// Parse a query timestamp (`YYYY-MM-DD HH:MM:SS`)
    pub fn parse_query(&self, text: &str) -> TimeResult<Timestamp> {
        NaiveDateTime::parse_from_str(text.trim(), QUERY_FORMAT)
            .map(|local| self.from_local(local))
            .map_err(|_| TimeError::Unparseable {
                reason: "expected YYYY-MM-DD HH:MM:SS",
            })
    }

    /// Parse an ingestion timestamp (`YYYY-MM-DD HH:MM:SS.fff`, fraction optional)
    pub fn parse_ingest(&self, text: &str) -> TimeResult<Timestamp> {
        let text = text.trim();
        INGEST_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|local| self.from_local(local))
            .ok_or(TimeError::Unparseable {
                reason: "expected YYYY-MM-DD HH:MM:SS.fff",
            })
    }

    /// Local wall-clock time of an instant
    pub fn to_local(&self, timestamp: Timestamp) -> TimeResult<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(timestamp)
            .map(|utc| utc.with_timezone(&self.offset))
            .ok_or(TimeError::OutOfRange { millis: timestamp })
    }

    /// Render an instant as local `YYYY-MM-DD HH:MM:SS.fff`
    pub fn format(&self, timestamp: Timestamp) -> TimeResult<String> {
        self.to_local(timestamp)
            .map(|local| local.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
    }

    /// Day partition holding an instant
    pub fn partition_of(&self, timestamp: Timestamp) -> TimeResult<PartitionKey> {
        self.to_local(timestamp)
            .map(|local| PartitionKey(local.date_naive()))
    }
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_REFERENCE_OFFSET_SECS)
                .unwrap_or_else(|| chrono::Utc.fix()),
        }
    }
}

/// Seconds elapsed between two instants (negative if `later` precedes `earlier`)
pub fn elapsed_secs(earlier: Timestamp, later: Timestamp) -> f64 {
    (later - earlier) as f64 / MILLIS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_round_trip_in_reference_zone() {
        let zone = ReferenceZone::default();
        let ts = zone.parse_query("2024-03-10 10:30:00").unwrap();

        assert_eq!(zone.format(ts).unwrap(), "2024-03-10 10:30:00.000");
        // 10:30 at +03:30 is 07:00 UTC
        assert_eq!(ts % 86_400_000, 7 * 3_600_000);
    }

    #[test]
    fn ingest_accepts_fraction_and_t_separator() {
        let zone = ReferenceZone::utc();
        let a = zone.parse_ingest("2024-03-10 10:30:00.250").unwrap();
        let b = zone.parse_ingest("2024-03-10T10:30:00.25").unwrap();
        let c = zone.parse_ingest("2024-03-10 10:30:00").unwrap();

        assert_eq!(a, b);
        assert_eq!(a - c, 250);
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        let zone = ReferenceZone::default();
        assert!(zone.parse_query("10/03/2024 10:30").is_err());
        assert!(zone.parse_ingest("").is_err());
    }

    #[test]
    fn partition_follows_local_midnight() {
        let zone = ReferenceZone::default();
        // 23:59 local and 00:00 local the next day land in different partitions
        let before = zone.parse_query("2024-03-10 23:59:59").unwrap();
        let after = zone.parse_query("2024-03-11 00:00:00").unwrap();

        assert_eq!(zone.partition_of(before).unwrap(), PartitionKey::from_ymd(2024, 3, 10).unwrap());
        assert_eq!(zone.partition_of(after).unwrap(), PartitionKey::from_ymd(2024, 3, 11).unwrap());
    }

    #[test]
    fn offset_is_validated() {
        assert!(ReferenceZone::from_offset_secs(90_000).is_err());
        assert_eq!(ReferenceZone::from_offset_secs(-3600).unwrap().offset_secs(), -3600);
    }

    #[test]
    fn elapsed_is_in_seconds() {
        assert_eq!(elapsed_secs(1_000, 3_601_000), 3600.0);
        assert_eq!(elapsed_secs(2_000, 1_500), -0.5);
    }
}
