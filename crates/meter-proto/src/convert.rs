//! Conversions between prost well-known types and `chrono` instants.

use chrono::{DateTime, Utc};
use prost_types::Timestamp;

/// Convert a UTC instant into the protobuf well-known timestamp.
pub fn to_timestamp(at: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

/// Convert a protobuf timestamp back into a UTC instant.
///
/// Returns `None` for timestamps with out-of-range seconds or negative
/// nanos, which a conforming producer never sends.
pub fn from_timestamp(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(timestamp.nanos).ok()?;
    DateTime::from_timestamp(timestamp.seconds, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_roundtrip_preserves_instant() {
        let at = Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).single().unwrap();
        let converted = from_timestamp(&to_timestamp(at)).unwrap();
        assert_eq!(converted, at);
    }

    #[test]
    fn negative_nanos_are_rejected() {
        let timestamp = Timestamp {
            seconds: 1_700_000_000,
            nanos: -1,
        };
        assert!(from_timestamp(&timestamp).is_none());
    }

    #[test]
    fn out_of_range_seconds_are_rejected() {
        let timestamp = Timestamp {
            seconds: i64::MAX,
            nanos: 0,
        };
        assert!(from_timestamp(&timestamp).is_none());
    }
}
