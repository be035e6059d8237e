//! Per-reading acceptance rule and structured rejection metadata.

use meter_proto::meter::ReadingMessage;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Code, Status};
use tracing::debug;

/// Readings below this value are rejected as implausible meter data.
pub const MINIMUM_READING_VALUE: i32 = 1000;

/// Check a single reading against the acceptance rule.
///
/// A failing reading produces an `OutOfRange` status carrying the rejected
/// value and the offending field as trailer metadata. Callers abort the
/// batch on the first rejection; no later reading is examined.
pub fn validate_reading(reading: &ReadingMessage) -> Result<(), Status> {
    if reading.reading_value < MINIMUM_READING_VALUE {
        debug!(
            customer_id = reading.customer_id,
            reading_value = reading.reading_value,
            "reading value below acceptable level"
        );
        return Err(rejection(reading.reading_value));
    }
    Ok(())
}

// Metadata keys travel as HTTP/2 headers and must stay lowercase; clients
// match them case-insensitively.
fn rejection(value: i32) -> Status {
    let mut metadata = MetadataMap::new();
    if let Ok(bad_data) = value.to_string().parse() {
        metadata.insert("baddata", bad_data);
    }
    metadata.insert("field", MetadataValue::from_static("Reading Value"));
    metadata.insert("message", MetadataValue::from_static("Readings are invalid"));

    Status::with_metadata(Code::OutOfRange, "Value too low", metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meter_proto::convert::to_timestamp;

    fn reading(value: i32) -> ReadingMessage {
        ReadingMessage {
            customer_id: 7,
            reading_time: Some(to_timestamp(Utc::now())),
            reading_value: value,
        }
    }

    #[test]
    fn accepts_reading_at_threshold() {
        assert!(validate_reading(&reading(MINIMUM_READING_VALUE)).is_ok());
    }

    #[test]
    fn accepts_reading_above_threshold() {
        assert!(validate_reading(&reading(1500)).is_ok());
    }

    #[test]
    fn rejects_reading_below_threshold_with_metadata() {
        let status = validate_reading(&reading(500)).unwrap_err();

        assert_eq!(status.code(), Code::OutOfRange);
        let metadata = status.metadata();
        assert_eq!(
            metadata.get("baddata").and_then(|v| v.to_str().ok()),
            Some("500")
        );
        assert_eq!(
            metadata.get("field").and_then(|v| v.to_str().ok()),
            Some("Reading Value")
        );
        assert_eq!(
            metadata.get("message").and_then(|v| v.to_str().ok()),
            Some("Readings are invalid")
        );
    }

    #[test]
    fn rejects_negative_reading() {
        let status = validate_reading(&reading(-25)).unwrap_err();
        assert_eq!(
            status.metadata().get("baddata").and_then(|v| v.to_str().ok()),
            Some("-25")
        );
    }
}
