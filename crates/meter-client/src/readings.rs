//! Synthetic reading generation.

use chrono::Utc;
use meter_proto::convert::to_timestamp;
use meter_proto::meter::ReadingMessage;
use rand::Rng;

/// Produces readings for the worker loop.
///
/// Real deployments read hardware; this seam lets tests supply fixed
/// values.
pub trait ReadingFactory: Send {
    /// Produce one reading for the given customer, stamped with the current
    /// time.
    fn generate(&mut self, customer_id: i32) -> ReadingMessage;
}

/// Factory producing random plausible meter values.
#[derive(Debug, Clone)]
pub struct SyntheticReadingFactory {
    min_value: i32,
    max_value: i32,
}

impl Default for SyntheticReadingFactory {
    fn default() -> Self {
        Self {
            min_value: 1_000,
            max_value: 9_999,
        }
    }
}

impl SyntheticReadingFactory {
    /// Factory emitting values in `min_value..=max_value`.
    pub fn new(min_value: i32, max_value: i32) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

impl ReadingFactory for SyntheticReadingFactory {
    fn generate(&mut self, customer_id: i32) -> ReadingMessage {
        ReadingMessage {
            customer_id,
            reading_time: Some(to_timestamp(Utc::now())),
            reading_value: rand::thread_rng().gen_range(self.min_value..=self.max_value),
        }
    }
}
