//! Persistence seam for accepted readings.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A reading mapped for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct MeterReadingRecord {
    /// Customer the reading belongs to.
    pub customer_id: i32,
    /// When the meter was read.
    pub reading_date: DateTime<Utc>,
    /// The metered value.
    pub value: i32,
}

/// Storage collaborator for accepted reading batches.
///
/// `Ok(true)` means the batch was stored, `Ok(false)` that the store refused
/// it; `Err` signals an unexpected storage fault. A batch is always handed
/// over as one call so the store can apply it atomically. Implementations
/// must be safe under concurrent callers.
#[async_trait]
pub trait ReadingRepository: Send + Sync + 'static {
    /// Persist the whole batch.
    async fn save_all(&self, readings: Vec<MeterReadingRecord>) -> anyhow::Result<bool>;
}

/// Repository keeping readings in process memory.
#[derive(Debug, Default)]
pub struct InMemoryReadingRepository {
    readings: Mutex<Vec<MeterReadingRecord>>,
}

impl InMemoryReadingRepository {
    /// Snapshot of everything stored so far.
    pub fn stored(&self) -> Vec<MeterReadingRecord> {
        self.readings
            .lock()
            .map(|readings| readings.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReadingRepository for InMemoryReadingRepository {
    async fn save_all(&self, readings: Vec<MeterReadingRecord>) -> anyhow::Result<bool> {
        let mut stored = self
            .readings
            .lock()
            .map_err(|_| anyhow::anyhow!("reading store lock poisoned"))?;
        stored.extend(readings);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(customer_id: i32, value: i32) -> MeterReadingRecord {
        MeterReadingRecord {
            customer_id,
            reading_date: Utc::now(),
            value,
        }
    }

    #[tokio::test]
    async fn in_memory_repository_accumulates_batches() {
        let repository = InMemoryReadingRepository::default();

        assert!(repository
            .save_all(vec![record(1, 1200), record(1, 1300)])
            .await
            .unwrap());
        assert!(repository.save_all(vec![record(2, 1400)]).await.unwrap());

        let stored = repository.stored();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].customer_id, 2);
    }
}
