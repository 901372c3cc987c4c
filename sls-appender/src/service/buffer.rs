//! Batch buffer service
//!
//! Holds flush-ready records between flush ticks. Records are appended in
//! arrival order and removed all at once: [`BatchBufferService::take`]
//! swaps the pending sequence for an empty one under the lock, so a record
//! pushed concurrently with a flush lands either in the taken sequence or in
//! the next one, never both and never neither.

use sls_core::domain::record::BatchedRecord;
use std::sync::{Arc, Mutex, PoisonError};

/// Service for buffering records until the next flush
pub trait BatchBufferService: Send + Sync {
    /// Appends a record, returning the number of records now pending
    fn push(&self, record: BatchedRecord) -> usize;

    /// Removes and returns every pending record, leaving the buffer empty
    fn take(&self) -> Vec<BatchedRecord>;

    /// Number of pending records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory implementation of BatchBufferService
///
/// Storage is only allocated once the first record arrives.
#[derive(Clone, Default)]
pub struct InMemoryBatchBuffer {
    records: Arc<Mutex<Vec<BatchedRecord>>>,
}

impl InMemoryBatchBuffer {
    /// Creates a new, empty buffer
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchBufferService for InMemoryBatchBuffer {
    fn push(&self, record: BatchedRecord) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
        records.len()
    }

    fn take(&self) -> Vec<BatchedRecord> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *records)
    }

    fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
