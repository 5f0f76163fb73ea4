//! Record accumulator for bulk writes.
//!
//! Collects parsed [`Record`]s and flushes when the size threshold is
//! reached. The ingestion stream is bounded, so there is no time-based
//! trigger; whatever remains at end of stream is drained with [`flush`].
//!
//! [`flush`]: RecordBatcher::flush

use filepipe_core::Record;

/// Accumulates records into fixed-size batches.
pub struct RecordBatcher {
    buffer: Vec<Record>,
    max_size: usize,
}

impl RecordBatcher {
    /// Create a batcher that flushes at `max_size` records.
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_size),
            max_size,
        }
    }

    /// Add one record to the current batch.
    pub fn push(&mut self, record: Record) {
        self.buffer.push(record);
    }

    /// Whether the buffer has reached the size threshold.
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.max_size
    }

    /// Flush the current batch, returning all accumulated records.
    pub fn flush(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.buffer)
    }

    /// Flush only if the threshold is met, otherwise return `None`.
    pub fn try_flush(&mut self) -> Option<Vec<Record>> {
        if self.is_full() {
            Some(self.flush())
        } else {
            None
        }
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
