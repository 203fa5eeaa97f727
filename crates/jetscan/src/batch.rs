//! Row batching.
//!
//! Rows accumulate up to a fixed capacity and are handed to the caller a
//! batch at a time. Batch boundaries carry no semantic meaning; order is
//! preserved and nothing is reordered within or across batches.

use std::sync::Arc;

use jetscan_core::{Row, RowBatch, RowSchema};

pub(crate) struct BatchEmitter {
    schema: Arc<RowSchema>,
    capacity: usize,
    rows: Vec<Row>,
}

impl BatchEmitter {
    pub(crate) fn new(schema: Arc<RowSchema>, capacity: usize) -> Self {
        Self {
            schema,
            capacity,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row; returns a full batch once capacity is reached.
    pub(crate) fn push(&mut self, row: Row) -> Option<RowBatch> {
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            return self.take();
        }
        None
    }

    /// Flush whatever is buffered, if anything.
    pub(crate) fn finish(&mut self) -> Option<RowBatch> {
        self.take()
    }

    fn take(&mut self) -> Option<RowBatch> {
        if self.rows.is_empty() {
            return None;
        }
        let rows = std::mem::replace(&mut self.rows, Vec::with_capacity(self.capacity));
        Some(RowBatch::new(Arc::clone(&self.schema), rows))
    }
}
