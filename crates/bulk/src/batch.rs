/// One opaque record, committed as a single line of the payload.
pub type Record = Vec<u8>;

/// Records waiting for the next commit of one worker.
///
/// The size estimate is kept as a running sum so threshold checks after
/// every append never rescan the batch.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<Record>,
    size_in_bytes: usize,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            size_in_bytes: 0,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.size_in_bytes += record.len();
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of the byte lengths of all records, separators excluded.
    pub fn estimated_size(&self) -> usize {
        self.size_in_bytes
    }

    /// Serialize into a stream load body: every record followed by `\n`,
    /// in insertion order.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_in_bytes + self.records.len());
        for record in &self.records {
            buf.extend_from_slice(record);
            buf.push(b'\n');
        }
        buf
    }

    /// Drop every record. Allocated capacity is kept for the next batch.
    pub fn reset(&mut self) {
        self.records.clear();
        self.size_in_bytes = 0;
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
