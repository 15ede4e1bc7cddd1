use log::debug;

use super::{batch::Batch, operation::Operation};

/// Maximum number of operations in one write command.
pub const MAX_BATCH_COUNT: usize = 1000;

/// Maximum cumulative serialized size of one write command's operations (16 MiB).
pub const MAX_BATCH_BYTES: usize = 16 * 1024 * 1024;

/// Bounds applied when splitting operations into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_count: usize,
    pub max_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_count: MAX_BATCH_COUNT,
            max_bytes: MAX_BATCH_BYTES,
        }
    }
}

/// Admission control for a bulk request.
///
/// Operations are appended to the open batch until the count limit, the byte
/// limit or a change of operation type forces it closed. A single oversized
/// operation still gets a batch of its own; rejecting it is up to the server.
#[derive(Debug, Default)]
pub struct BatchSplitter {
    limits: BatchLimits,
    current: Option<Batch>,
    closed: Vec<Batch>,
    next_index: usize,
}

impl BatchSplitter {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            current: None,
            closed: Vec::new(),
            next_index: 0,
        }
    }

    /// Appends an operation, closing the open batch first when it cannot take it.
    ///
    /// Returns the index of the operation in the whole bulk request.
    pub fn admit(&mut self, operation: Operation) -> usize {
        let size = operation.serialized_size();
        let operation_type = operation.operation_type();

        let must_split = match &self.current {
            Some(batch) => {
                batch.operation_type() != operation_type
                    || batch.len() + 1 > self.limits.max_count
                    || (!batch.is_empty() && batch.size_bytes() + size > self.limits.max_bytes)
            }
            None => false,
        };

        if must_split {
            self.close_current();
        }

        let index = self.next_index;
        let batch = self.current.get_or_insert_with(|| {
            debug!("Open {} batch at index {}", operation_type, index);
            Batch::new(operation_type, index)
        });
        batch.push(operation, size);
        self.next_index += 1;

        index
    }

    fn close_current(&mut self) {
        if let Some(batch) = self.current.take() {
            debug!(
                "Close {} batch at index {}: {} operations, {} bytes",
                batch.operation_type(),
                batch.base_index(),
                batch.len(),
                batch.size_bytes()
            );
            self.closed.push(batch);
        }
    }

    /// Closes the open batch, if any.
    pub fn flush(&mut self) {
        self.close_current();
    }

    /// Number of operations admitted so far.
    pub fn operation_count(&self) -> usize {
        self.next_index
    }

    /// Closed batches followed by the open one.
    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.closed.iter().chain(self.current.iter())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::{Document, into_document, operation::OperationType};

    fn insert(value: serde_json::Value) -> Operation {
        Operation::Insert(into_document(value, "document").unwrap())
    }

    fn flushed(splitter: &mut BatchSplitter) -> Vec<Batch> {
        splitter.flush();
        splitter.batches().cloned().collect()
    }

    fn update() -> Operation {
        Operation::Update {
            query: Document::new(),
            update: into_document(json!({"$inc": {"x": 1}}), "update").unwrap(),
            multi: false,
            upsert: false,
        }
    }

    #[test]
    fn count_limit_splits_into_full_and_remainder() {
        let mut splitter = BatchSplitter::new(BatchLimits::default());
        for i in 0..=MAX_BATCH_COUNT {
            splitter.admit(insert(json!({"i": 1, "n": i % 2})));
        }

        let batches = flushed(&mut splitter);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), MAX_BATCH_COUNT);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1].base_index(), MAX_BATCH_COUNT);
    }

    #[test]
    fn type_change_always_splits() {
        let mut splitter = BatchSplitter::new(BatchLimits::default());
        splitter.admit(insert(json!({"a": 1})));
        splitter.admit(update());
        splitter.admit(insert(json!({"a": 2})));

        let batches = flushed(&mut splitter);
        let shape: Vec<_> = batches
            .iter()
            .map(|b| (b.operation_type(), b.base_index(), b.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (OperationType::Insert, 0, 1),
                (OperationType::Update, 1, 1),
                (OperationType::Insert, 2, 1),
            ]
        );
    }

    #[test]
    fn byte_limit_splits() {
        let size = insert(json!({"a": "x"})).serialized_size();
        let limits = BatchLimits {
            max_count: 100,
            max_bytes: 2 * size + size / 2,
        };
        let mut splitter = BatchSplitter::new(limits);
        for _ in 0..4 {
            splitter.admit(insert(json!({"a": "x"})));
        }

        let sizes: Vec<_> = flushed(&mut splitter).iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![2, 2]);
    }

    #[test]
    fn oversized_document_gets_its_own_batch() {
        let small = insert(json!({"a": "x"}));
        let limits = BatchLimits {
            max_count: 100,
            max_bytes: small.serialized_size(),
        };
        let mut splitter = BatchSplitter::new(limits);
        splitter.admit(small.clone());
        splitter.admit(insert(json!({"payload": "far larger than the small document"})));
        splitter.admit(small);

        let batches = flushed(&mut splitter);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].len(), 1);
        assert!(batches[1].size_bytes() > limits.max_bytes);
    }

    #[test]
    fn admit_returns_consecutive_indices() {
        let mut splitter = BatchSplitter::new(BatchLimits {
            max_count: 2,
            max_bytes: MAX_BATCH_BYTES,
        });
        let indices: Vec<_> = (0..5).map(|_| splitter.admit(insert(json!({})))).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(splitter.operation_count(), 5);
        assert_eq!(splitter.batches().count(), 3);
    }

    #[test]
    fn flush_on_empty_splitter() {
        let mut splitter = BatchSplitter::default();
        assert!(flushed(&mut splitter).is_empty());
    }
}
