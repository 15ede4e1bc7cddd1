use serde_json::Value;

use super::{
    Document,
    operation::{Operation, OperationType},
};

/// A homogeneous run of operations sent to the server as one write command.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    operation_type: OperationType,
    base_index: usize,
    operations: Vec<Operation>,
    size_bytes: usize,
}

impl Batch {
    /// Opens an empty batch whose first operation sits at `base_index` in the bulk request.
    pub fn new(operation_type: OperationType, base_index: usize) -> Batch {
        Batch {
            operation_type,
            base_index,
            operations: Vec::new(),
            size_bytes: 0,
        }
    }

    /// A batch of exactly one operation, used to merge legacy acknowledgments one at a time.
    pub fn single(base_index: usize, operation: Operation) -> Batch {
        let mut batch = Batch::new(operation.operation_type(), base_index);
        let size = operation.serialized_size();
        batch.push(operation, size);
        batch
    }

    /// Appends an operation whose serialized size has already been computed.
    ///
    /// The caller guarantees that the operation has the batch's type.
    pub(crate) fn push(&mut self, operation: Operation, size: usize) {
        debug_assert_eq!(operation.operation_type(), self.operation_type);
        self.operations.push(operation);
        self.size_bytes += size;
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn base_index(&self) -> usize {
        self.base_index
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Builds the write command for this batch.
    ///
    /// ```text
    /// { <insert|update|delete>: <collection>, <documents|updates|deletes>: [...],
    ///   ordered: <bool>, writeConcern?: {...} }
    /// ```
    pub fn to_command(
        &self,
        collection: &str,
        ordered: bool,
        write_concern: Option<&Document>,
    ) -> Document {
        let mut command = Document::new();
        command.insert(
            self.operation_type.command_name().to_string(),
            Value::String(collection.to_string()),
        );
        command.insert(
            self.operation_type.payload_field().to_string(),
            Value::Array(self.operations.iter().map(Operation::to_wire).collect()),
        );
        command.insert("ordered".to_string(), Value::Bool(ordered));
        if let Some(write_concern) = write_concern {
            command.insert(
                "writeConcern".to_string(),
                Value::Object(write_concern.clone()),
            );
        }
        command
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::{into_document, operation::RemoveLimit};

    fn doc(value: Value) -> Document {
        into_document(value, "document").unwrap()
    }

    #[test]
    fn push_tracks_count_and_size() {
        let mut batch = Batch::new(OperationType::Insert, 3);
        batch.push(Operation::Insert(doc(json!({"a": 1}))), 7);
        batch.push(Operation::Insert(doc(json!({"a": 2}))), 7);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.size_bytes(), 14);
        assert_eq!(batch.base_index(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn insert_command_without_write_concern() {
        let batch = Batch::single(0, Operation::Insert(doc(json!({"_id": 1}))));
        let command = batch.to_command("users", true, None);

        assert_eq!(
            Value::Object(command),
            json!({"insert": "users", "documents": [{"_id": 1}], "ordered": true})
        );
    }

    #[test]
    fn delete_command_carries_write_concern() {
        let batch = Batch::single(
            0,
            Operation::Remove {
                query: doc(json!({"a": 1})),
                limit: RemoveLimit::All,
            },
        );
        let write_concern = doc(json!({"w": "majority"}));
        let command = batch.to_command("users", false, Some(&write_concern));

        assert_eq!(
            Value::Object(command),
            json!({
                "delete": "users",
                "deletes": [{"q": {"a": 1}, "limit": 0}],
                "ordered": false,
                "writeConcern": {"w": "majority"}
            })
        );
    }
}
