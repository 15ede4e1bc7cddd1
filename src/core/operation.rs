use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::Document;

/// Kind of write an operation performs. A batch only ever holds one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Insert,
    Update,
    Remove,
}

impl OperationType {
    /// Name of the write command carrying this kind of operation.
    pub fn command_name(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Remove => "delete",
        }
    }

    /// Field of the write command holding the operation list.
    pub fn payload_field(&self) -> &'static str {
        match self {
            OperationType::Insert => "documents",
            OperationType::Update => "updates",
            OperationType::Remove => "deletes",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Insert => write!(f, "insert"),
            OperationType::Update => write!(f, "update"),
            OperationType::Remove => write!(f, "remove"),
        }
    }
}

/// How many documents a remove may delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveLimit {
    /// Every matching document (`limit: 0` on the wire).
    All,
    /// At most one document (`limit: 1` on the wire).
    Single,
}

impl RemoveLimit {
    pub fn as_wire(&self) -> i64 {
        match self {
            RemoveLimit::All => 0,
            RemoveLimit::Single => 1,
        }
    }
}

/// A single write queued in a bulk request.
///
/// Operations are immutable once appended to a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Insert(Document),
    Update {
        query: Document,
        update: Document,
        multi: bool,
        upsert: bool,
    },
    Remove {
        query: Document,
        limit: RemoveLimit,
    },
}

impl Operation {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::Insert(_) => OperationType::Insert,
            Operation::Update { .. } => OperationType::Update,
            Operation::Remove { .. } => OperationType::Remove,
        }
    }

    /// Wire form of the operation as it appears inside a write command:
    /// the document for inserts, `{q, u, multi, upsert}` for updates and
    /// `{q, limit}` for removes.
    pub fn to_wire(&self) -> Value {
        match self {
            Operation::Insert(document) => Value::Object(document.clone()),
            Operation::Update {
                query,
                update,
                multi,
                upsert,
            } => json!({
                "q": query,
                "u": update,
                "multi": multi,
                "upsert": upsert,
            }),
            Operation::Remove { query, limit } => json!({
                "q": query,
                "limit": limit.as_wire(),
            }),
        }
    }

    /// BSON size in bytes of the wire form, the unit of the server's batch limit.
    ///
    /// Integers beyond the BSON range have no BSON encoding; such operations
    /// are measured by their JSON length instead.
    pub fn serialized_size(&self) -> usize {
        let wire = self.to_wire();
        match bson::serialize_to_vec(&wire) {
            Ok(bytes) => bytes.len(),
            Err(_) => serde_json::to_vec(&wire).map_or(0, |bytes| bytes.len()),
        }
    }
}
