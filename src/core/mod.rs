use rand::distr::{Alphanumeric, SampleString};
use serde_json::{Map, Value};

use crate::BulkError;

pub mod batch;

pub mod bulk;

pub mod collection;

pub mod command;

pub mod executor;

pub mod merge;

pub mod operation;

pub mod options;

pub mod result;

pub mod selector;

pub mod splitter;

pub mod write_error;

/// A document is a JSON object: user documents, queries, commands and replies alike.
pub type Document = Map<String, Value>;

/// Generates a random name consisting of alphanumeric characters.
///
/// # Returns
///
/// A `String` containing the generated random name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}

/// Unwraps a JSON value into a [`Document`].
///
/// Arrays and scalars are rejected with [`BulkError::InvalidUsage`], `what` names
/// the argument in the error message.
pub(crate) fn into_document(value: Value, what: &str) -> Result<Document, BulkError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(BulkError::InvalidUsage(format!(
            "{what} must be a single document, not an array"
        ))),
        other => Err(BulkError::InvalidUsage(format!(
            "{what} must be a document, got {other}"
        ))),
    }
}
