#![allow(dead_code)]

mod mocks;

pub use mocks::{MockLegacy, MockRunner};

use bulk_write_rs::core::Document;
use serde_json::Value;

/// Turns a `json!` literal into a document.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("not a document: {other}"),
    }
}

/// Operations carried by a write command, whatever its kind.
pub fn payload(command: &Document) -> &[Value] {
    ["documents", "updates", "deletes"]
        .iter()
        .find_map(|field| command.get(*field).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
