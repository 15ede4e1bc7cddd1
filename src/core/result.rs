use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{Document, write_error::WriteError};

/// An upserted document: its position in the bulk request and its `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upserted {
    pub index: usize,
    #[serde(rename = "_id")]
    pub id: Value,
}

/// Running totals folded together batch by batch during `execute()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AggregateResult {
    pub n: i64,
    pub n_inserted: i64,
    pub n_updated: i64,
    pub n_upserted: i64,
    pub n_removed: i64,
    pub upserted: Vec<Upserted>,
    #[serde(rename = "writeErrors")]
    pub errors: Vec<WriteError>,
    #[serde(skip)]
    pub write_concern_error_count: usize,
}

impl AggregateResult {
    /// Errors that are not write-concern failures.
    pub fn hard_error_count(&self) -> usize {
        self.errors.len() - self.write_concern_error_count
    }
}

/// Final outcome of a bulk request.
///
/// The result is a read-only view: every accessor returns the same value
/// however many times it is called.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteResult {
    inner: AggregateResult,
}

impl BatchWriteResult {
    pub(crate) fn new(inner: AggregateResult) -> Self {
        Self { inner }
    }

    /// `1` when no write error (other than a write-concern error) occurred, else `0`.
    pub fn ok(&self) -> i32 {
        if self.inner.hard_error_count() == 0 { 1 } else { 0 }
    }

    pub fn n(&self) -> i64 {
        self.inner.n
    }

    pub fn n_inserted(&self) -> i64 {
        self.inner.n_inserted
    }

    pub fn n_updated(&self) -> i64 {
        self.inner.n_updated
    }

    pub fn n_upserted(&self) -> i64 {
        self.inner.n_upserted
    }

    pub fn n_removed(&self) -> i64 {
        self.inner.n_removed
    }

    pub fn get_upserted_ids(&self) -> &[Upserted] {
        &self.inner.upserted
    }

    pub fn get_upserted_id_at(&self, index: usize) -> Option<&Upserted> {
        self.inner.upserted.get(index)
    }

    pub fn has_errors(&self) -> bool {
        !self.inner.errors.is_empty()
    }

    pub fn get_error_count(&self) -> usize {
        self.inner.errors.len()
    }

    /// Every error, write-concern errors included, in the order they were merged.
    pub fn get_errors(&self) -> &[WriteError] {
        &self.inner.errors
    }

    /// Errors raised by the operations themselves.
    pub fn get_write_errors(&self) -> Vec<&WriteError> {
        self.inner
            .errors
            .iter()
            .filter(|error| !error.is_write_concern_error())
            .collect()
    }

    /// Errors raised while waiting for the write concern.
    pub fn get_wc_errors(&self) -> Vec<&WriteError> {
        self.inner
            .errors
            .iter()
            .filter(|error| error.is_write_concern_error())
            .collect()
    }

    /// `true` when the bulk completed without any error at all.
    pub fn is_ok(&self) -> bool {
        !self.has_errors()
    }

    /// The aggregate as a reply-shaped document.
    pub fn raw_response(&self) -> Document {
        let mut response = match serde_json::to_value(&self.inner) {
            Ok(Value::Object(map)) => map,
            _ => Document::new(),
        };
        response.insert("ok".to_string(), Value::from(self.ok()));
        response
    }
}

impl fmt::Display for BatchWriteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BatchWriteResult({{ ok: {}, n: {}, nInserted: {}, nUpdated: {}, nUpserted: {}, nRemoved: {}, errors: {} }})",
            self.ok(),
            self.n(),
            self.n_inserted(),
            self.n_updated(),
            self.n_upserted(),
            self.n_removed(),
            self.get_error_count()
        )
    }
}
