use std::collections::BTreeSet;

use log::debug;
use serde_json::Value;

use super::{
    Document,
    batch::Batch,
    operation::OperationType,
    result::{AggregateResult, BatchWriteResult, Upserted},
    write_error::{MULTIPLE_ERRORS_OCCURRED, UNKNOWN_ERROR, WRITE_CONCERN_FAILED, WriteError},
};

/// Folds per-batch replies into one aggregate result.
///
/// Local indices reported by the server are shifted by the batch's base index,
/// so every recorded error or upsert points into the whole bulk request.
/// Merging never fails: malformed or failed replies only add errors.
#[derive(Debug)]
pub struct ResultMerger {
    ordered: bool,
    aggregate: AggregateResult,
}

impl ResultMerger {
    pub fn new(ordered: bool) -> Self {
        Self {
            ordered,
            aggregate: AggregateResult::default(),
        }
    }

    /// Errors recorded so far that are not write-concern errors.
    pub fn hard_error_count(&self) -> usize {
        self.aggregate.hard_error_count()
    }

    pub fn merge(&mut self, batch: &Batch, reply: &Document) {
        let n = reply.get("n").and_then(as_integer).unwrap_or(0);
        self.aggregate.n += n;

        match batch.operation_type() {
            OperationType::Insert => self.aggregate.n_inserted += n,
            OperationType::Remove => self.aggregate.n_removed += n,
            OperationType::Update => {}
        }

        let upserted = reply.get("upserted").map(upserted_entries).unwrap_or_default();
        for (local_index, id) in &upserted {
            self.aggregate.n_upserted += 1;
            self.aggregate.upserted.push(Upserted {
                index: batch.base_index() + local_index,
                id: id.clone(),
            });
        }
        if batch.operation_type() == OperationType::Update {
            let n_upserted = upserted.len() as i64;
            self.aggregate.n_updated += (n - n_upserted).max(0);
        }

        if is_ok(reply) {
            return;
        }

        let details = reply
            .get("errDetails")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut failed = BTreeSet::new();
        let mut last_index = None;
        for detail in details {
            let local_index = detail
                .get("index")
                .and_then(as_integer)
                .map_or(0, |index| index.max(0) as usize);
            let code = detail.get("code").and_then(as_integer).unwrap_or(UNKNOWN_ERROR);
            let errmsg = detail
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            failed.insert(local_index);
            last_index = Some(local_index);
            self.record(batch, local_index, code, errmsg);
        }

        let fallback_code = reply.get("code");
        let apply_fallback = match fallback_code {
            Some(code) => as_integer(code) != Some(MULTIPLE_ERRORS_OCCURRED),
            None => details.is_empty(),
        };
        if !apply_fallback {
            return;
        }

        let attempted = match (self.ordered, last_index) {
            (true, Some(last)) => last.min(batch.len()),
            (true, None) => batch.len().min(1),
            (false, _) => batch.len(),
        };
        let code = fallback_code.and_then(as_integer).unwrap_or(UNKNOWN_ERROR);
        let errmsg = reply
            .get("errmsg")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for local_index in (0..attempted).filter(|index| !failed.contains(index)) {
            self.record(batch, local_index, code, errmsg.clone());
        }
    }

    fn record(&mut self, batch: &Batch, local_index: usize, code: i64, errmsg: String) {
        let Some(operation) = batch.operations().get(local_index) else {
            debug!(
                "Ignore error for index {} outside of batch at {} ({} operations)",
                local_index,
                batch.base_index(),
                batch.len()
            );
            return;
        };

        if code == WRITE_CONCERN_FAILED {
            self.aggregate.write_concern_error_count += 1;
        }
        self.aggregate.errors.push(WriteError::new(
            batch.base_index() + local_index,
            code,
            errmsg,
            operation.clone(),
        ));
    }

    pub fn finish(self) -> BatchWriteResult {
        BatchWriteResult::new(self.aggregate)
    }
}

fn is_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(Value::Bool(ok)) => *ok,
        Some(value) => value.as_f64() == Some(1.0),
        None => false,
    }
}

/// Reads an integral number; floats with no fractional part count too.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Normalises the `upserted` field of a reply into `(local index, id)` pairs.
///
/// Write commands return `[{index, _id}]`; legacy acknowledgments return the
/// `_id` alone, or `{_id}`, for the single operation they acknowledge.
fn upserted_entries(value: &Value) -> Vec<(usize, Value)> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .map(|entry| {
                let index = entry
                    .get("index")
                    .and_then(as_integer)
                    .map_or(0, |index| index.max(0) as usize);
                let id = entry.get("_id").cloned().unwrap_or(Value::Null);
                (index, id)
            })
            .collect(),
        Value::Null => Vec::new(),
        Value::Object(entry) if entry.contains_key("_id") => {
            let index = entry
                .get("index")
                .and_then(as_integer)
                .map_or(0, |index| index.max(0) as usize);
            vec![(index, entry["_id"].clone())]
        }
        id => vec![(0, id.clone())],
    }
}
