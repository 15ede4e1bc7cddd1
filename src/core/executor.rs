use log::{debug, warn};
use serde_json::{Value, json};

use crate::BulkError;

use super::{
    Document,
    batch::Batch,
    command::{CommandRunner, LegacyWriter, WriteStrategy},
    merge::ResultMerger,
    operation::{Operation, OperationType, RemoveLimit},
    write_error::{MULTIPLE_ERRORS_OCCURRED, UNKNOWN_ERROR, WRITE_CONCERN_FAILED},
};

/// Sends batches to the server and feeds every reply to a [`ResultMerger`].
pub struct BatchExecutor<'a> {
    strategy: WriteStrategy<'a>,
    db: &'a str,
    collection: &'a str,
    ordered: bool,
    write_concern: Option<&'a Document>,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        strategy: WriteStrategy<'a>,
        db: &'a str,
        collection: &'a str,
        ordered: bool,
        write_concern: Option<&'a Document>,
    ) -> Self {
        Self {
            strategy,
            db,
            collection,
            ordered,
            write_concern,
        }
    }

    pub fn execute(&self, batch: &Batch, merger: &mut ResultMerger) {
        match self.strategy {
            WriteStrategy::CommandCapable(runner) => self.execute_command(runner, batch, merger),
            WriteStrategy::LegacyOnly(writer) => self.execute_legacy(writer, batch, merger),
        }
    }

    fn execute_command(&self, runner: &dyn CommandRunner, batch: &Batch, merger: &mut ResultMerger) {
        let command = batch.to_command(self.collection, self.ordered, self.write_concern);

        debug!(
            "Send {} command for batch at index {} ({} operations)",
            batch.operation_type().command_name(),
            batch.base_index(),
            batch.len()
        );

        let reply = match runner.run_command(self.db, &command) {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    "Write command for batch at index {} failed: {}",
                    batch.base_index(),
                    error
                );
                failure_reply(&error)
            }
        };

        merger.merge(batch, &reply);
    }

    fn execute_legacy(&self, writer: &dyn LegacyWriter, batch: &Batch, merger: &mut ResultMerger) {
        let namespace = format!("{}.{}", self.db, self.collection);

        debug!(
            "Emulate batch at index {} with {} legacy {} operations",
            batch.base_index(),
            batch.len(),
            batch.operation_type()
        );

        for (offset, operation) in batch.operations().iter().enumerate() {
            let reply = match self.legacy_write(writer, &namespace, operation) {
                Ok(acknowledgment) => legacy_reply(operation.operation_type(), &acknowledgment),
                Err(error) => {
                    warn!(
                        "Legacy {} at index {} failed: {}",
                        operation.operation_type(),
                        batch.base_index() + offset,
                        error
                    );
                    failure_reply(&error)
                }
            };

            let hard_errors = merger.hard_error_count();
            merger.merge(
                &Batch::single(batch.base_index() + offset, operation.clone()),
                &reply,
            );

            // Write concern notes do not stop an ordered bulk, hard errors do.
            if self.ordered && merger.hard_error_count() > hard_errors {
                debug!(
                    "Stop legacy emulation at index {}",
                    batch.base_index() + offset
                );
                break;
            }
        }
    }

    /// Issues one legacy write and reads its acknowledgment back.
    fn legacy_write(
        &self,
        writer: &dyn LegacyWriter,
        namespace: &str,
        operation: &Operation,
    ) -> Result<Document, BulkError> {
        match operation {
            Operation::Insert(document) => writer.insert(namespace, document)?,
            Operation::Update {
                query,
                update,
                multi,
                upsert,
            } => writer.update(namespace, query, update, *upsert, *multi)?,
            Operation::Remove { query, limit } => {
                writer.remove(namespace, query, *limit == RemoveLimit::Single)?
            }
        }

        writer.run_command(self.db, &self.get_last_error_command())
    }

    fn get_last_error_command(&self) -> Document {
        let mut command = Document::new();
        command.insert("getLastError".to_string(), Value::from(1));
        if let Some(write_concern) = self.write_concern {
            for (key, value) in write_concern {
                command.insert(key.clone(), value.clone());
            }
        }
        command
    }
}

/// Reply standing in for a command that never got one.
fn failure_reply(error: &BulkError) -> Document {
    let code = error.code().map_or(Value::from("unknown"), Value::from);
    let message = match error {
        BulkError::Transport { message, .. } => message.clone(),
        other => other.to_string(),
    };

    let mut reply = Document::new();
    reply.insert("ok".to_string(), Value::from(0));
    reply.insert("code".to_string(), code);
    reply.insert("errmsg".to_string(), Value::String(message));
    reply
}

/// Turns a `getLastError` acknowledgment into a write-command shaped reply for
/// the single operation it acknowledges.
///
/// Replication notes (`wnote`, `jnote`, `wtimeout`) become a write-concern
/// error while the write itself still counts. Any other `err`, an `errmsg`, or
/// `ok: 0` is a hard error.
fn legacy_reply(operation_type: OperationType, acknowledgment: &Document) -> Document {
    let err = text_field(acknowledgment, "err");

    let note = ["wnote", "jnote", "wtimeout"].iter().find_map(|key| {
        acknowledgment
            .get(*key)
            .filter(|note| is_truthy(note))
            .map(|note| match note.as_str() {
                Some(text) if *key != "wtimeout" => text.to_string(),
                _ => err.clone().unwrap_or_else(|| key.to_string()),
            })
    });

    let failed = acknowledgment.get("ok").is_some_and(|ok| !is_truthy(ok));
    let err = err
        .or_else(|| text_field(acknowledgment, "errmsg"))
        .or_else(|| failed.then(|| "getLastError failed".to_string()));

    if note.is_none()
        && let Some(err) = err
    {
        let code = acknowledgment
            .get("code")
            .and_then(Value::as_i64)
            .unwrap_or(UNKNOWN_ERROR);
        return match json!({"ok": 0, "n": 0, "code": code, "errmsg": err}) {
            Value::Object(reply) => reply,
            _ => Document::new(),
        };
    }

    let n = match operation_type {
        OperationType::Insert => 1,
        _ => acknowledgment.get("n").and_then(Value::as_i64).unwrap_or(0),
    };

    let mut reply = Document::new();
    reply.insert("ok".to_string(), Value::from(1));
    reply.insert("n".to_string(), Value::from(n));

    if let Some(id) = acknowledgment.get("upserted").filter(|id| !id.is_null()) {
        reply.insert(
            "upserted".to_string(),
            json!([{"index": 0, "_id": id}]),
        );
    }

    if let Some(note) = note {
        reply.insert("ok".to_string(), Value::from(0));
        reply.insert("code".to_string(), Value::from(MULTIPLE_ERRORS_OCCURRED));
        reply.insert(
            "errDetails".to_string(),
            json!([{"index": 0, "code": WRITE_CONCERN_FAILED, "errmsg": note}]),
        );
    }

    reply
}

/// A non-null field as text; non-string values are rendered as JSON.
fn text_field(document: &Document, key: &str) -> Option<String> {
    document
        .get(key)
        .filter(|value| !value.is_null())
        .map(|value| value.as_str().map_or_else(|| value.to_string(), str::to_string))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}
