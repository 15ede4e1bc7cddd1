use log::info;
use serde_json::Value;

use crate::{
    BulkError,
    core::{Document, command::CommandRunner},
};

/// Logs every command and acknowledges it as fully applied, without a server.
#[derive(Default)]
pub struct LoggerRunner {}

impl CommandRunner for LoggerRunner {
    fn run_command(&self, db: &str, command: &Document) -> Result<Document, BulkError> {
        info!("Command on {}: {}", db, Value::Object(command.clone()));

        let n = ["documents", "updates", "deletes"]
            .iter()
            .find_map(|field| command.get(*field).and_then(Value::as_array))
            .map_or(0, Vec::len);

        let mut reply = Document::new();
        reply.insert("ok".to_string(), Value::from(1));
        reply.insert("n".to_string(), Value::from(n));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::into_document;

    #[test]
    fn acknowledges_every_operation() {
        let command = into_document(
            json!({"delete": "c", "deletes": [{"q": {}, "limit": 0}, {"q": {}, "limit": 1}]}),
            "command",
        )
        .unwrap();

        let reply = LoggerRunner::default().run_command("db", &command).unwrap();
        assert_eq!(Value::Object(reply), json!({"ok": 1, "n": 2}));
    }
}
