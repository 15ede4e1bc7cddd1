use crate::BulkError;

use super::Document;

/// Runs a command document against a database and returns the reply document.
///
/// Implementations report transport failures as `Err`; server-side failures
/// are part of the reply (`ok: 0`).
pub trait CommandRunner {
    fn run_command(&self, db: &str, command: &Document) -> Result<Document, BulkError>;
}

/// Single-document write API of servers without batch write commands.
///
/// Each call is fire-and-forget; the outcome is read back with a
/// `getLastError` command sent through [`CommandRunner::run_command`].
pub trait LegacyWriter: CommandRunner {
    fn insert(&self, namespace: &str, document: &Document) -> Result<(), BulkError>;

    fn update(
        &self,
        namespace: &str,
        query: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
    ) -> Result<(), BulkError>;

    fn remove(&self, namespace: &str, query: &Document, just_one: bool) -> Result<(), BulkError>;
}

/// How batches reach the server, chosen once per collection handle.
#[derive(Clone, Copy)]
pub enum WriteStrategy<'a> {
    /// The server accepts `insert`/`update`/`delete` write commands.
    CommandCapable(&'a dyn CommandRunner),
    /// The server only understands legacy single-document writes.
    LegacyOnly(&'a dyn LegacyWriter),
}

impl WriteStrategy<'_> {
    pub fn supports_write_commands(&self) -> bool {
        matches!(self, WriteStrategy::CommandCapable(_))
    }
}
