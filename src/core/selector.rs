use serde_json::Value;

use crate::BulkError;

use super::{
    bulk::Bulk,
    into_document,
    operation::{Operation, RemoveLimit},
};

/// Pending selection returned by [`Bulk::find`].
///
/// The selector is consumed by its terminal call (`update`, `update_one`,
/// `replace_one`, `remove` or `remove_one`), so a selection is used exactly
/// once and nothing carries over to the next `find`.
#[must_use = "a selector does nothing until update or remove is called"]
pub struct FindSelector<'b, 'a> {
    bulk: &'b mut Bulk<'a>,
    query: Value,
    upsert: bool,
}

impl<'b, 'a> FindSelector<'b, 'a> {
    pub(crate) fn new(bulk: &'b mut Bulk<'a>, query: Value) -> Self {
        Self {
            bulk,
            query,
            upsert: false,
        }
    }

    /// Inserts a document when the query matches nothing. Ignored by removes.
    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    /// Updates every matching document.
    pub fn update(self, update: Value) -> Result<(), BulkError> {
        self.push_update(update, true)
    }

    /// Updates the first matching document.
    pub fn update_one(self, update: Value) -> Result<(), BulkError> {
        self.push_update(update, false)
    }

    /// Replaces the first matching document; same wire form as [`Self::update_one`].
    pub fn replace_one(self, replacement: Value) -> Result<(), BulkError> {
        self.push_update(replacement, false)
    }

    /// Removes every matching document.
    pub fn remove(self) -> Result<(), BulkError> {
        self.push_remove(RemoveLimit::All)
    }

    /// Removes the first matching document.
    pub fn remove_one(self) -> Result<(), BulkError> {
        self.push_remove(RemoveLimit::Single)
    }

    fn push_update(self, update: Value, multi: bool) -> Result<(), BulkError> {
        self.bulk.ensure_mutable()?;
        let operation = Operation::Update {
            query: into_document(self.query, "query")?,
            update: into_document(update, "update")?,
            multi,
            upsert: self.upsert,
        };
        self.bulk.push(operation);
        Ok(())
    }

    fn push_remove(self, limit: RemoveLimit) -> Result<(), BulkError> {
        self.bulk.ensure_mutable()?;
        let operation = Operation::Remove {
            query: into_document(self.query, "query")?,
            limit,
        };
        self.bulk.push(operation);
        Ok(())
    }
}
