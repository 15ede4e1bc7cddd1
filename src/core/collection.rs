use super::{
    bulk::{Bulk, BulkBuilder},
    command::WriteStrategy,
    options::BulkOptions,
};

/// Handle on a collection: where bulk requests are sent and how.
pub struct Collection<'a> {
    db: String,
    name: String,
    strategy: WriteStrategy<'a>,
}

impl<'a> Collection<'a> {
    pub fn new(db: impl Into<String>, name: impl Into<String>, strategy: WriteStrategy<'a>) -> Self {
        Self {
            db: db.into(),
            name: name.into(),
            strategy,
        }
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<db>.<collection>`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.db, self.name)
    }

    pub fn strategy(&self) -> WriteStrategy<'a> {
        self.strategy
    }

    /// Starts a bulk that stops at the first write error.
    pub fn initialize_ordered_bulk_op(&self, options: BulkOptions) -> Bulk<'a> {
        BulkBuilder::new(self).ordered(true).options(options).build()
    }

    /// Starts a bulk that attempts every operation whatever fails.
    pub fn initialize_unordered_bulk_op(&self, options: BulkOptions) -> Bulk<'a> {
        BulkBuilder::new(self).ordered(false).options(options).build()
    }
}
