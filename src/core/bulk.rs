use std::time::Instant;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::BulkError;

use super::{
    Document, build_name,
    collection::Collection,
    command::WriteStrategy,
    executor::BatchExecutor,
    into_document,
    merge::ResultMerger,
    operation::{Operation, OperationType},
    options::BulkOptions,
    result::BatchWriteResult,
    selector::FindSelector,
    splitter::BatchSplitter,
};

/// Lifecycle of a bulk request. A bulk is executed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkState {
    NotExecuted,
    Executing,
    Executed,
}

/// Operations queued in a bulk request, grouped by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub n_insert_ops: usize,
    pub n_update_ops: usize,
    pub n_remove_ops: usize,
    pub n_batches: usize,
}

/// A single-use bulk write request against one collection.
///
/// Operations are split into batches as they are queued; [`Bulk::execute`]
/// sends the batches and merges the replies into a [`BatchWriteResult`].
///
/// # Example
///
/// ```
/// use bulk_write_rs::core::{
///     Document,
///     collection::Collection,
///     command::{CommandRunner, WriteStrategy},
///     options::BulkOptions,
/// };
/// use bulk_write_rs::BulkError;
/// use serde_json::json;
///
/// struct AlwaysOk;
///
/// impl CommandRunner for AlwaysOk {
///     fn run_command(&self, _db: &str, command: &Document) -> Result<Document, BulkError> {
///         let n = command.get("documents").and_then(|d| d.as_array()).map_or(0, Vec::len);
///         Ok(json!({"ok": 1, "n": n}).as_object().cloned().unwrap_or_default())
///     }
/// }
///
/// let runner = AlwaysOk;
/// let users = Collection::new("app", "users", WriteStrategy::CommandCapable(&runner));
///
/// let mut bulk = users.initialize_ordered_bulk_op(BulkOptions::default());
/// bulk.insert(json!({"name": "Ada"}))?;
/// bulk.insert(json!({"name": "Grace"}))?;
///
/// let result = bulk.execute(None)?;
/// assert_eq!(result.n_inserted(), 2);
/// assert!(bulk.execute(None).is_err());
/// # Ok::<(), BulkError>(())
/// ```
pub struct Bulk<'a> {
    /// Unique identifier for this bulk
    id: Uuid,
    /// Human-readable name used in log lines
    name: String,
    db: String,
    collection: String,
    strategy: WriteStrategy<'a>,
    ordered: bool,
    /// Default write concern, overridden by the one given to `execute`
    write_concern: Option<Document>,
    splitter: BatchSplitter,
    summary: BulkSummary,
    state: BulkState,
}

impl<'a> Bulk<'a> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn state(&self) -> BulkState {
        self.state
    }

    /// Number of operations queued so far.
    pub fn operation_count(&self) -> usize {
        self.splitter.operation_count()
    }

    /// Counts of queued operations and of the batches they currently form.
    pub fn summary(&self) -> BulkSummary {
        BulkSummary {
            n_batches: self.splitter.batches().count(),
            ..self.summary
        }
    }

    /// Queues an insert.
    ///
    /// A document without `_id` gets a generated one. Anything but a single
    /// JSON object is rejected.
    pub fn insert(&mut self, document: Value) -> Result<(), BulkError> {
        self.ensure_mutable()?;
        let mut document = into_document(document, "document to insert")?;
        if !document.contains_key("_id") {
            document.insert(
                "_id".to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }
        self.push(Operation::Insert(document));
        Ok(())
    }

    /// Starts an update or remove selecting documents matching `query`.
    pub fn find(&mut self, query: Value) -> FindSelector<'_, 'a> {
        FindSelector::new(self, query)
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), BulkError> {
        match self.state {
            BulkState::NotExecuted => Ok(()),
            _ => Err(BulkError::IllegalState),
        }
    }

    pub(crate) fn push(&mut self, operation: Operation) {
        match operation.operation_type() {
            OperationType::Insert => self.summary.n_insert_ops += 1,
            OperationType::Update => self.summary.n_update_ops += 1,
            OperationType::Remove => self.summary.n_remove_ops += 1,
        }
        self.splitter.admit(operation);
    }

    /// Sends every queued batch and returns the merged result.
    ///
    /// An ordered bulk stops after the first batch that produced a write error
    /// other than a write-concern error; later batches are never sent. Write
    /// failures are reported through the result, only a second call fails.
    pub fn execute(&mut self, write_concern: Option<Document>) -> Result<BatchWriteResult, BulkError> {
        if self.state != BulkState::NotExecuted {
            return Err(BulkError::AlreadyExecuted);
        }
        self.state = BulkState::Executing;

        let start = Instant::now();
        info!("Start of bulk: {}, id: {}", self.name, self.id);

        self.splitter.flush();
        let write_concern = write_concern.or_else(|| self.write_concern.clone());
        let executor = BatchExecutor::new(
            self.strategy,
            &self.db,
            &self.collection,
            self.ordered,
            write_concern.as_ref(),
        );
        let mut merger = ResultMerger::new(self.ordered);

        let batch_count = self.splitter.batches().count();
        for (position, batch) in self.splitter.batches().enumerate() {
            executor.execute(batch, &mut merger);

            if self.ordered && merger.hard_error_count() > 0 {
                let skipped = batch_count - position - 1;
                if skipped > 0 {
                    warn!(
                        "Bulk {} stopped after write error, {} batches not sent",
                        self.name, skipped
                    );
                }
                break;
            }
        }

        self.state = BulkState::Executed;
        let result = merger.finish();

        info!(
            "End of bulk: {}, id: {}, {} in {:?}",
            self.name,
            self.id,
            result,
            start.elapsed()
        );

        Ok(result)
    }
}

/// Builder for [`Bulk`] requests.
///
/// # Example
///
/// ```
/// use bulk_write_rs::core::{bulk::BulkBuilder, collection::Collection, command::CommandRunner};
/// # use bulk_write_rs::{BulkError, core::{Document, command::WriteStrategy}};
/// # struct Noop;
/// # impl CommandRunner for Noop {
/// #     fn run_command(&self, _: &str, _: &Document) -> Result<Document, BulkError> { Ok(Document::new()) }
/// # }
/// # let runner = Noop;
/// # let collection = Collection::new("app", "users", WriteStrategy::CommandCapable(&runner));
///
/// let bulk = BulkBuilder::new(&collection)
///     .name("nightly-import".to_string())
///     .ordered(false)
///     .max_batch_count(500)
///     .build();
///
/// assert_eq!(bulk.name(), "nightly-import");
/// assert!(!bulk.is_ordered());
/// ```
pub struct BulkBuilder<'c, 'a> {
    collection: &'c Collection<'a>,
    ordered: bool,
    options: BulkOptions,
}

impl<'c, 'a> BulkBuilder<'c, 'a> {
    /// Creates a builder for an ordered bulk with default options.
    pub fn new(collection: &'c Collection<'a>) -> Self {
        Self {
            collection,
            ordered: true,
            options: BulkOptions::default(),
        }
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Replaces every option at once.
    pub fn options(mut self, options: BulkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(mut self, name: String) -> Self {
        self.options.name = Some(name);
        self
    }

    pub fn write_concern(mut self, write_concern: Document) -> Self {
        self.options.write_concern = Some(write_concern);
        self
    }

    pub fn max_batch_count(mut self, max_batch_count: usize) -> Self {
        self.options.max_batch_count = max_batch_count;
        self
    }

    pub fn max_batch_bytes(mut self, max_batch_bytes: usize) -> Self {
        self.options.max_batch_bytes = max_batch_bytes;
        self
    }

    pub fn build(self) -> Bulk<'a> {
        let limits = self.options.limits();
        Bulk {
            id: Uuid::new_v4(),
            name: self.options.name.unwrap_or_else(build_name),
            db: self.collection.db().to_string(),
            collection: self.collection.name().to_string(),
            strategy: self.collection.strategy(),
            ordered: self.ordered,
            write_concern: self.options.write_concern,
            splitter: BatchSplitter::new(limits),
            summary: BulkSummary::default(),
            state: BulkState::NotExecuted,
        }
    }
}
