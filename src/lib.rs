#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # Bulk Write for Rust

 Client-side bulk writes for document databases: queue inserts, updates and
 removes, let the crate split them into wire-sized batches, send each batch as
 one write command, and get back a single result whose error and upsert
 indices point at the operations you queued.

 ## Core Concepts

- **Collection:** where a bulk is sent, together with the server capability
  (`WriteStrategy::CommandCapable` or `WriteStrategy::LegacyOnly`).
- **Bulk:** a single-use request. Operations are queued with `insert` and
  `find(..).update(..)` / `find(..).remove()`, then sent with `execute`.
- **Batch:** a run of operations of the same kind bounded by a maximum count
  (1000) and a maximum size (16 MiB). A batch is sent as one command.
- **BatchWriteResult:** the merged outcome: counts, upserted ids, write errors
  and write-concern errors.
- **CommandRunner:** the way commands reach the server. Bring your own, or
  enable one of the transports below.

 An **ordered** bulk stops at the first write error; an **unordered** bulk
 attempts every operation. Write-concern errors never stop a bulk.

 ## Features

| **Feature** | **Description**                                                   |
|-------------|-------------------------------------------------------------------|
| tcp         | Enables a `CommandRunner` sending length-prefixed JSON over TCP   |
| logger      | Enables a `CommandRunner` logging commands, useful for debugging  |
| full        | Enables all available features                                    |

 ## Getting Started

```rust
# use bulk_write_rs::{
#     BulkError,
#     core::{Document, collection::Collection, command::{CommandRunner, WriteStrategy}, options::BulkOptions},
# };
# use serde_json::json;
# struct Server;
# impl CommandRunner for Server {
#     fn run_command(&self, _db: &str, command: &Document) -> Result<Document, BulkError> {
#         let n = ["documents", "updates", "deletes"]
#             .iter()
#             .find_map(|f| command.get(*f).and_then(|v| v.as_array()))
#             .map_or(0, Vec::len);
#         Ok(json!({"ok": 1, "n": n}).as_object().cloned().unwrap_or_default())
#     }
# }
fn main() -> Result<(), BulkError> {
    let server = Server;
    let cars = Collection::new("garage", "cars", WriteStrategy::CommandCapable(&server));

    let mut bulk = cars.initialize_unordered_bulk_op(BulkOptions::default());
    bulk.insert(json!({"make": "Porsche", "model": "356"}))?;
    bulk.insert(json!({"make": "Peugeot", "model": "205"}))?;
    bulk.find(json!({"make": "Mazda"})).upsert().update_one(json!({"$set": {"model": "CX-30"}}))?;
    bulk.find(json!({"make": "Ford"})).remove()?;

    let result = bulk.execute(None)?;

    assert_eq!(result.n_inserted(), 2);
    assert!(result.is_ok());

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for bulk operations
pub mod core;

/// Error types for bulk operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of command runners (for example: tcp and logger)
pub mod transport;
