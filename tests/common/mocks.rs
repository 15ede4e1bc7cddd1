//! Mock versions of the server collaborators.
use mockall::mock;

use bulk_write_rs::{
    BulkError,
    core::{
        Document,
        command::{CommandRunner, LegacyWriter},
    },
};

mock! {
    pub Runner {}
    impl CommandRunner for Runner {
        fn run_command(&self, db: &str, command: &Document) -> Result<Document, BulkError>;
    }
}

mock! {
    pub Legacy {}
    impl CommandRunner for Legacy {
        fn run_command(&self, db: &str, command: &Document) -> Result<Document, BulkError>;
    }
    impl LegacyWriter for Legacy {
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
}
