use std::fmt;

use serde::Serialize;

use super::operation::Operation;

/// Code reported when neither the server nor the transport supplied one.
pub const UNKNOWN_ERROR: i64 = 8;

/// Code marking a write-concern failure. Such errors do not stop an ordered bulk.
pub const WRITE_CONCERN_FAILED: i64 = 64;

/// Top-level code of a reply whose failures are all listed in `errDetails`.
pub const MULTIPLE_ERRORS_OCCURRED: i64 = 65;

/// An error attached to one operation of a bulk request.
///
/// `index` always refers to the position of the operation in the whole bulk
/// request, never to its position inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteError {
    index: usize,
    code: i64,
    errmsg: String,
    #[serde(rename = "op")]
    operation: Operation,
}

impl WriteError {
    pub(crate) fn new(index: usize, code: i64, errmsg: String, operation: Operation) -> Self {
        Self {
            index,
            code,
            errmsg,
            operation,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn errmsg(&self) -> &str {
        &self.errmsg
    }

    /// The operation that failed.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn is_write_concern_error(&self) -> bool {
        self.code == WRITE_CONCERN_FAILED
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WriteError({{ index: {}, code: {}, errmsg: {:?} }})",
            self.index, self.code, self.errmsg
        )
    }
}
