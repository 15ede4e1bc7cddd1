#[cfg(feature = "tcp")]
/// This module provides a `CommandRunner` speaking length-prefixed JSON over TCP.
pub mod tcp;

#[cfg(feature = "logger")]
/// This module provides a `CommandRunner` that logs commands and acknowledges them, useful for debugging purposes.
pub mod logger;
