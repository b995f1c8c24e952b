//! Logging abstractions for runtime-agnostic logging
//!
//! Loggers are passed to components explicitly; there is no global logger.

mod traits;
mod noop;
mod console;

pub use traits::{Logger, LoggerExt, SharedLogger};
pub use noop::{NoOpLogger, MemoryLogger};
pub use console::ConsoleLogger;
