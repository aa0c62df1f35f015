//! Sink traits and error types
//!
//! This module defines the trait every persistence target implements and the
//! errors a sink may report.

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur inside a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{0} is not open")]
    NotOpen(String),

    /// An earlier write failed part way; the sink refuses further rows
    #[error("{0} disabled after an earlier write failure")]
    Disabled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for persistence targets
///
/// A sink owns its underlying handle (file, connection). The sink manager
/// calls `open` once before the first record, `write` once per record, and
/// `close` once when the crawl ends, whatever the outcome.
pub trait Sink: Send {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Acquires the underlying resource and prepares it for writes
    fn open(&mut self) -> SinkResult<()>;

    /// Persists one record
    ///
    /// A record must either be fully persisted or not at all.
    fn write(&mut self, record: &Record) -> SinkResult<()>;

    /// Releases the underlying resource
    ///
    /// Must be safe to call when `open` failed or was never called.
    fn close(&mut self) -> SinkResult<()>;
}
