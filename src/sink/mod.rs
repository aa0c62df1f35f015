//! Sinks for persisting extracted records
//!
//! Two sinks ship with the crawler:
//! - CSV file with a header row
//! - SQLite database with an auto-incrementing `books` table
//!
//! Both are driven through [`SinkManager`], which keeps their lifecycles
//! independent of each other.

mod csv_sink;
mod manager;
mod schema;
mod sqlite_sink;
mod traits;

pub use csv_sink::CsvSink;
pub use manager::{SinkManager, SinkPhase, SinkStatus, SinkSummary};
pub use schema::{initialize_schema, INSERT_RECORD_SQL, SCHEMA_SQL};
pub use sqlite_sink::SqliteSink;
pub use traits::{Sink, SinkError, SinkResult};
