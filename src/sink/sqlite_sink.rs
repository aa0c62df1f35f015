//! SQLite sink
//!
//! Ensures the `books` table exists on open, then inserts one row per
//! record inside its own committed transaction.

use crate::record::Record;
use crate::sink::schema::{initialize_schema, INSERT_RECORD_SQL};
use crate::sink::traits::{Sink, SinkError, SinkResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

const NAME: &str = "sqlite";

/// Sink inserting records into a SQLite database
pub struct SqliteSink {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteSink {
    /// Creates a sink for the database at `path`; the file is created on open
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            conn: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for SqliteSink {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&mut self) -> SinkResult<()> {
        let conn = Connection::open(&self.path)?;
        initialize_schema(&conn)?;

        tracing::info!("Database connected and table is ready: {}", self.path.display());
        self.conn = Some(conn);
        Ok(())
    }

    fn write(&mut self, record: &Record) -> SinkResult<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| SinkError::NotOpen(NAME.to_string()))?;

        let tx = conn.transaction()?;
        tx.execute(
            INSERT_RECORD_SQL,
            params![
                record.title(),
                record.price(),
                record.availability(),
                record.rating()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
            tracing::info!("Database connection closed: {}", self.path.display());
        }
        Ok(())
    }
}
