//! CSV file sink
//!
//! Writes a header row on open, then one row per record. Each row is encoded
//! in memory and handed to the file in a single write, so nothing is left
//! buffered between records and a crawl that stops early still leaves a
//! readable file.
//!
//! If a row cannot be written the file may hold part of it. The sink then
//! refuses every later row instead of appending after the damaged one.

use crate::record::{Record, HEADERS};
use crate::sink::traits::{Sink, SinkError, SinkResult};
use csv::Writer;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const NAME: &str = "csv";

/// Sink writing records to a comma-separated file
pub struct CsvSink {
    path: PathBuf,
    file: Option<File>,
    disabled: bool,
}

impl CsvSink {
    /// Creates a sink for `path`; the file is created (or truncated) on open
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            disabled: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encodes one row, including its line terminator
fn encode_row<I, T>(fields: I) -> SinkResult<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(io::Error::new(e.error().kind(), e.to_string())))
}

impl Sink for CsvSink {
    fn name(&self) -> &str {
        NAME
    }

    fn open(&mut self) -> SinkResult<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(&encode_row(HEADERS)?)?;

        tracing::info!("CSV file created: {}", self.path.display());
        self.file = Some(file);
        self.disabled = false;
        Ok(())
    }

    fn write(&mut self, record: &Record) -> SinkResult<()> {
        if self.disabled {
            return Err(SinkError::Disabled(NAME.to_string()));
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SinkError::NotOpen(NAME.to_string()))?;

        let row = encode_row(record.fields())?;
        if let Err(e) = file.write_all(&row) {
            tracing::warn!(
                "Disabling CSV sink for {}: row may be partially written",
                self.path.display()
            );
            self.disabled = true;
            return Err(e.into());
        }
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
            tracing::info!("CSV file closed: {}", self.path.display());
        }
        Ok(())
    }
}
