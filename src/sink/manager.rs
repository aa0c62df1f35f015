//! Sink manager
//!
//! Owns every configured sink and drives their lifecycles independently. A
//! sink that fails to open is marked unusable and skipped for the rest of the
//! crawl; a write failure is logged and counted without affecting the other
//! sinks or the crawl itself. The last error of each lifecycle phase is kept
//! in the sink's summary so the report can say where a sink went wrong.

use crate::config::OutputConfig;
use crate::record::Record;
use crate::sink::csv_sink::CsvSink;
use crate::sink::sqlite_sink::SqliteSink;
use crate::sink::traits::Sink;
use std::fmt;
use tracing::Span;

/// Lifecycle status of a managed sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    /// Not yet opened
    Pending,
    /// Accepting writes
    Open,
    /// Failed to open; never receives writes
    Unusable,
    /// Released
    Closed,
}

impl SinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkStatus::Pending => "pending",
            SinkStatus::Open => "open",
            SinkStatus::Unusable => "unusable",
            SinkStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for SinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle step in which a sink error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPhase {
    Open,
    Write,
    Close,
}

impl SinkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkPhase::Open => "open",
            SinkPhase::Write => "write",
            SinkPhase::Close => "close",
        }
    }
}

impl fmt::Display for SinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-sink outcome reported at the end of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    pub name: String,
    pub status: SinkStatus,
    pub written: usize,
    pub failed: usize,
    /// Whether the sink was ever opened successfully
    pub opened: bool,
    pub open_error: Option<String>,
    /// Most recent write failure; `failed` counts all of them
    pub last_write_error: Option<String>,
    pub close_error: Option<String>,
}

impl SinkSummary {
    /// Recorded errors tagged with the phase they came from, in lifecycle order
    pub fn errors(&self) -> Vec<(SinkPhase, &str)> {
        [
            (SinkPhase::Open, &self.open_error),
            (SinkPhase::Write, &self.last_write_error),
            (SinkPhase::Close, &self.close_error),
        ]
        .into_iter()
        .filter_map(|(phase, error)| error.as_deref().map(|e| (phase, e)))
        .collect()
    }
}

impl fmt::Display for SinkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {:<9} written: {:<6} failed: {}",
            self.name, self.status, self.written, self.failed
        )?;
        for (phase, error) in self.errors() {
            write!(f, "\n    {} error: {}", phase, error)?;
        }
        Ok(())
    }
}

struct Slot {
    sink: Box<dyn Sink>,
    status: SinkStatus,
    opened: bool,
    written: usize,
    failed: usize,
    open_error: Option<String>,
    last_write_error: Option<String>,
    close_error: Option<String>,
}

impl Slot {
    fn summary(&self) -> SinkSummary {
        SinkSummary {
            name: self.sink.name().to_string(),
            status: self.status,
            written: self.written,
            failed: self.failed,
            opened: self.opened,
            open_error: self.open_error.clone(),
            last_write_error: self.last_write_error.clone(),
            close_error: self.close_error.clone(),
        }
    }
}

/// Fans records out to every usable sink
pub struct SinkManager {
    slots: Vec<Slot>,
    span: Span,
}

impl SinkManager {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        let slots = sinks
            .into_iter()
            .map(|sink| Slot {
                sink,
                status: SinkStatus::Pending,
                opened: false,
                written: 0,
                failed: 0,
                open_error: None,
                last_write_error: None,
                close_error: None,
            })
            .collect();

        Self {
            slots,
            span: tracing::info_span!("sinks"),
        }
    }

    /// Builds the CSV and SQLite sinks named in the output configuration
    pub fn from_config(config: &OutputConfig) -> Self {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        if let Some(path) = &config.csv_path {
            sinks.push(Box::new(CsvSink::new(path)));
        }
        if let Some(path) = &config.database_path {
            sinks.push(Box::new(SqliteSink::new(path)));
        }
        Self::new(sinks)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Opens every pending sink and returns how many are usable
    ///
    /// A sink that fails to open is logged and marked unusable. It never
    /// prevents the others from opening.
    pub fn open_all(&mut self) -> usize {
        let _enter = self.span.enter();

        for slot in &mut self.slots {
            if slot.status != SinkStatus::Pending {
                continue;
            }
            match slot.sink.open() {
                Ok(()) => {
                    slot.status = SinkStatus::Open;
                    slot.opened = true;
                }
                Err(e) => {
                    tracing::error!(sink = slot.sink.name(), "Failed to open sink: {}", e);
                    slot.status = SinkStatus::Unusable;
                    slot.open_error = Some(e.to_string());
                }
            }
        }

        let usable = self.usable();
        if usable == 0 && !self.slots.is_empty() {
            tracing::warn!("No sink is usable; records will be extracted but not persisted");
        }
        usable
    }

    /// Writes `record` to every open sink, returning how many accepted it
    pub fn dispatch(&mut self, record: &Record) -> usize {
        let _enter = self.span.enter();
        let mut accepted = 0;

        for slot in self.slots.iter_mut().filter(|s| s.status == SinkStatus::Open) {
            match slot.sink.write(record) {
                Ok(()) => {
                    slot.written += 1;
                    accepted += 1;
                }
                Err(e) => {
                    slot.failed += 1;
                    tracing::error!(
                        sink = slot.sink.name(),
                        title = record.title(),
                        "Failed to write record: {}",
                        e
                    );
                    slot.last_write_error = Some(e.to_string());
                }
            }
        }

        accepted
    }

    /// Releases every sink that is not already closed
    ///
    /// Idempotent. Close failures are logged; the sink is considered closed
    /// either way.
    pub fn close_all(&mut self) {
        let _enter = self.span.enter();

        for slot in &mut self.slots {
            if slot.status == SinkStatus::Closed {
                continue;
            }
            if let Err(e) = slot.sink.close() {
                tracing::error!(sink = slot.sink.name(), "Failed to close sink: {}", e);
                slot.close_error = Some(e.to_string());
            }
            slot.status = SinkStatus::Closed;
        }
    }

    /// Number of sinks currently accepting writes
    pub fn usable(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == SinkStatus::Open)
            .count()
    }

    pub fn summaries(&self) -> Vec<SinkSummary> {
        self.slots.iter().map(Slot::summary).collect()
    }
}

impl Drop for SinkManager {
    fn drop(&mut self) {
        self.close_all();
    }
}
