// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Logger
//!
//! An in-memory sink for testing.  The `InMemoryLogger` keeps every record it receives,
//! so tests can assert on exactly what a decorated function emitted: how many records,
//! at which level, under which target, with which message.
//!
//! It implements [`Logger`] and can be passed directly as a decorator's sink or installed
//! process-wide with [`add_global_logger`](crate::add_global_logger) /
//! [`register_logger`](crate::register_logger).

use crate::log_record::LogRecord;
use crate::logger::Logger;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An in-memory logger that stores [`LogRecord`]s in a `Vec`.
///
/// # Example
///
/// ```rust
/// use logwrap::{Context, Decoration, InMemoryLogger, Level, LogOnStart, CallSite};
/// use std::sync::Arc;
///
/// let sink = Arc::new(InMemoryLogger::new());
/// let hook = LogOnStart::new(Level::Info, "start {x}")
///     .sink(sink.clone())
///     .decorate(CallSite::new("demo", "f"));
///
/// let ctx = Context::new().with("x", &5);
/// let out = logwrap::invoke(&hook, ctx, || 5 * 2).unwrap();
/// assert_eq!(out, 10);
/// assert_eq!(sink.drain_logs(), "start 5");
/// ```
#[derive(Debug)]
pub struct InMemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug: derived, required by Logger
// - Default: empty buffer
// - Clone: NOT implemented - a clone would silently split the captured records
// - PartialEq/Eq/Hash: NOT implemented - equality of loggers is unclear
// - Send/Sync: automatic through Mutex

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogger {
    /// Creates a new `InMemoryLogger` with an empty buffer.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    // A test that panicked while holding the lock must not hide records from the next one.
    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drains all messages into a single string, one message per line, clearing the buffer.
    ///
    /// ```rust
    /// use logwrap::{InMemoryLogger, Level, LogRecord, Logger};
    ///
    /// let logger = InMemoryLogger::new();
    /// logger.finish_log_record(LogRecord::new(Level::Info, "t", "first"));
    /// logger.finish_log_record(LogRecord::new(Level::Error, "t", "second"));
    /// assert_eq!(logger.drain_logs(), "first\nsecond");
    /// assert_eq!(logger.drain_logs(), "");
    /// ```
    pub fn drain_logs(&self) -> String {
        let mut records = self.lock();
        let result = records
            .iter()
            .map(LogRecord::message)
            .collect::<Vec<_>>()
            .join("\n");
        records.clear();
        result
    }

    /// Drains the full records, clearing the buffer.
    pub fn drain_records(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Logger for InMemoryLogger {
    fn finish_log_record(&self, record: LogRecord) {
        self.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn drain_records_keeps_level_and_target() {
        let logger = InMemoryLogger::new();
        logger.finish_log_record(LogRecord::new(Level::Warning, "a::b", "careful"));
        let records = logger.drain_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level(), Level::Warning);
        assert_eq!(records[0].target(), "a::b");
        assert!(logger.is_empty());
    }

    #[test]
    fn concurrent_writers() {
        let logger = Arc::new(InMemoryLogger::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = logger.clone();
                thread::spawn(move || {
                    logger.finish_log_record(LogRecord::new(Level::Info, "t", format!("{i}")));
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread panicked");
        }
        assert_eq!(logger.len(), 4);
    }
}
