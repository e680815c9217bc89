// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use crate::logger::Logger;

/**
A reference logger that logs to stderr.

Each record is written on its own line as `LEVEL:target:message`.  On wasm32 the record goes
to the browser console instead, using the console method matching its level.
 */
#[derive(Debug, Clone)]
pub struct StdErrorLogger {}

// ============================================================================
// BOILERPLATE TRAIT IMPLEMENTATIONS
// ============================================================================
//
// - Debug/Clone: derived
// - Copy: zero-sized, no heap allocation
// - PartialEq/Eq/Hash: all instances are equivalent
// - Default: convenient zero-argument constructor
// - Display: no meaningful string representation

impl Copy for StdErrorLogger {}

impl PartialEq for StdErrorLogger {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for StdErrorLogger {}

impl std::hash::Hash for StdErrorLogger {
    fn hash<H: std::hash::Hasher>(&self, _state: &mut H) {}
}

impl Default for StdErrorLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl StdErrorLogger {
    pub const fn new() -> Self {
        Self {}
    }
}

fn line(record: &LogRecord) -> String {
    format!(
        "{}:{}:{}",
        record.level(),
        record.target(),
        record.message()
    )
}

impl Logger for StdErrorLogger {
    fn finish_log_record(&self, record: LogRecord) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::io::Write;
            let mut lock = std::io::stderr().lock();
            lock.write_all(line(&record).as_bytes())
                .expect("Can't log to stderr");
            lock.write_all(b"\n").expect("Can't log to stderr");
        }
        #[cfg(target_arch = "wasm32")]
        {
            use crate::Level;
            let msg = line(&record);
            match record.level() {
                Level::Trace => web_sys::console::trace_1(&msg.into()),
                Level::Debug => web_sys::console::debug_1(&msg.into()),
                Level::Info => web_sys::console::info_1(&msg.into()),
                Level::Warning => web_sys::console::warn_1(&msg.into()),
                Level::Error | Level::Critical => web_sys::console::error_1(&msg.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn line_format() {
        let record = LogRecord::new(Level::Error, "app::db", "failed: timeout");
        assert_eq!(line(&record), "ERROR:app::db:failed: timeout");
    }

    #[test]
    fn writes_without_panicking() {
        StdErrorLogger::new().finish_log_record(LogRecord::new(Level::Debug, "tests", "hello"));
    }
}
