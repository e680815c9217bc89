// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type handed to sinks.
//!
//! A decorated call produces at most one rendered message per hook. The message is
//! wrapped in a [`LogRecord`] together with its severity and target (the module path
//! of the decorated function) and passed by value to a [`Logger`](crate::Logger).
//!
//! # Example
//!
//! ```rust
//! use logwrap::{Level, LogRecord};
//!
//! let record = LogRecord::new(Level::Info, "my_crate::jobs", "start 5");
//! assert_eq!(record.level(), Level::Info);
//! assert_eq!(record.target(), "my_crate::jobs");
//! assert_eq!(record.to_string(), "start 5");
//! ```

use crate::Level;
use std::borrow::Cow;
use std::fmt::{Debug, Display};

/**
A log record.

Records are built once, after the message has been fully rendered, and are owned by the
sink that receives them.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    level: Level,
    target: Cow<'static, str>,
    message: String,
}

impl LogRecord {
    pub fn new(
        level: Level,
        target: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /**
    The logical origin of the record.

    For decorated functions this is the `module_path!()` of the function.
    */
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Consumes the record, returning the rendered message.
    pub fn into_message(self) -> String {
        self.message
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
/*
Boilerplate notes for LogRecord:

IMPLEMENTED:
- Debug, Clone, PartialEq/Eq, Hash: derived; tests compare records directly
- Display: the rendered message only; sinks add level and target themselves

NOT IMPLEMENTED:
- Default: a record without a target has no meaning
- Ord: no meaningful ordering
- Copy: owns heap data
*/
