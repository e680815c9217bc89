// SPDX-License-Identifier: MIT OR Apache-2.0
use std::fmt::Display;

/// Severity attached to every emitted record.
///
/// The decoration layer does not filter on severity; that is the sink's business.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Very detailed diagnostics, usually off
    Trace,
    /// Print-style debugging
    Debug,
    /// Normal operation
    Info,
    /// Suspicious condition
    Warning,
    /// Runtime error
    Error,
    /// The program is unlikely to continue
    Critical,
}

impl Level {
    /// Upper-case name, as written by [crate::StdErrorLogger].
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Level;

    #[test]
    fn ordering_follows_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn display_is_upper_case() {
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(format!("{}", Level::Info), "INFO");
    }
}
