// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide sink registry and the default sink factory.
//!
//! A decorated function that is not given an explicit sink derives one from its module path
//! through [`default_sink`].  This module defines how that lookup works.
//!
//! # Contract
//!
//! The registry holds two things:
//!
//! * a list of **global loggers**, which receive every record that is not routed to a more
//!   specific logger.  It starts out as a single [`StdErrorLogger`] the first time it is
//!   touched, and is managed with [`global_loggers`], [`add_global_logger`] and
//!   [`set_global_loggers`];
//! * a table of **module loggers** keyed by module-path prefix, managed with
//!   [`register_logger`] and [`unregister_logger`].
//!
//! [`logger_for`] resolves a target such as `my_crate::jobs::import`:
//!
//! 1. the registered prefix that matches the most path segments wins (`my_crate::jobs`
//!    matches `my_crate::jobs` and `my_crate::jobs::import`, never `my_crate::jobsx`);
//! 2. otherwise a [`GlobalDispatch`] handle is returned, which forwards each record to the
//!    global loggers *as they are at emission time*.
//!
//! Resolution happens once per decorated function, when its configuration is decorated.  A
//! module logger registered after that point is not picked up by already-decorated
//! functions; changes to the global list are, because `GlobalDispatch` looks it up per record.
//!
//! # Example
//!
//! ```
//! use logwrap::{InMemoryLogger, logger_for, register_logger, unregister_logger};
//! use std::sync::Arc;
//!
//! let jobs = Arc::new(InMemoryLogger::new());
//! register_logger("my_crate::jobs", jobs.clone());
//!
//! let sink = logger_for("my_crate::jobs::import");
//! sink.finish_log_record(logwrap::LogRecord::new(logwrap::Level::Info, "my_crate::jobs::import", "hi"));
//! assert_eq!(jobs.drain_logs(), "hi");
//!
//! unregister_logger("my_crate::jobs");
//! ```

use crate::Level;
use crate::context::CallSite;
use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::spinlock::Spinlock;
use crate::stderror_logger::StdErrorLogger;
use std::sync::{Arc, OnceLock};

/// Target used for records the registry emits about itself.
const INTERNAL_TARGET: &str = "logwrap";

static GLOBAL_LOGGERS_PTR: OnceLock<Spinlock<Vec<Arc<dyn Logger>>>> = OnceLock::new();

static MODULE_LOGGERS: Spinlock<Vec<(String, Arc<dyn Logger>)>> = Spinlock::new(Vec::new());

fn global_list() -> &'static Spinlock<Vec<Arc<dyn Logger>>> {
    GLOBAL_LOGGERS_PTR.get_or_init(|| Spinlock::new(vec![Arc::new(StdErrorLogger::new())]))
}

/// Retrieves the current set of global loggers.
///
/// If no loggers have been configured, the list is initialized with a [`StdErrorLogger`].
pub fn global_loggers() -> Vec<Arc<dyn Logger>> {
    global_list().with(|loggers| loggers.clone())
}

/// Appends a logger to the global list.
pub fn add_global_logger(logger: Arc<dyn Logger>) {
    global_list().with_mut(|loggers| loggers.push(logger));
}

/// Replaces the global list.
///
/// An empty list is allowed; records that reach [`GlobalDispatch`] are then dropped.
pub fn set_global_loggers(new_loggers: Vec<Arc<dyn Logger>>) {
    let loggers_clone = new_loggers.clone();
    GLOBAL_LOGGERS_PTR
        .get_or_init(|| Spinlock::new(loggers_clone))
        .with_mut(|loggers| *loggers = new_loggers);
}

/// Routes records for `prefix` and its submodules to `logger`.
///
/// Returns the logger previously registered under exactly this prefix, if any.  Replacing a
/// logger is reported as a [`Level::Warning`] record to the global loggers.
pub fn register_logger(prefix: impl Into<String>, logger: Arc<dyn Logger>) -> Option<Arc<dyn Logger>> {
    let prefix = prefix.into();
    let previous = MODULE_LOGGERS.with_mut(|table| {
        match table.iter_mut().find(|(registered, _)| *registered == prefix) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, logger)),
            None => {
                table.push((prefix.clone(), logger));
                None
            }
        }
    });
    if previous.is_some() {
        emit_internal(
            Level::Warning,
            format!("replaced the logger registered for `{prefix}`"),
        );
    }
    previous
}

/// Removes the logger registered under exactly `prefix`.
pub fn unregister_logger(prefix: &str) -> Option<Arc<dyn Logger>> {
    MODULE_LOGGERS.with_mut(|table| {
        let index = table.iter().position(|(registered, _)| registered == prefix)?;
        Some(table.remove(index).1)
    })
}

fn prefix_matches(prefix: &str, target: &str) -> bool {
    match target.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Resolves the sink for `target`.  See the module documentation for the rules.
pub fn logger_for(target: &str) -> Arc<dyn Logger> {
    let registered = MODULE_LOGGERS.with(|table| {
        table
            .iter()
            .filter(|(prefix, _)| prefix_matches(prefix, target))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, logger)| logger.clone())
    });
    registered.unwrap_or_else(|| Arc::new(GlobalDispatch))
}

/// The default sink factory: the logger for the call site's module.
pub fn default_sink(site: &CallSite) -> Arc<dyn Logger> {
    logger_for(site.module())
}

/**
A sink that forwards every record to the current global loggers.

The list is read per record, so loggers added after a function was decorated still receive
its records.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GlobalDispatch;

impl Logger for GlobalDispatch {
    fn finish_log_record(&self, record: LogRecord) {
        dispatch(&global_loggers(), record);
    }
}

fn dispatch(loggers: &[Arc<dyn Logger>], record: LogRecord) {
    if let Some((last, rest)) = loggers.split_last() {
        for logger in rest {
            logger.finish_log_record(record.clone());
        }
        last.finish_log_record(record);
    }
}

/**
A sink that forwards every record to each of a fixed list of sinks.

This is what a decoration with a `handler` emits to: its module's sink, plus the handler.
*/
#[derive(Debug, Clone)]
pub struct Fanout {
    loggers: Vec<Arc<dyn Logger>>,
}

impl Fanout {
    pub fn new(loggers: impl IntoIterator<Item = Arc<dyn Logger>>) -> Self {
        Fanout {
            loggers: loggers.into_iter().collect(),
        }
    }
}

impl Logger for Fanout {
    fn finish_log_record(&self, record: LogRecord) {
        dispatch(&self.loggers, record);
    }
}

pub(crate) fn emit_internal(level: Level, message: String) {
    GlobalDispatch.finish_log_record(LogRecord::new(level, INTERNAL_TARGET, message));
}
