//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::level::Level;
use crate::log_record::LogRecord;
use crate::logger::Logger;

/**
A sink that forwards records to the [`log`] crate's global logger.

The record's target, the decorated function's module path, becomes the `log` target, so
`env_logger`-style filters keep working.  [`Level::Warning`] maps to `Warn` and
[`Level::Critical`] to `Error`.

```rust
# #[cfg(feature = "log")] {
use logwrap::{LogFacade, set_global_loggers};
use std::sync::Arc;

set_global_loggers(vec![Arc::new(LogFacade)]);
# }
```
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

fn log_level(level: Level) -> log::Level {
    match level {
        Level::Trace => log::Level::Trace,
        Level::Debug => log::Level::Debug,
        Level::Info => log::Level::Info,
        Level::Warning => log::Level::Warn,
        Level::Error | Level::Critical => log::Level::Error,
    }
}

impl Logger for LogFacade {
    fn finish_log_record(&self, record: LogRecord) {
        log::log!(target: record.target(), log_level(record.level()), "{}", record.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Captured(Mutex<Vec<(log::Level, String, String)>>);

    impl log::Log for Captured {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.0.lock().unwrap().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }

        fn flush(&self) {}
    }

    static CAPTURED: Captured = Captured(Mutex::new(Vec::new()));

    #[test]
    fn records_reach_the_log_crate_with_their_module_target() {
        log::set_logger(&CAPTURED).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        LogFacade.finish_log_record(LogRecord::new(Level::Warning, "app::db", "slow query".to_string()));
        LogFacade.finish_log_record(LogRecord::new(Level::Critical, "app", "down".to_string()));

        let captured = CAPTURED.0.lock().unwrap();
        assert_eq!(
            *captured,
            vec![
                (log::Level::Warn, "app::db".to_string(), "slow query".to_string()),
                (log::Level::Error, "app".to_string(), "down".to_string()),
            ]
        );
    }
}
