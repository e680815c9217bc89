//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use std::fmt::Debug;

/**
A destination for rendered records.

Sinks are shared between every invocation of every function decorated with them, possibly
from several threads at once, so implementations must be safe for concurrent use. Nothing in
this crate locks around a sink.
*/
pub trait Logger: Debug + Send + Sync {
    /**
        Submits the log record for logging.
    */
    fn finish_log_record(&self, record: LogRecord);
}

/*
Boilerplate notes.

# Logger

Clone on a trait object isn't useful; sinks are shared through Arc instead.
PartialEq/Eq/Hash would have to pick between data equality and identity. Avoid.
Default makes no sense for a trait.
Send/Sync are required: decorated functions may run on any thread.
*/
