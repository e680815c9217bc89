//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# logwrap

logwrap moves log statements out of function bodies and into attributes on the function.

# The problem

Logging the start, the end or the failure of a function usually means three or four
statements threaded through its body, repeated in every function that needs them:

```text
fn import(path: &Path) -> Result<usize, Error> {
    info!("importing {}", path.display());
    let n = match do_import(path) {
        Ok(n) => n,
        Err(e) => { error!("import failed: {e}"); return Err(e) }
    };
    info!("imported {n} rows");
    Ok(n)
}
```

The business logic is one line.  logwrap lets you state the logging next to the signature
instead, and keeps the body what it was:

```rust
use logwrap::{Level, log_on_end, log_on_error, log_on_start};
use std::num::ParseIntError;

#[log_on_start(Level::Info, "parsing {input}")]
#[log_on_end(Level::Info, "parsed {result:?}")]
#[log_on_error(Level::Error, "parse failed: {e}", on_errors = [ParseIntError])]
fn parse(input: &str) -> Result<i32, ParseIntError> {
    input.trim().parse()
}
# assert_eq!(parse(" 42 "), Ok(42));
```

# The decorators

| Attribute | Logs | Placeholders |
|-----------|------|--------------|
| [`log_on_start`] | before the body runs | parameters, `{callable}` |
| [`log_on_end`] | after the body returns | parameters, `{callable}`, `{result}` |
| [`log_on_error`] | when the body returns an intercepted `Err` | parameters, `{callable}`, `{e}` |
| [`log_exception`] | like `log_on_error`, at [`Level::Error`], swallowing the error | parameters, `{callable}`, `{e}` |

Attributes stack in source order: the topmost attribute is the outermost wrapper, so its
start message comes first and its end message comes last.  `async fn`s are supported and log
around the `.await` of their body.

Parameters are captured through [`Loggable`] when their type implements it, and otherwise
through `Display` and `Debug`, so `{addr}` and `{config:?}` work for most types without extra
impls.  Intercepted errors that implement `std::error::Error` expose their `source()` chain as
`{e.sources}`, and [`log_exception`] appends it to the message.

# Templates

Messages are [`Template`]s: text with named placeholders that accept field and index
accessors and Rust's format specs, e.g. `{user.name}`, `{items[0]}` or `{elapsed:>8.3}`.
Placeholder names are checked against the function's parameters at compile time.  Anything
the compiler cannot check, such as a field that does not exist on the value, panics when the
message is rendered.  See the [`template`] module.

# Where records go

A decorator without an explicit `sink = ...` sends its records to the logger registered for
its module path, falling back to the global loggers, which start out as a single
[`StdErrorLogger`].  See [`global_logger`].  A `handler = ...` receives every record in
addition to that derived sink.  With the `log` feature, [`LogFacade`] forwards records to
the `log` crate.

# The runtime API

The attributes expand to calls of [`invoke`] and [`invoke_async`] with a hook built from
[`LogOnStart`], [`LogOnEnd`] or [`LogOnError`].  These are public, for wrapping closures and
for callers that only know their arguments at run time (see [`Signature`]).  Unlike the
attributes, they report template errors as values instead of panicking.
*/

mod context;
mod decorators;
mod error;
pub mod global_logger;
mod hook;
mod inmemory_logger;
mod intercept;
mod level;
#[cfg(feature = "log")]
mod log_facade;
mod log_record;
mod logger;
mod macros;
mod spinlock;
mod stderror_logger;
pub mod template;
mod value;

pub use context::{Arguments, CallSite, Context, Param, ParamKind, Signature};
pub use decorators::{Describing, LogOnEnd, LogOnError, LogOnStart};
pub use error::{BindError, InvocationError, TemplateError};
pub use global_logger::{
    Fanout, add_global_logger, default_sink, global_loggers, logger_for, register_logger,
    set_global_loggers, unregister_logger,
};
pub use hook::{Decorated, Decoration, Hook, Options, SinkFactory, invoke, invoke_async};
pub use inmemory_logger::InMemoryLogger;
pub use intercept::Intercept;
pub use level::Level;
#[cfg(feature = "log")]
pub use log_facade::LogFacade;
pub use log_record::LogRecord;
pub use logger::Logger;
pub use stderror_logger::StdErrorLogger;
pub use template::Template;
pub use value::{Loggable, Number, Object, Value};

pub use logwrap_proc::{log_exception, log_on_end, log_on_error, log_on_start};

#[doc(hidden)]
pub mod hidden {
    pub use crate::macros::{
        Capture, CaptureBoxedError, CaptureDebug, CaptureDescribed, CaptureDisplay,
        CaptureDisplayError, CaptureError, CaptureLoggable, ErrorCapture, Fallible, Uncaptured,
        invoke_async_described, invoke_described, settle, unwrap_rendered,
    };
}
extern crate self as logwrap;
