//SPDX-License-Identifier: MIT OR Apache-2.0

//! # logwrap Procedural Macros
//!
//! Attribute macros for the logwrap library.  Each attribute rewrites the body of the function
//! it is applied to so that the original body runs under one of logwrap's hooks, and leaves
//! the signature alone.
//!
//! ## Arguments
//!
//! ```text
//! #[log_on_start(LEVEL, "template", sink = EXPR, sink_factory = PATH, handler = EXPR,
//!                callable_var = "name")]
//! #[log_on_end(LEVEL, "template", result_var = "name", ...)]
//! #[log_on_error(LEVEL, "template", on_errors = [Type, ...] | all, when = CLOSURE,
//!                reraise = BOOL, error_var = "name", fallback = EXPR, append_sources = BOOL, ...)]
//! #[log_exception("template", ...same options as log_on_error...)]
//! ```
//!
//! The template must be a string literal.  Every placeholder name in it must be a parameter of
//! the function or a name the hook provides (`callable`, and `result` or `e`); anything else is
//! a compile error.  Only the parameters the template names are captured.  A captured
//! parameter is converted through `Loggable` when its type implements it, and otherwise
//! through `Display` and/or `Debug`.
//!
//! `handler` is a sink that receives every record in addition to the one derived from the
//! module path.  It is ignored, with a warning on the `logwrap` target, when `sink` is also
//! given.
//!
//! Arguments are separated by top-level commas.  An expression that itself contains a
//! top-level comma (for example a two-parameter closure) has to be parenthesized.
//!
//! ## Stacking
//!
//! Attributes of this crate written directly above one another form a stack, expanded in
//! source order: the topmost attribute is the outermost wrapper.  Its start message is
//! logged first and its end message last.  Another attribute macro in between ends the
//! stack.
//!
//! ## Expansion
//!
//! See the `expand` module for what the generated body looks like.  The hook configuration
//! lives in a `static` local to the function and is built on the first call, so expressions
//! given as `sink`, `when` or `fallback` cannot refer to the function's generic parameters.

mod expand;
mod parser;
mod signature;

use expand::{Variant, expand};
use proc_macro::TokenStream;

/// Logs before the function body runs.
///
/// The template sees the function's parameters and the function itself as `{callable}`.
///
/// ```rust
/// use logwrap::{InMemoryLogger, Level, log_on_start};
/// use std::sync::{Arc, LazyLock};
///
/// static SINK: LazyLock<Arc<InMemoryLogger>> = LazyLock::new(|| Arc::new(InMemoryLogger::new()));
///
/// #[log_on_start(Level::Info, "start {x}", sink = SINK.clone())]
/// fn f(x: i32) -> i32 {
///     x * 2
/// }
///
/// assert_eq!(f(5), 10);
/// assert_eq!(SINK.drain_logs(), "start 5");
/// ```
///
/// A placeholder that names neither a parameter nor `callable` is rejected at compile time:
///
/// ```compile_fail
/// use logwrap::{Level, log_on_start};
///
/// #[log_on_start(Level::Info, "start {missing}")]
/// fn f(x: i32) -> i32 {
///     x
/// }
/// ```
///
/// # Panics
///
/// The decorated function panics if the message cannot be rendered, e.g. when the template
/// reads a field that the value does not have.  The body does not run in that case.
#[proc_macro_attribute]
pub fn log_on_start(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(Variant::Start, attr, item)
}

/// Logs after the function body returns, with its return value available as `{result}`.
///
/// The return type must implement `Loggable` when the template reads `{result}`.
///
/// ```rust
/// use logwrap::{InMemoryLogger, Level, log_on_end};
/// use std::sync::{Arc, LazyLock};
///
/// static SINK: LazyLock<Arc<InMemoryLogger>> = LazyLock::new(|| Arc::new(InMemoryLogger::new()));
///
/// #[log_on_end(Level::Info, "{callable.name}({x}) returned {out}", result_var = "out", sink = SINK.clone())]
/// fn double(x: i32) -> i32 {
///     x * 2
/// }
///
/// assert_eq!(double(5), 10);
/// assert_eq!(SINK.drain_logs(), "double(5) returned 10");
/// ```
///
/// # Panics
///
/// The decorated function panics after the body ran if the message cannot be rendered.
#[proc_macro_attribute]
pub fn log_on_end(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(Variant::End, attr, item)
}

/// Logs when the function returns an intercepted `Err`, with the error available as `{e}`.
///
/// The function must return a `Result`.  Errors are intercepted when they are one of the
/// `on_errors` types (directly or inside a boxed `dyn Error`), when the `when` predicate
/// holds, or always with `on_errors = all`.  Other errors are returned without logging.
///
/// An intercepted error is returned after logging unless `reraise = false`, in which case
/// the function returns `Ok(fallback)`; `fallback` defaults to `Default::default()`.
///
/// ```rust
/// use logwrap::{InMemoryLogger, Level, log_on_error};
/// use std::num::ParseIntError;
/// use std::sync::{Arc, LazyLock};
///
/// static SINK: LazyLock<Arc<InMemoryLogger>> = LazyLock::new(|| Arc::new(InMemoryLogger::new()));
///
/// #[log_on_error(Level::Error, "failed: {e}", on_errors = [ParseIntError], sink = SINK.clone())]
/// fn parse(input: &str) -> Result<i32, ParseIntError> {
///     input.parse()
/// }
///
/// assert!(parse("x").is_err());
/// assert_eq!(SINK.drain_logs(), "failed: invalid digit found in string");
/// ```
#[proc_macro_attribute]
pub fn log_on_error(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(Variant::Error, attr, item)
}

/// `log_on_error` at `Level::Error` that does not reraise by default.
///
/// The messages of the error's `source()` chain are appended to the record, one
/// `caused by:` line each, unless `append_sources = false`.
///
/// ```rust
/// use logwrap::{InMemoryLogger, log_exception};
/// use std::sync::{Arc, LazyLock};
///
/// static SINK: LazyLock<Arc<InMemoryLogger>> = LazyLock::new(|| Arc::new(InMemoryLogger::new()));
///
/// #[log_exception("could not read {path}: {e}", on_errors = [std::io::Error], fallback = String::from("default"), sink = SINK.clone())]
/// fn read(path: &str) -> std::io::Result<String> {
///     std::fs::read_to_string(path)
/// }
///
/// assert_eq!(read("/this/path/does/not/exist").unwrap(), "default");
/// assert!(SINK.drain_logs().starts_with("could not read /this/path/does/not/exist: "));
/// ```
#[proc_macro_attribute]
pub fn log_exception(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(Variant::Exception, attr, item)
}
