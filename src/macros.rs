// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support functions called by the code the attribute macros in `logwrap_proc` generate.
//!
//! A decorated function keeps its signature, so the expansion has no channel for the
//! drivers' extra outcomes.  These functions fold them back into the function's own return
//! type:
//!
//! * a [`TemplateError`] panics, since it is a defect in the attribute itself;
//! * an error swallowed by `log_on_error` / `log_exception` becomes the fallback value;
//! * a return value the template never reads is wrapped in [`Uncaptured`], so its type need
//!   not implement [`Loggable`];
//! * an argument is captured through [`Loggable`] when it implements it, and otherwise through
//!   `Display` and/or `Debug` (see [`Capture`]);
//! * an intercepted error is captured with its `source()` chain when it is a
//!   `std::error::Error` or a box of one (see [`ErrorCapture`]).
//!
//! These functions are not intended to be called directly.  Use the attributes:
//!
//! ```rust
//! #[logwrap::log_on_start(logwrap::Level::Debug, "loading {path}")]
//! fn load(path: &str) -> usize {
//!     path.len()
//! }
//! # assert_eq!(load("a.toml"), 6);
//! ```

use crate::context::Context;
use crate::decorators::LogOnError;
use crate::error::{InvocationError, TemplateError};
use crate::hook::{Decorated, invoke, invoke_async};
use crate::value::{Loggable, Value};
use std::error::Error;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::ops::Deref;

/// Unwraps the output of a start or end hook.
///
/// # Panics
///
/// Panics when the message template could not be rendered.
#[track_caller]
pub fn unwrap_rendered<R>(out: Result<R, TemplateError>) -> R {
    match out {
        Ok(value) => value,
        Err(error) => panic!("logwrap: {error}"),
    }
}

/// Converts the output of an error hook back into the function's `Result`.
///
/// `fallback` supplies the value for an intercepted error that is not reraised.
///
/// # Panics
///
/// Panics when the message template could not be rendered.
#[track_caller]
pub fn settle<T, E>(out: Result<Option<T>, InvocationError<E>>, fallback: impl FnOnce() -> T) -> Result<T, E> {
    match out {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Ok(fallback()),
        Err(InvocationError::Raised(error)) => Err(error),
        Err(InvocationError::Template(error)) => panic!("logwrap: {error}"),
    }
}

/// A return value that is passed through a `log_on_end` hook without being captured.
#[derive(Debug)]
pub struct Uncaptured<T>(pub T);

impl<T> Uncaptured<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Loggable for Uncaptured<T> {
    fn to_value(&self) -> Value {
        Value::None
    }
}

/**
An argument on its way into the invocation context.

Which conversion applies is decided by method resolution on `(&&&&Capture(&x)).capture()`,
with the traits below in scope.  Each one is implemented for a different number of
references, so the first that matches wins: [`Loggable`], then `Display` together with
`Debug`, then `Display`, then `Debug`.
*/
pub struct Capture<'a, T: ?Sized>(pub &'a T);

pub trait CaptureLoggable {
    fn capture(&self) -> Value;
}

impl<T: Loggable + ?Sized> CaptureLoggable for &&&Capture<'_, T> {
    fn capture(&self) -> Value {
        self.0.to_value()
    }
}

pub trait CaptureDescribed {
    fn capture(&self) -> Value;
}

impl<T: Display + Debug + ?Sized> CaptureDescribed for &&Capture<'_, T> {
    fn capture(&self) -> Value {
        Value::described(self.0)
    }
}

pub trait CaptureDisplay {
    fn capture(&self) -> Value;
}

impl<T: Display + ?Sized> CaptureDisplay for &Capture<'_, T> {
    fn capture(&self) -> Value {
        Value::display(self.0)
    }
}

pub trait CaptureDebug {
    fn capture(&self) -> Value;
}

impl<T: Debug + ?Sized> CaptureDebug for Capture<'_, T> {
    fn capture(&self) -> Value {
        Value::debug(self.0)
    }
}

/// An intercepted error on its way into the invocation context.  Resolved like [`Capture`]
/// on `(&&&ErrorCapture(e)).capture_error()`: an `Error`, then a pointer to one (such as
/// `Box<dyn Error + Send + Sync>`), then any `Display`.
pub struct ErrorCapture<'a, E: ?Sized>(pub &'a E);

pub trait CaptureError {
    fn capture_error(&self) -> Value;
}

impl<E: Error + ?Sized> CaptureError for &&ErrorCapture<'_, E> {
    fn capture_error(&self) -> Value {
        Value::error_chain(self.0)
    }
}

pub trait CaptureBoxedError {
    fn capture_error(&self) -> Value;
}

impl<B, E> CaptureBoxedError for &ErrorCapture<'_, B>
where
    B: Deref<Target = E> + ?Sized,
    E: Error + ?Sized,
{
    fn capture_error(&self) -> Value {
        Value::error_chain(&**self.0)
    }
}

pub trait CaptureDisplayError {
    fn capture_error(&self) -> Value;
}

impl<E: Display + ?Sized> CaptureDisplayError for ErrorCapture<'_, E> {
    fn capture_error(&self) -> Value {
        Value::error(self.0)
    }
}

/// Names the error type of a function's `Result` return type.
pub trait Fallible {
    type Error;
}

impl<T, E> Fallible for Result<T, E> {
    type Error = E;
}

/// [`invoke`] for error hooks, with `describe` converting intercepted errors.
///
/// The closure comes before `describe` so that the error type is known when `describe` is
/// type-checked.
pub fn invoke_described<T, E: 'static>(
    hook: &Decorated<LogOnError>,
    ctx: Context,
    f: impl FnOnce() -> Result<T, E>,
    describe: impl Fn(&E) -> Value,
) -> Result<Option<T>, InvocationError<E>> {
    invoke(&hook.describe_errors(describe), ctx, f)
}

/// [`invoke_async`] for error hooks, with `describe` converting intercepted errors.
pub async fn invoke_async_described<T, E: 'static, F>(
    hook: &Decorated<LogOnError>,
    ctx: Context,
    future: F,
    describe: impl Fn(&E) -> Value,
) -> Result<Option<T>, InvocationError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    invoke_async(&hook.describe_errors(describe), ctx, future).await
}
