// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decorator configurations and what each does around a call.
//!
//! | Decorator | Logs | Returns |
//! |---|---|---|
//! | [`LogOnStart`] | before delegating | the callable's value |
//! | [`LogOnEnd`] | after delegating, with the value as `{result}` | the callable's value |
//! | [`LogOnError`] | when the callable returns an intercepted `Err`, with it as `{e}` | the value, or the error when reraised |
//!
//! [`LogOnError::exception`] is the error decorator preset to [`Level::Error`] without
//! reraising.

use crate::Level;
use crate::context::Context;
use crate::error::{InvocationError, TemplateError};
use crate::hook::{Decorated, Decoration, Hook, Options};
use crate::intercept::Intercept;
use crate::template::Template;
use crate::value::{Loggable, Value};
use std::borrow::Cow;
use std::fmt::Display;

/**
Logs before the call.

A failing template aborts the call before the callable runs.

```rust
use logwrap::{CallSite, Context, Decoration, InMemoryLogger, Level, LogOnStart, invoke};
use std::sync::Arc;

let sink = Arc::new(InMemoryLogger::new());
let hook = LogOnStart::new(Level::Info, "{callable.name} called with {x}")
    .sink(sink.clone())
    .decorate(CallSite::new("demo", "square"));

assert_eq!(invoke(&hook, Context::new().with("x", &3), || 9), Ok(9));
assert_eq!(sink.drain_logs(), "square called with 3");
```
*/
#[derive(Debug, Clone)]
pub struct LogOnStart {
    options: Options,
}

impl LogOnStart {
    pub fn new(level: Level, template: impl Into<Template>) -> Self {
        LogOnStart {
            options: Options::new(level, template),
        }
    }
}

impl Decoration for LogOnStart {
    fn options(&self) -> &Options {
        &self.options
    }

    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }
}

impl<R> Hook<R> for Decorated<LogOnStart> {
    type Output = Result<R, TemplateError>;

    fn enter(&self, ctx: &mut Context) -> Result<(), TemplateError> {
        self.add_callable(ctx);
        self.emit(ctx)
    }

    fn exit(&self, _ctx: Context, delegated: R) -> Self::Output {
        Ok(delegated)
    }

    fn abort(&self, error: TemplateError) -> Self::Output {
        Err(error)
    }
}

/// Logs after the call, with its return value available as `{result}`.
///
/// A returned `Err` is an ordinary result here.  A failing template discards the value and
/// reports the [`TemplateError`] instead.
#[derive(Debug, Clone)]
pub struct LogOnEnd {
    options: Options,
    result_var: Cow<'static, str>,
}

impl LogOnEnd {
    pub fn new(level: Level, template: impl Into<Template>) -> Self {
        LogOnEnd {
            options: Options::new(level, template),
            result_var: Cow::Borrowed("result"),
        }
    }

    /// Names the placeholder for the return value (default `result`).
    pub fn result_var(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.result_var = name.into();
        self
    }
}

impl Decoration for LogOnEnd {
    fn options(&self) -> &Options {
        &self.options
    }

    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }
}

impl<R: Loggable> Hook<R> for Decorated<LogOnEnd> {
    type Output = Result<R, TemplateError>;

    fn exit(&self, mut ctx: Context, delegated: R) -> Self::Output {
        self.add_callable(&mut ctx);
        ctx.insert(self.hook().result_var.clone(), delegated.to_value());
        self.emit(&ctx)?;
        Ok(delegated)
    }

    fn abort(&self, error: TemplateError) -> Self::Output {
        Err(error)
    }
}

/**
Logs when the callable returns an intercepted error, with the error available as `{e}`.

Wraps callables returning `Result<T, E>`.  The driver's output is
`Result<Option<T>, InvocationError<E>>`:

* `Ok(Some(value))` when the callable succeeded;
* `Err(InvocationError::Raised(e))` for an error that was not intercepted (nothing is
  logged), or an intercepted one when reraising;
* `Ok(None)` for an intercepted error that is not reraised;
* `Err(InvocationError::Template(_))` when the message cannot be rendered.

Nothing is intercepted until [`on_errors`](LogOnError::on_errors) says otherwise.

```rust
use logwrap::{CallSite, Context, Decoration, Intercept, InMemoryLogger, Level, LogOnError, invoke};
use std::num::ParseIntError;
use std::sync::Arc;

let sink = Arc::new(InMemoryLogger::new());
let hook = LogOnError::new(Level::Error, "failed: {e}")
    .on_errors(Intercept::of_type::<ParseIntError>())
    .sink(sink.clone())
    .decorate(CallSite::new("demo", "parse"));

let out = invoke(&hook, Context::new(), || "x".parse::<i32>());
assert!(out.unwrap_err().raised().is_some());
assert_eq!(sink.drain_logs(), "failed: invalid digit found in string");
```
*/
#[derive(Debug)]
pub struct LogOnError {
    options: Options,
    error_var: Cow<'static, str>,
    intercept: Intercept,
    reraise: bool,
    append_sources: bool,
}

impl LogOnError {
    /// An error decorator that reraises what it logs.
    pub fn new(level: Level, template: impl Into<Template>) -> Self {
        LogOnError {
            options: Options::new(level, template),
            error_var: Cow::Borrowed("e"),
            intercept: Intercept::none(),
            reraise: true,
            append_sources: false,
        }
    }

    /// Logs at [`Level::Error`], appends the error's causes to the message and does not
    /// reraise.
    pub fn exception(template: impl Into<Template>) -> Self {
        Self::new(Level::Error, template)
            .reraise(false)
            .append_sources(true)
    }

    /// Names the placeholder for the error (default `e`).
    pub fn error_var(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.error_var = name.into();
        self
    }

    pub fn on_errors(mut self, intercept: Intercept) -> Self {
        self.intercept = intercept;
        self
    }

    /// Whether an intercepted error is returned after logging.
    pub fn reraise(mut self, reraise: bool) -> Self {
        self.reraise = reraise;
        self
    }

    /// Whether the messages of the error's `source()` chain are appended to the record, one
    /// `caused by:` line each.  Only errors captured with [`Value::error_chain`] have a chain;
    /// see [`Decorated::describe_errors`].
    pub fn append_sources(mut self, append: bool) -> Self {
        self.append_sources = append;
        self
    }

    pub fn intercept(&self) -> &Intercept {
        &self.intercept
    }

    pub fn reraises(&self) -> bool {
        self.reraise
    }
}

impl Decoration for LogOnError {
    fn options(&self) -> &Options {
        &self.options
    }

    fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }
}

impl Decorated<LogOnError> {
    /**
    This hook with intercepted errors converted by `describe` instead of [`Value::error`].

    ```rust
    use logwrap::{CallSite, Context, Decoration, InMemoryLogger, Intercept, LogOnError, Value, invoke};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("bad config")]
    struct ConfigError(#[source] std::num::ParseIntError);

    let sink = Arc::new(InMemoryLogger::new());
    let hook = LogOnError::exception("{e}")
        .on_errors(Intercept::all())
        .sink(sink.clone())
        .decorate(CallSite::new("demo", "load"));
    let out = invoke(&hook.describe_errors(Value::error_chain), Context::new(), || {
        "x".parse::<u16>().map_err(ConfigError)
    });
    assert_eq!(out.unwrap(), None);
    assert_eq!(sink.drain_logs(), "bad config\ncaused by: invalid digit found in string");
    ```
    */
    pub fn describe_errors<D>(&self, describe: D) -> Describing<'_, D> {
        Describing {
            decorated: self,
            describe,
        }
    }

    fn finish<T, E: 'static>(
        &self,
        mut ctx: Context,
        delegated: Result<T, E>,
        describe: impl FnOnce(&E) -> Value,
    ) -> Result<Option<T>, InvocationError<E>> {
        let error = match delegated {
            Ok(value) => return Ok(Some(value)),
            Err(error) => error,
        };
        let config = self.hook();
        if !config.intercept.matches(&error) {
            return Err(InvocationError::Raised(error));
        }

        self.add_callable(&mut ctx);
        let value = describe(&error);
        let causes = if config.append_sources {
            caused_by(&value)
        } else {
            String::new()
        };
        ctx.insert(config.error_var.clone(), value);
        let message = self.hook().options().template().render(&ctx)?;
        self.send(message + &causes);

        if config.reraise {
            Err(InvocationError::Raised(error))
        } else {
            Ok(None)
        }
    }
}

/// One `caused by:` line per entry of the error's `sources` field.
fn caused_by(error: &Value) -> String {
    match error.get_field("sources") {
        Some(Value::Seq(sources)) => sources
            .iter()
            .map(|source| format!("\ncaused by: {source}"))
            .collect(),
        _ => String::new(),
    }
}

impl<T, E: Display + 'static> Hook<Result<T, E>> for Decorated<LogOnError> {
    type Output = Result<Option<T>, InvocationError<E>>;

    fn exit(&self, ctx: Context, delegated: Result<T, E>) -> Self::Output {
        self.finish(ctx, delegated, |error| Value::error(error))
    }

    fn abort(&self, error: TemplateError) -> Self::Output {
        Err(InvocationError::Template(error))
    }
}

/// An error hook with its own conversion of intercepted errors.  Made by
/// [`Decorated::describe_errors`].
pub struct Describing<'a, D> {
    decorated: &'a Decorated<LogOnError>,
    describe: D,
}

impl<T, E: 'static, D: Fn(&E) -> Value> Hook<Result<T, E>> for Describing<'_, D> {
    type Output = Result<Option<T>, InvocationError<E>>;

    fn exit(&self, ctx: Context, delegated: Result<T, E>) -> Self::Output {
        self.decorated.finish(ctx, delegated, &self.describe)
    }

    fn abort(&self, error: TemplateError) -> Self::Output {
        Err(InvocationError::Template(error))
    }
}
