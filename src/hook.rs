// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
The hook state machine and its two drivers.

Every decorator runs the same sequence around the call it wraps:

```text
ENTER -> (pre-call log?) -> DELEGATE -> (post-call or error log?) -> EXIT
```

[`Hook`] is that sequence with the delegation step left out.  [`invoke`] fills it in with a
plain closure call and [`invoke_async`] with an `.await`; nothing else differs between the
synchronous and asynchronous forms.
*/

use crate::Level;
use crate::context::{CallSite, Context};
use crate::error::TemplateError;
use crate::global_logger::{Fanout, default_sink, emit_internal};
use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::template::Template;
use crate::value::Loggable;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

/// Derives a sink from the decorated callable.
pub type SinkFactory = fn(&CallSite) -> Arc<dyn Logger>;

/// Settings shared by every decorator.
#[derive(Debug, Clone)]
pub struct Options {
    pub(crate) level: Level,
    pub(crate) template: Template,
    pub(crate) sink: Option<Arc<dyn Logger>>,
    pub(crate) handler: Option<Arc<dyn Logger>>,
    pub(crate) sink_factory: SinkFactory,
    pub(crate) callable_var: Cow<'static, str>,
}

impl Options {
    pub fn new(level: Level, template: impl Into<Template>) -> Self {
        Options {
            level,
            template: template.into(),
            sink: None,
            handler: None,
            sink_factory: default_sink,
            callable_var: Cow::Borrowed("callable"),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn callable_var(&self) -> &str {
        &self.callable_var
    }
}

/**
A decorator configuration.

Implementors carry [`Options`]; the provided methods are the builder surface every decorator
shares, and [`decorate`](Decoration::decorate) binds the configuration to a callable.
*/
pub trait Decoration: Sized {
    fn options(&self) -> &Options;

    fn options_mut(&mut self) -> &mut Options;

    /// Emits every record to `sink` instead of deriving one from the callable.
    fn sink(mut self, sink: Arc<dyn Logger>) -> Self {
        self.options_mut().sink = Some(sink);
        self
    }

    /// Sends records to `handler` in addition to the derived sink.
    ///
    /// Ignored, with a warning on the `logwrap` target, when an explicit
    /// [`sink`](Decoration::sink) is set too.
    fn handler(mut self, handler: Arc<dyn Logger>) -> Self {
        self.options_mut().handler = Some(handler);
        self
    }

    /// Derives the sink with `factory` when no explicit sink is set.
    fn sink_factory(mut self, factory: SinkFactory) -> Self {
        self.options_mut().sink_factory = factory;
        self
    }

    /// Names the placeholder for the decorated callable (default `callable`).
    fn callable_var(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.options_mut().callable_var = name.into();
        self
    }

    /// Binds this configuration to `site`, resolving the sink once.
    fn decorate(self, site: CallSite) -> Decorated<Self> {
        let options = self.options();
        let sink: Arc<dyn Logger> = match (&options.sink, &options.handler) {
            (Some(sink), handler) => {
                if handler.is_some() {
                    emit_internal(
                        Level::Warning,
                        format!("`{site}` sets both a sink and a handler; the handler is ignored"),
                    );
                }
                sink.clone()
            }
            (None, Some(handler)) => Arc::new(Fanout::new([(options.sink_factory)(&site), handler.clone()])),
            (None, None) => (options.sink_factory)(&site),
        };
        Decorated {
            hook: self,
            site,
            sink,
        }
    }
}

/// A configuration bound to a callable and its sink.
#[derive(Debug, Clone)]
pub struct Decorated<H> {
    hook: H,
    site: CallSite,
    sink: Arc<dyn Logger>,
}

impl<H: Decoration> Decorated<H> {
    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn site(&self) -> CallSite {
        self.site
    }

    pub fn sink(&self) -> &Arc<dyn Logger> {
        &self.sink
    }

    /// Adds the callable to `ctx` under the configured name.
    pub(crate) fn add_callable(&self, ctx: &mut Context) {
        let options = self.hook.options();
        ctx.insert(options.callable_var.clone(), self.site.to_value());
    }

    /// Renders the message and hands it to the sink.  Nothing is emitted when rendering fails.
    pub(crate) fn emit(&self, ctx: &Context) -> Result<(), TemplateError> {
        let message = self.hook.options().template.render(ctx)?;
        self.send(message);
        Ok(())
    }

    pub(crate) fn send(&self, message: String) {
        let level = self.hook.options().level;
        self.sink
            .finish_log_record(LogRecord::new(level, self.site.module(), message));
    }
}

/**
What a decorator does around a call returning `R`.

The drivers call [`enter`](Hook::enter) before delegating.  If it fails, the callable is not
run and [`abort`](Hook::abort) produces the output; otherwise the callable runs exactly once
and [`exit`](Hook::exit) turns its return value into the output.
*/
pub trait Hook<R> {
    type Output;

    fn enter(&self, _ctx: &mut Context) -> Result<(), TemplateError> {
        Ok(())
    }

    fn exit(&self, ctx: Context, delegated: R) -> Self::Output;

    fn abort(&self, error: TemplateError) -> Self::Output;
}

/**
Runs `f` under `hook`.

```rust
use logwrap::{CallSite, Context, Decoration, InMemoryLogger, Level, LogOnEnd, invoke};
use std::sync::Arc;

let sink = Arc::new(InMemoryLogger::new());
let hook = LogOnEnd::new(Level::Info, "got {result}")
    .sink(sink.clone())
    .decorate(CallSite::new("demo", "double"));

let x = 5;
let out = invoke(&hook, Context::new().with("x", &x), || x * 2).unwrap();
assert_eq!(out, 10);
assert_eq!(sink.drain_logs(), "got 10");
```
*/
pub fn invoke<R, H>(hook: &H, mut ctx: Context, f: impl FnOnce() -> R) -> H::Output
where
    H: Hook<R> + ?Sized,
{
    if let Err(error) = hook.enter(&mut ctx) {
        return hook.abort(error);
    }
    let delegated = f();
    hook.exit(ctx, delegated)
}

/**
Awaits `future` under `hook`.

The records are emitted synchronously around the single suspension point, the delegated
future.  Dropping the returned future before it completes drops `future` too, and no
post-call record is emitted.
*/
pub async fn invoke_async<R, H, F>(hook: &H, mut ctx: Context, future: F) -> H::Output
where
    H: Hook<R> + ?Sized,
    F: Future<Output = R>,
{
    if let Err(error) = hook.enter(&mut ctx) {
        return hook.abort(error);
    }
    let delegated = future.await;
    hook.exit(ctx, delegated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory_logger::InMemoryLogger;
    use std::sync::Mutex;

    /// Records the order of the state machine's steps.
    #[derive(Default)]
    struct Trace {
        steps: Mutex<Vec<String>>,
        fail_enter: bool,
    }

    impl Trace {
        fn push(&self, step: impl Into<String>) {
            self.steps.lock().unwrap().push(step.into());
        }
    }

    impl Hook<i32> for Trace {
        type Output = Result<i32, TemplateError>;

        fn enter(&self, _ctx: &mut Context) -> Result<(), TemplateError> {
            self.push("enter");
            if self.fail_enter {
                return Err(TemplateError::MissingName { name: "x".into() });
            }
            Ok(())
        }

        fn exit(&self, _ctx: Context, delegated: i32) -> Self::Output {
            self.push(format!("exit {delegated}"));
            Ok(delegated)
        }

        fn abort(&self, error: TemplateError) -> Self::Output {
            self.push("abort");
            Err(error)
        }
    }

    #[test]
    fn steps_run_in_order() {
        let trace = Trace::default();
        let out = invoke(&trace, Context::new(), || {
            trace.push("delegate");
            3
        });
        assert_eq!(out, Ok(3));
        assert_eq!(*trace.steps.lock().unwrap(), ["enter", "delegate", "exit 3"]);
    }

    #[test]
    fn failed_enter_skips_delegation() {
        let trace = Trace {
            fail_enter: true,
            ..Trace::default()
        };
        let out = invoke(&trace, Context::new(), || {
            trace.push("delegate");
            3
        });
        assert!(out.is_err());
        assert_eq!(*trace.steps.lock().unwrap(), ["enter", "abort"]);
    }

    #[test_executors::async_test]
    async fn async_driver_runs_the_same_steps() {
        let trace = Trace::default();
        let out = invoke_async(&trace, Context::new(), async {
            trace.push("delegate");
            4
        })
        .await;
        assert_eq!(out, Ok(4));
        assert_eq!(*trace.steps.lock().unwrap(), ["enter", "delegate", "exit 4"]);
    }

    #[derive(Debug)]
    struct Bare(Options);

    impl Decoration for Bare {
        fn options(&self) -> &Options {
            &self.0
        }

        fn options_mut(&mut self) -> &mut Options {
            &mut self.0
        }
    }

    fn fixed_sink(_site: &CallSite) -> Arc<dyn Logger> {
        static SINK: std::sync::OnceLock<Arc<InMemoryLogger>> = std::sync::OnceLock::new();
        SINK.get_or_init(|| Arc::new(InMemoryLogger::new())).clone()
    }

    #[test]
    fn explicit_sink_wins_over_factory() {
        let explicit = Arc::new(InMemoryLogger::new());
        let decorated = Bare(Options::new(Level::Debug, "{callable}"))
            .sink_factory(fixed_sink)
            .sink(explicit.clone())
            .decorate(CallSite::new("hooks", "f"));
        let mut ctx = Context::new();
        decorated.add_callable(&mut ctx);
        decorated.emit(&ctx).unwrap();

        let records = explicit.drain_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level(), Level::Debug);
        assert_eq!(records[0].target(), "hooks");
        assert_eq!(records[0].message(), "hooks::f");
    }

    #[test]
    fn handlers_receive_records_alongside_the_derived_sink() {
        static DERIVED: std::sync::OnceLock<Arc<InMemoryLogger>> = std::sync::OnceLock::new();
        fn derived(_site: &CallSite) -> Arc<dyn Logger> {
            DERIVED.get_or_init(|| Arc::new(InMemoryLogger::new())).clone()
        }
        let handler = Arc::new(InMemoryLogger::new());
        let decorated = Bare(Options::new(Level::Info, "hello"))
            .sink_factory(derived)
            .handler(handler.clone())
            .decorate(CallSite::new("handlers", "f"));
        decorated.emit(&Context::new()).unwrap();
        assert_eq!(handler.drain_logs(), "hello");
        assert_eq!(DERIVED.get().unwrap().drain_logs(), "hello");
    }

    #[test]
    fn explicit_sink_overrides_the_handler() {
        let _guard = crate::global_logger::tests::TEST_LOGGER_GUARD
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let global = Arc::new(InMemoryLogger::new());
        let original = crate::global_logger::global_loggers();
        crate::global_logger::set_global_loggers(vec![global.clone()]);

        let sink = Arc::new(InMemoryLogger::new());
        let handler = Arc::new(InMemoryLogger::new());
        let decorated = Bare(Options::new(Level::Info, "hello"))
            .handler(handler.clone())
            .sink(sink.clone())
            .decorate(CallSite::new("handlers", "g"));
        decorated.emit(&Context::new()).unwrap();

        assert_eq!(sink.drain_logs(), "hello");
        assert!(handler.is_empty());
        let warnings = global.drain_records();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level(), Level::Warning);
        assert_eq!(warnings[0].target(), "logwrap");
        assert!(warnings[0].message().contains("handler is ignored"));
        crate::global_logger::set_global_loggers(original);
    }

    #[test]
    fn factory_receives_the_call_site() {
        fn by_module(site: &CallSite) -> Arc<dyn Logger> {
            assert_eq!(site.module(), "factory_test");
            Arc::new(InMemoryLogger::new())
        }
        let decorated = Bare(Options::new(Level::Info, "x"))
            .sink_factory(by_module)
            .callable_var("fn")
            .decorate(CallSite::new("factory_test", "g"));
        assert_eq!(decorated.hook().options().callable_var(), "fn");
        assert_eq!(decorated.site().name(), "g");
    }
}
