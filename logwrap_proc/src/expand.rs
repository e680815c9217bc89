// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code generation shared by the four attributes.
//!
//! A decorated function keeps its signature; only its body changes.  The new body builds the
//! decorator configuration once, in a function-local `static`, captures the parameters the
//! template reads, and runs the original body through `logwrap::invoke` (or
//! `logwrap::invoke_async` for an `async fn`):
//!
//! ```ignore
//! # // ignore because: This illustrates generated code output, not actual runnable code
//! #[log_on_start(Level::Info, "start {x}")]
//! fn f(x: i32) -> i32 { x * 2 }
//!
//! // becomes
//! fn f(x: i32) -> i32 {
//!     static __LOGWRAP_HOOK: ::std::sync::OnceLock<logwrap::Decorated<logwrap::LogOnStart>> = ..;
//!     let __logwrap_hook = __LOGWRAP_HOOK.get_or_init(|| logwrap::Decoration::decorate(
//!         logwrap::LogOnStart::new(Level::Info, "start {x}"),
//!         logwrap::CallSite::new(module_path!(), "f"),
//!     ));
//!     let __logwrap_ctx = {
//!         use logwrap::hidden::{CaptureLoggable as _, /* .. */};
//!         let mut ctx = logwrap::Context::new();
//!         ctx.insert("x", (&&&&logwrap::hidden::Capture(&x)).capture());
//!         ctx
//!     };
//!     logwrap::hidden::unwrap_rendered(logwrap::invoke(__logwrap_hook, __logwrap_ctx, move || -> i32 { x * 2 }))
//! }
//! ```
//!
//! Captures go through autoref specialization: `Loggable` first, then `Display` and `Debug`
//! together, then either one alone.  Error hooks capture the error the same way, keeping its
//! `source()` chain when it has one.
//!
//! The original body is spliced in as its token group, so diagnostics inside it keep their
//! spans.
//!
//! A stack of our attributes is expanded by the topmost one in a single pass, bottom layer
//! first, so the topmost attribute ends up as the outermost wrapper.

use crate::parser::{
    Arg, bracket_list, placeholder_names, split_args, string_literal, tokens_to_string,
};
use crate::signature::{scan, take_stacked};
use proc_macro::{Group, TokenStream, TokenTree};

/// Stands in for the original body in generated source until it is spliced.
const BODY_MARKER: &str = "__logwrap_body__";

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Start,
    End,
    Error,
    Exception,
}

impl Variant {
    const ATTR_NAMES: [&'static str; 4] = ["log_on_start", "log_on_end", "log_on_error", "log_exception"];

    fn from_attr_name(name: &str) -> Option<Variant> {
        match name {
            "log_on_start" => Some(Variant::Start),
            "log_on_end" => Some(Variant::End),
            "log_on_error" => Some(Variant::Error),
            "log_exception" => Some(Variant::Exception),
            _ => None,
        }
    }

    fn attr_name(self) -> &'static str {
        match self {
            Variant::Start => "log_on_start",
            Variant::End => "log_on_end",
            Variant::Error => "log_on_error",
            Variant::Exception => "log_exception",
        }
    }

    fn handles_errors(self) -> bool {
        matches!(self, Variant::Error | Variant::Exception)
    }

    fn config_type(self) -> &'static str {
        match self {
            Variant::Start => "logwrap::LogOnStart",
            Variant::End => "logwrap::LogOnEnd",
            Variant::Error | Variant::Exception => "logwrap::LogOnError",
        }
    }
}

/// The attribute arguments, validated.
struct Options {
    level: Option<String>,
    template: String,
    names: Vec<String>,
    sink: Option<String>,
    sink_factory: Option<String>,
    handler: Option<String>,
    callable_var: String,
    result_var: String,
    error_var: String,
    on_errors: Option<OnErrors>,
    when: Option<String>,
    reraise: Option<String>,
    fallback: Option<String>,
    append_sources: Option<String>,
}

enum OnErrors {
    All,
    Types(Vec<String>),
}

fn var_name(variant: Variant, key: &str, value: &[TokenTree]) -> Result<String, String> {
    string_literal(value).ok_or_else(|| {
        format!(
            "#[{}] `{key}` must be a string literal",
            variant.attr_name()
        )
    })
}

fn parse_options(variant: Variant, attr: TokenStream) -> Result<Options, String> {
    let attr_name = variant.attr_name();
    let mut positional = Vec::new();
    let mut options = Options {
        level: None,
        template: String::new(),
        names: Vec::new(),
        sink: None,
        sink_factory: None,
        handler: None,
        callable_var: "callable".to_string(),
        result_var: "result".to_string(),
        error_var: "e".to_string(),
        on_errors: None,
        when: None,
        reraise: None,
        fallback: None,
        append_sources: None,
    };

    for arg in split_args(attr) {
        let (key, value) = match arg {
            Arg::Positional(tokens) => {
                positional.push(tokens);
                continue;
            }
            Arg::Named(key, value) => (key, value),
        };
        if value.is_empty() {
            return Err(format!("#[{attr_name}] `{key}` needs a value"));
        }
        let misplaced = || format!("#[{attr_name}] does not accept `{key}`");
        match key.as_str() {
            "sink" => options.sink = Some(tokens_to_string(&value)),
            "sink_factory" => options.sink_factory = Some(tokens_to_string(&value)),
            "handler" => options.handler = Some(tokens_to_string(&value)),
            "callable_var" => options.callable_var = var_name(variant, &key, &value)?,
            "result_var" if variant == Variant::End => {
                options.result_var = var_name(variant, &key, &value)?;
            }
            "error_var" if variant.handles_errors() => {
                options.error_var = var_name(variant, &key, &value)?;
            }
            "on_errors" if variant.handles_errors() => {
                options.on_errors = Some(match value.as_slice() {
                    [TokenTree::Ident(all)] if all.to_string() == "all" => OnErrors::All,
                    _ => OnErrors::Types(bracket_list(&value).ok_or_else(|| {
                        format!("#[{attr_name}] `on_errors` must be `all` or a list of error types, e.g. `[ParseIntError]`")
                    })?),
                });
            }
            "when" if variant.handles_errors() => options.when = Some(tokens_to_string(&value)),
            "reraise" if variant.handles_errors() => options.reraise = Some(tokens_to_string(&value)),
            "fallback" if variant.handles_errors() => {
                options.fallback = Some(tokens_to_string(&value));
            }
            "append_sources" if variant.handles_errors() => {
                options.append_sources = Some(tokens_to_string(&value));
            }
            "result_var" | "error_var" | "on_errors" | "when" | "reraise" | "fallback"
            | "append_sources" => {
                return Err(misplaced());
            }
            _ => return Err(format!("#[{attr_name}] got an unknown argument `{key}`")),
        }
    }

    let mut positional = positional.into_iter();
    if variant != Variant::Exception {
        let level = positional.next().ok_or_else(|| {
            format!("#[{attr_name}] expects a level and a template, e.g. #[{attr_name}(Level::Info, \"...\")]")
        })?;
        options.level = Some(tokens_to_string(&level));
    }
    let template = positional
        .next()
        .ok_or_else(|| format!("#[{attr_name}] expects a message template"))?;
    let source = string_literal(&template)
        .ok_or_else(|| format!("#[{attr_name}] the message template must be a string literal"))?;
    options.names = placeholder_names(&source).map_err(|reason| format!("#[{attr_name}] {reason}"))?;
    options.template = tokens_to_string(&template);
    if positional.next().is_some() {
        return Err(format!("#[{attr_name}] got too many positional arguments"));
    }
    Ok(options)
}

impl Options {
    /// Names the hook adds to the context for `variant`.
    fn hook_names(&self, variant: Variant) -> Vec<&str> {
        let mut names = vec![self.callable_var.as_str()];
        match variant {
            Variant::End => names.push(&self.result_var),
            Variant::Error | Variant::Exception => names.push(&self.error_var),
            Variant::Start => {}
        }
        names
    }

    /// Whether an intercepted error is known to be returned, so no fallback is needed.
    fn always_reraises(&self, variant: Variant) -> bool {
        match self.reraise.as_deref() {
            Some(reraise) => reraise == "true",
            None => variant == Variant::Error,
        }
    }

    fn config(&self, variant: Variant) -> String {
        let mut config = match (variant, &self.level) {
            (Variant::Exception, _) | (_, None) => {
                format!("logwrap::LogOnError::exception({})", self.template)
            }
            (_, Some(level)) => format!("{}::new({level}, {})", variant.config_type(), self.template),
        };
        if let Some(sink) = &self.sink {
            config = format!("logwrap::Decoration::sink({config}, {sink})");
        }
        if let Some(factory) = &self.sink_factory {
            config = format!("logwrap::Decoration::sink_factory({config}, {factory})");
        }
        if let Some(handler) = &self.handler {
            config = format!("logwrap::Decoration::handler({config}, {handler})");
        }
        if self.callable_var != "callable" {
            config = format!("logwrap::Decoration::callable_var({config}, {:?})", self.callable_var);
        }
        match variant {
            Variant::End if self.result_var != "result" => {
                config = format!("{config}.result_var({:?})", self.result_var);
            }
            Variant::Error | Variant::Exception => {
                if self.error_var != "e" {
                    config = format!("{config}.error_var({:?})", self.error_var);
                }
                let intercept = match (&self.on_errors, &self.when) {
                    (None, None) => None,
                    (Some(OnErrors::All), _) => Some("logwrap::Intercept::all()".to_string()),
                    (Some(OnErrors::Types(types)), when) => {
                        let mut intercept = "logwrap::Intercept::none()".to_string();
                        for ty in types {
                            intercept = format!("{intercept}.or_type::<{ty}>()");
                        }
                        if let Some(when) = when {
                            intercept = format!("{intercept}.or_when({when})");
                        }
                        Some(intercept)
                    }
                    (None, Some(when)) => Some(format!("logwrap::Intercept::when({when})")),
                };
                if let Some(intercept) = intercept {
                    config = format!("{config}.on_errors({intercept})");
                }
                if let Some(reraise) = &self.reraise {
                    config = format!("{config}.reraise({reraise})");
                }
                if let Some(append) = &self.append_sources {
                    config = format!("{config}.append_sources({append})");
                }
            }
            _ => {}
        }
        config
    }
}

/// Replaces the body marker with `body`, descending into groups.
fn splice(stream: TokenStream, body: &TokenTree) -> TokenStream {
    stream
        .into_iter()
        .map(|token| match token {
            TokenTree::Ident(ident) if ident.to_string() == BODY_MARKER => body.clone(),
            TokenTree::Group(group) => {
                let mut spliced = Group::new(group.delimiter(), splice(group.stream(), body));
                spliced.set_span(group.span());
                TokenTree::Group(spliced)
            }
            other => other,
        })
        .collect()
}

fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .expect("compile_error! invocation should parse")
}

/// Expands `#[variant(attr)] item` together with the attributes of ours stacked directly
/// below it.  Misuse becomes a `compile_error!` next to the item, stripped of those
/// attributes.
pub fn expand(variant: Variant, attr: TokenStream, item: TokenStream) -> TokenStream {
    let (stacked, item) = take_stacked(item, "logwrap", &Variant::ATTR_NAMES);
    let mut layers = vec![(variant, attr)];
    layers.extend(
        stacked
            .into_iter()
            .filter_map(|(name, args)| Variant::from_attr_name(&name).map(|variant| (variant, args))),
    );

    let original = item.clone();
    let expanded = layers
        .into_iter()
        .rev()
        .try_fold(item, |item, (variant, attr)| try_expand(variant, attr, item));
    match expanded {
        Ok(expanded) => expanded,
        Err(message) => {
            let mut out = compile_error(&message);
            out.extend(original);
            out
        }
    }
}

fn try_expand(variant: Variant, attr: TokenStream, item: TokenStream) -> Result<TokenStream, String> {
    let attr_name = variant.attr_name();
    let options = parse_options(variant, attr)?;
    let item = scan(item, attr_name)?;

    let hook_names = options.hook_names(variant);
    for name in &options.names {
        if !hook_names.contains(&name.as_str()) && !item.params.contains(name) {
            return Err(format!(
                "#[{attr_name}] template references `{name}`, which is not a parameter of `{}`; available: {}",
                item.name,
                item.params
                    .iter()
                    .map(String::as_str)
                    .chain(hook_names.iter().copied())
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }
    }

    let ret = item.ret.as_deref();
    if variant.handles_errors() && ret.is_none() {
        return Err(format!(
            "#[{attr_name}] can only be applied to functions returning a `Result`"
        ));
    }
    // closures cannot name an `impl Trait` return type
    let annotated = ret.filter(|ret| !ret.split_whitespace().any(|word| word == "impl"));

    let captures: String = options
        .names
        .iter()
        .filter(|name| item.params.contains(name) && !hook_names.contains(&name.as_str()))
        .map(|name| format!("__logwrap_ctx.insert({name:?}, (&&&&logwrap::hidden::Capture(&{name})).capture());"))
        .collect();

    let captures_result = variant == Variant::End && options.names.contains(&options.result_var);

    // the delegated body, as a closure (sync) or a future (async)
    let body = if item.is_async {
        let inner = match annotated {
            Some(ret) => format!("async move {{ let __logwrap_out: {ret} = {BODY_MARKER}; __logwrap_out }}"),
            None => format!("async move {{ {BODY_MARKER} }}"),
        };
        if variant == Variant::End && !captures_result {
            format!("async move {{ logwrap::hidden::Uncaptured({inner}.await) }}")
        } else {
            inner
        }
    } else {
        let inner = match annotated {
            Some(ret) => format!("move || -> {ret} {BODY_MARKER}"),
            None => format!("move || {BODY_MARKER}"),
        };
        if variant == Variant::End && !captures_result {
            format!("move || logwrap::hidden::Uncaptured(({inner})())")
        } else {
            inner
        }
    };

    let driver = match (variant.handles_errors(), item.is_async) {
        (false, true) => format!("logwrap::invoke_async(__logwrap_hook, __logwrap_ctx, {body}).await"),
        (false, false) => format!("logwrap::invoke(__logwrap_hook, __logwrap_ctx, {body})"),
        (true, is_async) => {
            let error = match annotated {
                Some(ret) => format!("__logwrap_e: &<{ret} as logwrap::hidden::Fallible>::Error"),
                None => "__logwrap_e".to_string(),
            };
            let describe = format!(
                "|{error}| {{
                    #[allow(unused_imports)]
                    use logwrap::hidden::{{CaptureBoxedError as _, CaptureDisplayError as _, CaptureError as _}};
                    (&&&logwrap::hidden::ErrorCapture(__logwrap_e)).capture_error()
                }}"
            );
            if is_async {
                format!("logwrap::hidden::invoke_async_described(__logwrap_hook, __logwrap_ctx, {body}, {describe}).await")
            } else {
                format!("logwrap::hidden::invoke_described(__logwrap_hook, __logwrap_ctx, {body}, {describe})")
            }
        }
    };

    let outcome = match variant {
        Variant::Start => format!("logwrap::hidden::unwrap_rendered({driver})"),
        Variant::End if captures_result => format!("logwrap::hidden::unwrap_rendered({driver})"),
        Variant::End => format!("logwrap::hidden::unwrap_rendered({driver}).into_inner()"),
        Variant::Error | Variant::Exception => {
            let fallback = match &options.fallback {
                Some(fallback) => format!("|| {fallback}"),
                None if options.always_reraises(variant) => {
                    "|| ::core::unreachable!(\"a reraising error hook swallowed an error\")".to_string()
                }
                None => "::core::default::Default::default".to_string(),
            };
            format!("logwrap::hidden::settle({driver}, {fallback})")
        }
    };

    let source = format!(
        r#"
        static __LOGWRAP_HOOK: ::std::sync::OnceLock<logwrap::Decorated<{config_type}>> = ::std::sync::OnceLock::new();
        let __logwrap_hook = __LOGWRAP_HOOK.get_or_init(|| {{
            logwrap::Decoration::decorate(
                {config},
                logwrap::CallSite::new(module_path!(), {name:?}),
            )
        }});
        let __logwrap_ctx = {{
            #[allow(unused_imports)]
            use logwrap::hidden::{{CaptureDebug as _, CaptureDescribed as _, CaptureDisplay as _, CaptureLoggable as _}};
            #[allow(unused_mut)]
            let mut __logwrap_ctx = logwrap::Context::new();
            {captures}
            __logwrap_ctx
        }};
        {outcome}
        "#,
        config_type = variant.config_type(),
        config = options.config(variant),
        name = item.name,
    );
    let generated: TokenStream = source
        .parse()
        .map_err(|_| format!("#[{attr_name}] could not parse one of its arguments"))?;
    let body = splice(generated, item.body());
    Ok(item.with_body(body))
}
