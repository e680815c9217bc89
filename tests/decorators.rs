use logwrap::{
    InMemoryLogger, Level, Loggable, Object, Value, log_exception, log_on_end, log_on_error,
    log_on_start,
};
use std::cell::Cell;
use std::num::{ParseIntError, TryFromIntError};
use std::sync::{Arc, LazyLock};

macro_rules! sink {
    ($name:ident) => {
        static $name: LazyLock<Arc<InMemoryLogger>> =
            LazyLock::new(|| Arc::new(InMemoryLogger::new()));
    };
}

sink!(START);
#[log_on_start(Level::Info, "start {x}", sink = START.clone())]
fn start(x: i32) -> i32 {
    x * 2
}

#[test]
fn logs_before_the_call() {
    assert_eq!(start(5), 10);
    let records = START.drain_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Level::Info);
    assert_eq!(records[0].message(), "start 5");
    assert_eq!(records[0].target(), module_path!());
}

sink!(END);
#[log_on_end(Level::Info, "got {result}", sink = END.clone())]
fn end(x: i32) -> i32 {
    x * 2
}

#[test]
fn logs_the_result_after_the_call() {
    assert_eq!(end(5), 10);
    assert_eq!(END.drain_logs(), "got 10");
}

sink!(REPORTED);
#[log_on_error(Level::Error, "failed: {e}", on_errors = [ParseIntError], reraise = true, sink = REPORTED.clone())]
fn reported(input: &str) -> Result<i32, ParseIntError> {
    input.parse()
}

#[test]
fn intercepted_error_is_logged_and_returned() {
    let expected = "x".parse::<i32>().unwrap_err();
    assert_eq!(reported("x"), Err(expected.clone()));
    assert_eq!(REPORTED.drain_logs(), format!("failed: {expected}"));

    assert_eq!(reported("3"), Ok(3));
    assert!(REPORTED.is_empty());
}

sink!(IGNORED);
#[log_on_error(Level::Error, "failed: {e}", on_errors = [TryFromIntError], sink = IGNORED.clone())]
fn ignored(input: &str) -> Result<i32, ParseIntError> {
    input.parse()
}

#[test]
fn other_errors_pass_through_unlogged() {
    assert!(ignored("x").is_err());
    assert!(IGNORED.is_empty());
}

sink!(FIELD);
struct Account {
    id: u32,
}

impl Loggable for Account {
    fn to_value(&self) -> Value {
        Value::Object(Object::new(format!("account {}", self.id)).field("id", &self.id))
    }
}

#[log_on_end(Level::Info, "{account.owner}", sink = FIELD.clone())]
fn missing_field(account: &Account, ran: &Cell<bool>) {
    ran.set(true);
    let _ = account.id;
}

#[test]
#[should_panic(expected = "template field `account.owner` does not resolve")]
fn unresolvable_field_panics_after_the_body_ran() {
    let ran = Cell::new(false);
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        missing_field(&Account { id: 1 }, &ran)
    }));
    assert!(ran.get());
    assert!(FIELD.is_empty());
    std::panic::resume_unwind(outcome.unwrap_err());
}

sink!(START_FIELD);
#[log_on_start(Level::Info, "{account.owner}", sink = START_FIELD.clone())]
fn missing_field_before(account: &Account, ran: &Cell<bool>) {
    ran.set(true);
    let _ = account.id;
}

#[test]
fn unresolvable_field_before_the_call_skips_the_body() {
    let ran = Cell::new(false);
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        missing_field_before(&Account { id: 1 }, &ran)
    }));
    assert!(outcome.is_err());
    assert!(!ran.get());
    assert!(START_FIELD.is_empty());
}

sink!(ONCE);
#[log_on_start(Level::Debug, "start", sink = ONCE.clone())]
#[log_on_end(Level::Debug, "end", sink = ONCE.clone())]
fn counted(calls: &Cell<u32>) -> u32 {
    calls.set(calls.get() + 1);
    calls.get()
}

#[test]
fn stacked_decorators_delegate_exactly_once() {
    let calls = Cell::new(0);
    assert_eq!(counted(&calls), 1);
    assert_eq!(calls.get(), 1);
    assert_eq!(ONCE.drain_logs(), "start\nend");
}

sink!(ACCESSORS);
#[log_on_start(Level::Info, "{callable.name}: {account.id:>4} of {names[1]:?} ({callable})", sink = ACCESSORS.clone())]
fn accessors(account: &Account, names: Vec<&str>, _unlogged: std::fs::File) -> usize {
    names.len() + account.id as usize
}

#[test]
fn placeholders_support_accessors_and_specs() {
    let file = std::fs::File::open(env!("CARGO_MANIFEST_DIR").to_string() + "/Cargo.toml").unwrap();
    assert_eq!(accessors(&Account { id: 7 }, vec!["a", "b"], file), 9);
    assert_eq!(
        ACCESSORS.drain_logs(),
        format!("accessors:    7 of \"b\" ({}::accessors)", module_path!())
    );
}

sink!(RENAMED);
#[log_on_end(Level::Info, "{fn_name} -> {value}", callable_var = "fn_name", result_var = "value", sink = RENAMED.clone())]
fn renamed() -> Option<&'static str> {
    Some("found")
}

#[test]
fn placeholder_names_are_configurable() {
    assert_eq!(renamed(), Some("found"));
    assert_eq!(
        RENAMED.drain_logs(),
        format!("{}::renamed -> found", module_path!())
    );
}

sink!(EARLY);
#[log_on_end(Level::Info, "returned {result}", sink = EARLY.clone())]
fn early_return(x: i32) -> i32 {
    if x < 0 {
        return 0;
    }
    x
}

#[test]
fn early_returns_are_still_logged() {
    assert_eq!(early_return(-4), 0);
    assert_eq!(early_return(4), 4);
    assert_eq!(EARLY.drain_logs(), "returned 0\nreturned 4");
}

struct Opaque(u8);

sink!(UNCAPTURED);
#[log_on_end(Level::Trace, "done with {x}", sink = UNCAPTURED.clone())]
fn opaque(x: u8) -> Opaque {
    Opaque(x)
}

#[test]
fn results_the_template_ignores_need_not_be_loggable() {
    assert_eq!(opaque(3).0, 3);
    assert_eq!(UNCAPTURED.drain_logs(), "done with 3");
}

sink!(SWALLOWED);
#[log_exception("{callable.name} failed: {e}", on_errors = all, sink = SWALLOWED.clone())]
fn swallowed(input: &str) -> Result<i32, ParseIntError> {
    input.parse()
}

#[test]
fn exceptions_are_logged_at_error_and_swallowed() {
    assert_eq!(swallowed("x"), Ok(0));
    let records = SWALLOWED.drain_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), Level::Error);
    assert_eq!(records[0].message(), "swallowed failed: invalid digit found in string");
}

sink!(PREDICATE);
#[derive(Debug, PartialEq)]
enum FetchError {
    Timeout,
    NotFound,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout => f.write_str("timed out"),
            FetchError::NotFound => f.write_str("not found"),
        }
    }
}

#[log_on_error(
    Level::Warning,
    "retrying {url}: {err}",
    when = |e: &FetchError| *e == FetchError::Timeout,
    error_var = "err",
    reraise = false,
    fallback = String::from("cached"),
    sink = PREDICATE.clone()
)]
fn fetch(url: &str, error: Option<FetchError>) -> Result<String, FetchError> {
    match error {
        Some(error) => Err(error),
        None => Ok(format!("body of {url}")),
    }
}

#[test]
fn predicates_select_errors() {
    assert_eq!(fetch("a", None).as_deref(), Ok("body of a"));
    assert_eq!(fetch("b", Some(FetchError::Timeout)).as_deref(), Ok("cached"));
    assert_eq!(fetch("c", Some(FetchError::NotFound)), Err(FetchError::NotFound));
    assert_eq!(PREDICATE.drain_logs(), "retrying b: timed out");
}

sink!(BOXED);
#[log_on_error(Level::Error, "boxed: {e}", on_errors = [ParseIntError], sink = BOXED.clone())]
fn boxed(input: &str) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
    Ok(input.parse::<i32>()?)
}

#[test]
fn boxed_errors_are_matched_by_their_concrete_type() {
    assert!(boxed("x").is_err());
    assert_eq!(BOXED.drain_logs(), "boxed: invalid digit found in string");
}

sink!(METHODS);
struct Counter {
    count: u32,
}

impl Loggable for Counter {
    fn to_value(&self) -> Value {
        Value::Object(Object::new(format!("Counter({})", self.count)).field("count", &self.count))
    }
}

impl Counter {
    #[log_on_end(Level::Debug, "{self.count} after adding {n}", sink = METHODS.clone())]
    fn add(&mut self, n: u32) -> u32 {
        self.count += n;
        self.count
    }
}

#[test]
fn methods_capture_self() {
    let mut counter = Counter { count: 1 };
    assert_eq!(counter.add(2), 3);
    // captured before the call
    assert_eq!(METHODS.drain_logs(), "1 after adding 2");
}

sink!(NESTED_START);
#[log_on_start(Level::Info, "outer", sink = NESTED_START.clone())]
#[log_on_start(Level::Info, "inner", sink = NESTED_START.clone())]
fn nested_start() {}

sink!(NESTED_END);
#[log_on_end(Level::Info, "outer", sink = NESTED_END.clone())]
#[logwrap::log_on_end(Level::Info, "inner", sink = NESTED_END.clone())]
fn nested_end() {}

#[test]
fn the_topmost_attribute_is_the_outermost_wrapper() {
    nested_start();
    assert_eq!(NESTED_START.drain_logs(), "outer\ninner");
    nested_end();
    assert_eq!(NESTED_END.drain_logs(), "inner\nouter");
}

sink!(DOCUMENTED);
/// Doc comments may sit inside a stack.
#[log_on_start(Level::Info, "first {x}", sink = DOCUMENTED.clone())]
/// Between the attributes, too.
#[log_on_end(Level::Info, "then {result}", sink = DOCUMENTED.clone())]
#[log_on_start(Level::Info, "second {x}", sink = DOCUMENTED.clone())]
fn documented(x: u8) -> u8 {
    x + 1
}

#[test]
fn stacks_keep_source_order_across_doc_comments() {
    assert_eq!(documented(1), 2);
    assert_eq!(DOCUMENTED.drain_logs(), "first 1\nsecond 1\nthen 2");
}

#[derive(Debug)]
struct Settings {
    retries: u8,
}

sink!(UNLOGGABLE);
#[log_on_start(Level::Info, "{addr} {big} {ratio} {settings:?}", sink = UNLOGGABLE.clone())]
fn connect(addr: std::net::IpAddr, big: i128, ratio: f32, settings: Settings) -> u8 {
    settings.retries
}

#[test]
fn parameters_fall_back_to_display_and_debug() {
    let addr = std::net::IpAddr::from([127, 0, 0, 1]);
    assert_eq!(connect(addr, -(1 << 100), 0.1, Settings { retries: 3 }), 3);
    assert_eq!(
        UNLOGGABLE.drain_logs(),
        format!(
            "127.0.0.1 {} {} Settings {{ retries: 3 }}",
            -(1i128 << 100),
            0.1f32
        )
    );
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("could not load {path}")]
struct LoadError {
    path: String,
    #[source]
    cause: ParseIntError,
}

fn load_setting(path: &str, raw: &str) -> Result<i32, LoadError> {
    raw.parse().map_err(|cause| LoadError {
        path: path.to_string(),
        cause,
    })
}

sink!(CHAINED);
#[log_exception("{callable.name} failed: {e}", on_errors = all, sink = CHAINED.clone())]
fn chained(raw: &str) -> Result<i32, LoadError> {
    load_setting("retries.toml", raw)
}

#[test]
fn exceptions_append_their_source_chain() {
    assert_eq!(chained("x"), Ok(0));
    assert_eq!(
        CHAINED.drain_logs(),
        "chained failed: could not load retries.toml\ncaused by: invalid digit found in string"
    );
}

sink!(SOURCES);
#[log_on_error(Level::Warning, "{e.message} <- {e.sources[0]}", on_errors = all, sink = SOURCES.clone())]
fn sources(raw: &str) -> Result<i32, LoadError> {
    load_setting("limits.toml", raw)
}

sink!(UNCHAINED);
#[log_exception("failed: {e}", on_errors = all, append_sources = false, sink = UNCHAINED.clone())]
fn unchained(raw: &str) -> Result<i32, LoadError> {
    load_setting("limits.toml", raw)
}

#[test]
fn error_sources_are_addressable_from_templates() {
    assert!(sources("x").is_err());
    assert_eq!(
        SOURCES.drain_logs(),
        "could not load limits.toml <- invalid digit found in string"
    );
    assert_eq!(unchained("x"), Ok(0));
    assert_eq!(UNCHAINED.drain_logs(), "failed: could not load limits.toml");
}

sink!(HANDLED);
#[log_on_end(Level::Info, "handled {result}", handler = HANDLED.clone())]
fn handled() -> u8 {
    9
}

#[test]
fn handlers_receive_every_record() {
    assert_eq!(handled(), 9);
    assert_eq!(HANDLED.drain_logs(), "handled 9");
}
