// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values captured into an invocation context.
//!
//! Templates are rendered at run time against arbitrary arguments, so every argument, result
//! and error is first converted into a [`Value`] through the [`Loggable`] trait.  A `Value`
//! knows how to display itself (`{x}`), how to debug-print itself (`{x:?}`, `{x:#?}`) and,
//! for sequences, maps and objects, how to hand out its parts to field accessors
//! (`{x.name}`, `{x[0]}`).

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// A value that can be substituted into a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value, e.g. `Option::None`.  Displays as `None`.
    None,
    /// `Option::Some`: displays as the inner value and debug-prints as `Some(..)`.
    Some(Box<Value>),
    Bool(bool),
    Number(Number),
    Char(char),
    Str(String),
    Seq(Vec<Value>),
    /// String-keyed entries in a fixed order.
    Map(Vec<(String, Value)>),
    Object(Object),
}

/**
A number, kept at the type it was captured with.

Formatting goes through the original type, so `{x}`, `{x:x}` or `{x:e}` on a captured
`0.1f32` or `-1i8` read exactly as `format!` would print the argument itself.

```rust
use logwrap::{Number, Value};

assert_eq!(Value::from(-1i8), Value::Number(Number::I8(-1)));
assert_eq!(Number::F32(0.1).to_string(), "0.1");
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
}

/// Evaluates `$body` with `$n` bound to the number at its own type.
macro_rules! each_number {
    ($number:expr, $n:ident => $body:expr) => {
        match $number {
            Number::I8($n) => $body,
            Number::I16($n) => $body,
            Number::I32($n) => $body,
            Number::I64($n) => $body,
            Number::I128($n) => $body,
            Number::Isize($n) => $body,
            Number::U8($n) => $body,
            Number::U16($n) => $body,
            Number::U32($n) => $body,
            Number::U64($n) => $body,
            Number::U128($n) => $body,
            Number::Usize($n) => $body,
            Number::F32($n) => $body,
            Number::F64($n) => $body,
        }
    };
}

/// Like `each_number!`, with floats going to `$float`.
macro_rules! each_integer {
    ($number:expr, $n:ident => $body:expr, float => $float:expr) => {
        match $number {
            Number::I8($n) => $body,
            Number::I16($n) => $body,
            Number::I32($n) => $body,
            Number::I64($n) => $body,
            Number::I128($n) => $body,
            Number::Isize($n) => $body,
            Number::U8($n) => $body,
            Number::U16($n) => $body,
            Number::U32($n) => $body,
            Number::U64($n) => $body,
            Number::U128($n) => $body,
            Number::Usize($n) => $body,
            Number::F32(_) | Number::F64(_) => $float,
        }
    };
}

impl Number {
    pub fn is_integer(&self) -> bool {
        !matches!(self, Number::F32(_) | Number::F64(_))
    }

    /// The value as a count, if it is a non-negative integer that fits.
    pub fn to_usize(&self) -> Option<usize> {
        each_integer!(*self, n => usize::try_from(n).ok(), float => None)
    }

    /// The `{:?}` text.
    pub fn debug_text(&self) -> String {
        each_number!(*self, n => format!("{n:?}"))
    }

    /// `{:.p}` or `{:.p?}`.  Integers ignore the precision, as in `format!`.
    pub(crate) fn with_precision(&self, precision: usize, debug: bool) -> String {
        if debug {
            each_number!(*self, n => format!("{n:.precision$?}"))
        } else {
            each_number!(*self, n => format!("{n:.precision$}"))
        }
    }

    /// `{:e}` / `{:E}`, optionally with a precision.
    pub(crate) fn exponent(&self, precision: Option<usize>, upper: bool) -> String {
        match (precision, upper) {
            (Some(p), false) => each_number!(*self, n => format!("{n:.p$e}")),
            (Some(p), true) => each_number!(*self, n => format!("{n:.p$E}")),
            (None, false) => each_number!(*self, n => format!("{n:e}")),
            (None, true) => each_number!(*self, n => format!("{n:E}")),
        }
    }

    /// Digits in the radix named by `kind` (`x`, `X`, `o` or `b`), at the integer's own
    /// width.  `None` for floats.
    pub(crate) fn radix(&self, kind: char) -> Option<String> {
        each_integer!(*self, n => Some(match kind {
            'x' => format!("{n:x}"),
            'X' => format!("{n:X}"),
            'o' => format!("{n:o}"),
            _ => format!("{n:b}"),
        }), float => None)
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        each_number!(*self, n => write!(f, "{n}"))
    }
}

/**
A value with its own display and debug text and, optionally, named fields.

Used for callables, errors, results and any user type that wants `{x.field}` access.

```rust
use logwrap::{Object, Value};

let user = Object::new("alice <alice@example.com>")
    .with_debug("User { id: 7 }")
    .field("id", &7u32)
    .field("name", "alice");
let value = Value::Object(user);
assert_eq!(value.to_string(), "alice <alice@example.com>");
assert_eq!(value.get_field("name"), Some(Value::Str("alice".into())));
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    display: String,
    debug: Option<String>,
    fields: Vec<(Cow<'static, str>, Value)>,
}

impl Object {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            debug: None,
            fields: Vec::new(),
        }
    }

    /// Text used by `{x:?}`.  Defaults to the display text.
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }

    pub fn field<T: Loggable + ?Sized>(mut self, name: impl Into<Cow<'static, str>>, value: &T) -> Self {
        self.fields.push((name.into(), value.to_value()));
        self
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn debug(&self) -> &str {
        self.debug.as_deref().unwrap_or(&self.display)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

impl Value {
    /// Captures any [`Display`] value as text.
    pub fn display<T: Display + ?Sized>(value: &T) -> Self {
        Value::Str(value.to_string())
    }

    /// Captures a value's [`Display`] and [`Debug`] text.
    pub fn described<T: Display + Debug + ?Sized>(value: &T) -> Self {
        Value::Object(Object::new(value.to_string()).with_debug(format!("{value:?}")))
    }

    /// Captures any [`Debug`] value as an object whose display and debug text are both
    /// its `{:?}` form.
    pub fn debug<T: Debug + ?Sized>(value: &T) -> Self {
        Value::Object(Object::new(format!("{value:?}")))
    }

    /// Captures an error: displays as the error's message and exposes the fields
    /// `message`, `type` (the Rust type name of the error) and `sources`, which is empty
    /// here since a plain `Display` has no causes.  See [`Value::error_chain`].
    pub fn error<E: Display + ?Sized>(error: &E) -> Self {
        Self::error_with_sources::<E>(error.to_string(), Vec::new())
    }

    /// Like [`Value::error`], with `sources` holding the messages of the error's
    /// [`source`](std::error::Error::source) chain, outermost first.
    ///
    /// ```rust
    /// use logwrap::Value;
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("bad config")]
    /// struct ConfigError(#[source] std::num::ParseIntError);
    ///
    /// let error = ConfigError("x".parse::<i32>().unwrap_err());
    /// let value = Value::error_chain(&error);
    /// assert_eq!(value.to_string(), "bad config");
    /// assert_eq!(
    ///     value.get_field("sources").unwrap().to_string(),
    ///     r#"["invalid digit found in string"]"#
    /// );
    /// ```
    pub fn error_chain<E: std::error::Error + ?Sized>(error: &E) -> Self {
        let sources = std::iter::successors(error.source(), |source| source.source())
            .map(|source| Value::Str(source.to_string()))
            .collect();
        Self::error_with_sources::<E>(error.to_string(), sources)
    }

    fn error_with_sources<E: ?Sized>(message: String, sources: Vec<Value>) -> Self {
        Value::Object(
            Object::new(message.clone())
                .field("message", &message)
                .field("type", std::any::type_name::<E>())
                .field("sources", &Value::Seq(sources)),
        )
    }

    /// Resolves `.name` on maps and objects.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            Value::Object(object) => object.get(name).cloned(),
            Value::Some(inner) => inner.get_field(name),
            _ => None,
        }
    }

    /// Resolves `[key]`: numeric keys index sequences, other keys behave like fields.
    pub fn get_index(&self, key: &str) -> Option<Value> {
        match self {
            Value::Seq(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned(),
            Value::Some(inner) => inner.get_index(key),
            _ => self.get_field(key),
        }
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// The `{:?}` text; `pretty` selects the multi-line `{:#?}` layout.
    pub fn debug_string(&self, pretty: bool) -> String {
        let mut out = String::new();
        self.write_debug(&mut out, pretty, 0);
        out
    }

    fn write_debug(&self, out: &mut String, pretty: bool, depth: usize) {
        match self {
            Value::Str(s) => {
                let _ = write!(out, "{s:?}");
            }
            Value::Char(c) => {
                let _ = write!(out, "{c:?}");
            }
            Value::Number(n) => out.push_str(&n.debug_text()),
            Value::Some(inner) => {
                out.push_str("Some(");
                if pretty {
                    out.push('\n');
                    out.push_str(&"    ".repeat(depth + 1));
                    inner.write_debug(out, pretty, depth + 1);
                    out.push_str(",\n");
                    out.push_str(&"    ".repeat(depth));
                } else {
                    inner.write_debug(out, pretty, depth);
                }
                out.push(')');
            }
            Value::Object(object) => out.push_str(object.debug()),
            Value::Seq(items) => {
                write_delimited(out, ('[', ']'), items.iter(), pretty, depth, |out, item, depth| {
                    item.write_debug(out, pretty, depth)
                });
            }
            Value::Map(entries) => {
                write_delimited(out, ('{', '}'), entries.iter(), pretty, depth, |out, (key, value), depth| {
                    let _ = write!(out, "{key:?}: ");
                    value.write_debug(out, pretty, depth);
                });
            }
            other => {
                let _ = write!(out, "{other}");
            }
        }
    }
}

fn write_delimited<I, T, F>(
    out: &mut String,
    (open, close): (char, char),
    items: I,
    pretty: bool,
    depth: usize,
    mut write_item: F,
) where
    I: ExactSizeIterator<Item = T>,
    F: FnMut(&mut String, T, usize),
{
    out.push(open);
    let empty = items.len() == 0;
    for (index, item) in items.enumerate() {
        if pretty {
            out.push('\n');
            out.push_str(&"    ".repeat(depth + 1));
        } else if index > 0 {
            out.push_str(", ");
        }
        write_item(out, item, depth + 1);
        if pretty {
            out.push(',');
        }
    }
    if pretty && !empty {
        out.push('\n');
        out.push_str(&"    ".repeat(depth));
    }
    out.push(close);
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Some(inner) => write!(f, "{inner}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Object(object) => f.write_str(object.display()),
            seq_or_map => f.write_str(&seq_or_map.debug_string(false)),
        }
    }
}

/**
Conversion of a Rust value into a template [`Value`].

Implemented for the standard scalar, string, collection and smart-pointer types.  Implement
it for your own types to reference them from templates:

```rust
use logwrap::{Loggable, Object, Value};

struct Order { id: u64, total_cents: i64 }

impl Loggable for Order {
    fn to_value(&self) -> Value {
        Value::Object(
            Object::new(format!("order #{}", self.id))
                .field("id", &self.id)
                .field("total_cents", &self.total_cents),
        )
    }
}
```
*/
pub trait Loggable {
    fn to_value(&self) -> Value;
}

macro_rules! loggable_number {
    ($($variant:ident($t:ty)),*) => {
        $(
            impl Loggable for $t {
                #[inline]
                fn to_value(&self) -> Value {
                    Value::Number(Number::$variant(*self))
                }
            }

            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::$variant(n))
                }
            }
        )*
    };
}

loggable_number!(
    I8(i8), I16(i16), I32(i32), I64(i64), I128(i128), Isize(isize),
    U8(u8), U16(u16), U32(u32), U64(u64), U128(u128), Usize(usize),
    F32(f32), F64(f64)
);

impl Loggable for Number {
    fn to_value(&self) -> Value {
        Value::Number(*self)
    }
}

impl Loggable for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Loggable for char {
    fn to_value(&self) -> Value {
        Value::Char(*self)
    }
}

impl Loggable for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl Loggable for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl Loggable for Cow<'_, str> {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl Loggable for Path {
    fn to_value(&self) -> Value {
        Value::Str(self.display().to_string())
    }
}

impl Loggable for PathBuf {
    fn to_value(&self) -> Value {
        self.as_path().to_value()
    }
}

impl Loggable for Duration {
    fn to_value(&self) -> Value {
        Value::Object(
            Object::new(format!("{self:?}"))
                .field("secs", &self.as_secs())
                .field("millis", &self.as_millis()),
        )
    }
}

impl Loggable for () {
    fn to_value(&self) -> Value {
        Value::None
    }
}

impl Loggable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Loggable for Object {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: Loggable + ?Sized> Loggable for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for &mut T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Arc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Loggable + ?Sized> Loggable for Rc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

/// `Some(v)` displays as `v` and debug-prints as `Some(v)`; `None` is [`Value::None`].
impl<T: Loggable> Loggable for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(value) => Value::Some(Box::new(value.to_value())),
            None => Value::None,
        }
    }
}

/// Displays as `Ok(..)` / `Err(..)`, with an `ok` or `err` field holding the payload.
impl<T: Loggable, E: Display> Loggable for Result<T, E> {
    fn to_value(&self) -> Value {
        match self {
            Ok(value) => {
                let inner = value.to_value();
                Value::Object(
                    Object::new(format!("Ok({inner})"))
                        .with_debug(format!("Ok({})", inner.debug_string(false)))
                        .field("ok", &inner),
                )
            }
            Err(error) => {
                let inner = Value::error(error);
                Value::Object(Object::new(format!("Err({inner})")).field("err", &inner))
            }
        }
    }
}

impl<T: Loggable> Loggable for [T] {
    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Loggable::to_value).collect())
    }
}

impl<T: Loggable, const N: usize> Loggable for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: Loggable> Loggable for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<K: Display, V: Loggable> Loggable for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.to_value()))
                .collect(),
        )
    }
}

/// Entries are sorted by key so that the same map always renders the same way.
impl<K: Display, V: Loggable, S> Loggable for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        let mut entries: Vec<(String, Value)> = self
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars() {
        assert_eq!(5i32.to_value(), Value::Number(Number::I32(5)));
        assert_eq!(5u8.to_value(), Value::from(5u8));
        assert_eq!(true.to_value().to_string(), "true");
        assert_eq!(2.5f64.to_value().to_string(), "2.5");
        assert_eq!("hi".to_value(), Value::Str("hi".into()));
        assert_eq!(Option::<i32>::None.to_value().to_string(), "None");
    }

    #[test]
    fn sequence_display_uses_debug_of_items() {
        let value = vec!["a".to_string(), "b".to_string()].to_value();
        assert_eq!(value.to_string(), r#"["a", "b"]"#);
        assert_eq!(value.get_index("1"), Some(Value::Str("b".into())));
        assert_eq!(value.get_index("2"), None);
    }

    #[test]
    fn hash_map_is_sorted() {
        let mut map = HashMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        let value = map.to_value();
        assert_eq!(value.to_string(), r#"{"alpha": 2, "zeta": 1}"#);
        assert_eq!(value.get_field("zeta"), Some(Value::from(1)));
    }

    #[test]
    fn pretty_debug() {
        let value = vec![1, 2].to_value();
        assert_eq!(value.debug_string(true), "[\n    1,\n    2,\n]");
        assert_eq!(Vec::<i32>::new().to_value().debug_string(true), "[]");
    }

    #[test]
    fn result_exposes_payload() {
        let ok: Result<i32, String> = Ok(10);
        let value = ok.to_value();
        assert_eq!(value.to_string(), "Ok(10)");
        assert_eq!(value.get_field("ok"), Some(Value::from(10)));

        let err: Result<i32, String> = Err("boom".into());
        assert_eq!(err.to_value().to_string(), "Err(boom)");
    }

    #[test]
    fn numbers_keep_their_type() {
        assert_eq!(0.1f32.to_value().to_string(), format!("{}", 0.1f32));
        assert_eq!(0.1f32.to_value().debug_string(false), format!("{:?}", 0.1f32));
        assert_eq!(u128::MAX.to_value().to_string(), u128::MAX.to_string());
        assert_eq!(i128::MIN.to_value().to_string(), i128::MIN.to_string());
        assert_eq!(Number::I32(-1).radix('x').as_deref(), Some("ffffffff"));
        assert_eq!(Number::I8(-1).radix('b').as_deref(), Some("11111111"));
        assert_eq!(Number::F64(1.5).radix('x'), None);
        assert_eq!(Number::I16(-3).to_usize(), None);
        assert_eq!(Number::U128(4).to_usize(), Some(4));
    }

    #[test]
    fn options_debug_print_their_wrapper() {
        let some = Some(5).to_value();
        assert_eq!(some.to_string(), "5");
        assert_eq!(some.debug_string(false), format!("{:?}", Some(5)));
        assert_eq!(some.debug_string(true), format!("{:#?}", Some(5)));
        let nested = Some(vec!["a"]).to_value();
        assert_eq!(nested.debug_string(false), format!("{:?}", Some(vec!["a"])));
        assert_eq!(nested.get_index("0"), Some(Value::Str("a".into())));
    }

    #[test]
    fn long_durations_do_not_truncate() {
        let value = Duration::MAX.to_value();
        assert_eq!(value.get_field("millis"), Some(Value::from(Duration::MAX.as_millis())));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("could not read the port")]
    struct PortError(#[source] std::num::ParseIntError);

    #[test]
    fn error_chains_list_their_sources() {
        let inner = "x".parse::<i32>().unwrap_err();
        let value = Value::error_chain(&PortError(inner.clone()));
        assert_eq!(value.to_string(), "could not read the port");
        assert_eq!(
            value.get_field("sources"),
            Some(Value::Seq(vec![Value::Str(inner.to_string())]))
        );
        assert_eq!(Value::error("plain").get_field("sources"), Some(Value::Seq(vec![])));
    }

    #[test]
    fn error_fields() {
        let error = "x".parse::<i32>().unwrap_err();
        let value = Value::error(&error);
        assert_eq!(value.to_string(), "invalid digit found in string");
        match value.get_field("type") {
            Some(Value::Str(name)) => assert!(name.ends_with("ParseIntError")),
            other => panic!("unexpected type field {other:?}"),
        }
    }
}
