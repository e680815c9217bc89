// SPDX-License-Identifier: MIT OR Apache-2.0

//! Format specs: the part after `:` in a placeholder.
//!
//! The grammar is Rust's own,
//!
//! ```text
//! [[fill]align][sign]['#']['0'][width]['.' precision][type]
//! ```
//!
//! applied to a [`Value`] at render time instead of to a typed argument at compile time.

use crate::context::Context;
use crate::error::TemplateError;
use crate::value::{Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Count {
    Is(usize),
    /// `name$`
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Display,
    Debug,
    LowerHexDebug,
    UpperHexDebug,
    LowerHex,
    UpperHex,
    Octal,
    Binary,
    LowerExp,
    UpperExp,
}

impl Kind {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" => Kind::Display,
            "?" => Kind::Debug,
            "x?" => Kind::LowerHexDebug,
            "X?" => Kind::UpperHexDebug,
            "x" => Kind::LowerHex,
            "X" => Kind::UpperHex,
            "o" => Kind::Octal,
            "b" => Kind::Binary,
            "e" => Kind::LowerExp,
            "E" => Kind::UpperExp,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormatSpec {
    raw: String,
    fill: char,
    align: Option<Align>,
    plus: bool,
    alternate: bool,
    zero: bool,
    width: Option<Count>,
    precision: Option<Count>,
    kind: Kind,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            raw: String::new(),
            fill: ' ',
            align: None,
            plus: false,
            alternate: false,
            zero: false,
            width: None,
            precision: None,
            kind: Kind::Display,
        }
    }
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '^' => Some(Align::Center),
        '>' => Some(Align::Right),
        _ => None,
    }
}

/// Cursor over the characters of one spec.
struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    raw: &'a str,
}

impl Scanner<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// A count: digits, or an identifier followed by `$`.  Leaves the cursor untouched
    /// when neither is present.
    fn count(&mut self) -> Result<Option<Count>, String> {
        let start = self.pos;
        let digits: String = self.chars[self.pos..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            self.pos += digits.chars().count();
            if self.peek() == Some('$') {
                return Err(format!(
                    "`{digits}$` refers to a positional argument; use `name$`"
                ));
            }
            return digits
                .parse()
                .map(|n| Some(Count::Is(n)))
                .map_err(|_| format!("count `{digits}` is too large"));
        }
        let ident: String = self.chars[self.pos..]
            .iter()
            .take_while(|c| c.is_alphanumeric() || **c == '_')
            .collect();
        if !ident.is_empty() {
            self.pos += ident.chars().count();
            if self.eat('$') {
                return Ok(Some(Count::Named(ident)));
            }
        }
        self.pos = start;
        Ok(None)
    }
}

impl FormatSpec {
    /// Parses the text after `:`.  The error is a human-readable reason.
    pub(crate) fn parse(raw: &str) -> Result<Self, String> {
        let mut spec = FormatSpec {
            raw: raw.to_string(),
            ..FormatSpec::default()
        };
        let mut s = Scanner {
            chars: raw.chars().collect(),
            pos: 0,
            raw,
        };

        if let Some(align) = s.peek_at(1).and_then(align_of) {
            spec.fill = s.chars[0];
            spec.align = Some(align);
            s.pos = 2;
        } else if let Some(align) = s.peek().and_then(align_of) {
            spec.align = Some(align);
            s.pos = 1;
        }

        if s.eat('+') {
            spec.plus = true;
        } else {
            s.eat('-');
        }
        spec.alternate = s.eat('#');
        if s.peek() == Some('0') && s.peek_at(1) != Some('$') {
            spec.zero = true;
            s.pos += 1;
        }
        spec.width = s.count()?;
        if s.eat('.') {
            if s.peek() == Some('*') {
                return Err("`.*` precision is not supported; use `.name$`".to_string());
            }
            spec.precision = Some(s.count()?.ok_or("expected a precision after `.`")?);
        }

        let suffix = s.rest();
        spec.kind = Kind::from_suffix(&suffix)
            .ok_or_else(|| format!("unknown format type `{suffix}` in `{}`", s.raw))?;
        Ok(spec)
    }

    /// Names referenced through `name$` counts.
    pub(crate) fn count_names(&self) -> impl Iterator<Item = &str> {
        [&self.width, &self.precision]
            .into_iter()
            .filter_map(|count| match count {
                Some(Count::Named(name)) => Some(name.as_str()),
                _ => None,
            })
    }

    fn resolve(&self, count: &Option<Count>, field: &str, ctx: &Context) -> Result<Option<usize>, TemplateError> {
        match count {
            None => Ok(None),
            Some(Count::Is(n)) => Ok(Some(*n)),
            Some(Count::Named(name)) => {
                let value = ctx.get(name).ok_or_else(|| TemplateError::MissingName {
                    name: name.clone(),
                })?;
                let n = match value {
                    Value::Number(n) => n.to_usize(),
                    _ => None,
                };
                n.map(Some).ok_or_else(|| {
                    self.invalid(field, format!("`{name}$` must be a non-negative integer, got `{value}`"))
                })
            }
        }
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> TemplateError {
        TemplateError::InvalidSpec {
            field: field.to_string(),
            spec: self.raw.clone(),
            reason: reason.into(),
        }
    }

    /// Formats `value`.  `field` names the placeholder in errors.
    pub(crate) fn apply(&self, value: &Value, field: &str, ctx: &Context) -> Result<String, TemplateError> {
        let width = self.resolve(&self.width, field, ctx)?;
        let precision = self.resolve(&self.precision, field, ctx)?;

        // only debug output shows the `Some(..)` wrapper
        let value = match (self.kind, value) {
            (Kind::Debug | Kind::LowerHexDebug | Kind::UpperHexDebug, _) => value,
            (_, Value::Some(inner)) => inner,
            _ => value,
        };
        let (prefix, body) = self.body(value, precision, field)?;
        let numeric = value.is_numeric();
        let sign = if numeric && self.plus && !body.starts_with('-') {
            "+"
        } else {
            ""
        };
        let (sign, body) = match body.strip_prefix('-') {
            Some(rest) if numeric => ("-", rest.to_string()),
            _ => (sign, body),
        };

        let len = sign.chars().count() + prefix.chars().count() + body.chars().count();
        let pad = width.map_or(0, |width| width.saturating_sub(len));

        if self.zero && numeric {
            return Ok(format!("{sign}{prefix}{}{body}", "0".repeat(pad)));
        }

        let default_align = if numeric { Align::Right } else { Align::Left };
        let (before, after) = match self.align.unwrap_or(default_align) {
            Align::Left => (0, pad),
            Align::Right => (pad, 0),
            Align::Center => (pad / 2, pad - pad / 2),
        };
        let fill = |n: usize| std::iter::repeat_n(self.fill, n).collect::<String>();
        Ok(format!("{}{sign}{prefix}{body}{}", fill(before), fill(after)))
    }

    /// The formatted value without sign handling or padding, split into a radix prefix and
    /// the rest.
    fn body(&self, value: &Value, precision: Option<usize>, field: &str) -> Result<(&'static str, String), TemplateError> {
        let body = match self.kind {
            Kind::Display => match (value, precision) {
                (Value::Number(n), Some(p)) => n.with_precision(p, false),
                (_, None) => value.to_string(),
                (other, Some(p)) => other.to_string().chars().take(p).collect(),
            },
            Kind::Debug => match (value, precision) {
                (Value::Number(n), Some(p)) => n.with_precision(p, true),
                _ => value.debug_string(self.alternate),
            },
            Kind::LowerHexDebug | Kind::UpperHexDebug => {
                hex_debug(value, self.kind == Kind::UpperHexDebug).debug_string(self.alternate)
            }
            Kind::LowerHex | Kind::UpperHex | Kind::Octal | Kind::Binary => {
                let (prefix, digits) = self.radix(value).ok_or_else(|| {
                    self.invalid(field, format!("`{value}` is not an integer"))
                })?;
                return Ok((if self.alternate { prefix } else { "" }, digits));
            }
            Kind::LowerExp | Kind::UpperExp => match value {
                Value::Number(n) => n.exponent(precision, self.kind == Kind::UpperExp),
                _ => return Err(self.invalid(field, format!("`{value}` is not a number"))),
            },
        };
        Ok(("", body))
    }

    fn radix(&self, value: &Value) -> Option<(&'static str, String)> {
        let Value::Number(n) = value else {
            return None;
        };
        let (prefix, kind) = match self.kind {
            Kind::LowerHex => ("0x", 'x'),
            Kind::UpperHex => ("0x", 'X'),
            Kind::Octal => ("0o", 'o'),
            _ => ("0b", 'b'),
        };
        n.radix(kind).map(|digits| (prefix, digits))
    }
}

/// Rewrites integers (at any depth) so their debug text is hexadecimal.
fn hex_debug(value: &Value, upper: bool) -> Value {
    let hex = |text: String| Value::Object(Object::new(text.clone()).with_debug(text));
    match value {
        Value::Number(n) => match n.radix(if upper { 'X' } else { 'x' }) {
            Some(digits) => hex(digits),
            None => value.clone(),
        },
        Value::Some(inner) => Value::Some(Box::new(hex_debug(inner, upper))),
        Value::Seq(items) => Value::Seq(items.iter().map(|item| hex_debug(item, upper)).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), hex_debug(item, upper)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Loggable;

    fn fmt<T: Loggable + ?Sized>(spec: &str, value: &T) -> String {
        FormatSpec::parse(spec)
            .unwrap()
            .apply(&value.to_value(), "x", &Context::new())
            .unwrap()
    }

    #[test]
    fn parses_full_grammar() {
        let spec = FormatSpec::parse("*^+#010.3e").unwrap();
        assert_eq!(spec.fill, '*');
        assert_eq!(spec.align, Some(Align::Center));
        assert!(spec.plus && spec.alternate && spec.zero);
        assert_eq!(spec.width, Some(Count::Is(10)));
        assert_eq!(spec.precision, Some(Count::Is(3)));
        assert_eq!(spec.kind, Kind::LowerExp);
    }

    #[test]
    fn named_counts() {
        let spec = FormatSpec::parse("w$.p$").unwrap();
        assert_eq!(spec.count_names().collect::<Vec<_>>(), ["w", "p"]);
        // `x` alone is a type, not a count
        assert_eq!(FormatSpec::parse("x").unwrap().width, None);
    }

    #[test]
    fn rejects_bad_specs() {
        assert!(FormatSpec::parse("q").is_err());
        assert!(FormatSpec::parse("1$").is_err());
        assert!(FormatSpec::parse(".*").is_err());
        assert!(FormatSpec::parse(".").is_err());
    }

    #[test]
    fn alignment_matches_format() {
        assert_eq!(fmt(">5", "ab"), format!("{:>5}", "ab"));
        assert_eq!(fmt("5", "ab"), format!("{:5}", "ab"));
        assert_eq!(fmt("5", &42), format!("{:5}", 42));
        assert_eq!(fmt("-^6", "ab"), format!("{:-^6}", "ab"));
        assert_eq!(fmt("^5", "ab"), format!("{:^5}", "ab"));
    }

    #[test]
    fn numbers_match_format() {
        assert_eq!(fmt("+", &5), format!("{:+}", 5));
        assert_eq!(fmt("05", &-42), format!("{:05}", -42));
        assert_eq!(fmt("#010x", &255), format!("{:#010x}", 255));
        assert_eq!(fmt("X", &255u64), format!("{:X}", 255u64));
        assert_eq!(fmt("#b", &5), format!("{:#b}", 5));
        assert_eq!(fmt("o", &8), format!("{:o}", 8));
        assert_eq!(fmt(".2", &1.23456), format!("{:.2}", 1.23456));
        assert_eq!(fmt("+08.2", &1.23456), format!("{:+08.2}", 1.23456));
        assert_eq!(fmt("e", &1234.5), format!("{:e}", 1234.5));
        assert_eq!(fmt("E", &1500), format!("{:E}", 1500));
        assert_eq!(fmt(".3", &7), "7");
    }

    #[test]
    fn numbers_format_at_their_own_type() {
        assert_eq!(fmt("", &0.1f32), format!("{}", 0.1f32));
        assert_eq!(fmt(".3?", &0.1f32), format!("{:.3?}", 0.1f32));
        assert_eq!(fmt("e", &0.1f32), format!("{:e}", 0.1f32));
        assert_eq!(fmt("x", &-1i32), format!("{:x}", -1i32));
        assert_eq!(fmt("#o", &-1i16), format!("{:#o}", -1i16));
        assert_eq!(fmt("b", &-2i8), format!("{:b}", -2i8));
        assert_eq!(fmt("x?", &[-1i32]), format!("{:x?}", [-1i32]));
        assert_eq!(fmt(">40", &u128::MAX), format!("{:>40}", u128::MAX));
    }

    #[test]
    fn options_show_their_wrapper_only_when_debug_printed() {
        assert_eq!(fmt("?", &Some(5)), format!("{:?}", Some(5)));
        assert_eq!(fmt("#?", &Some(5)), format!("{:#?}", Some(5)));
        assert_eq!(fmt("x?", &Some(255)), format!("{:x?}", Some(255)));
        assert_eq!(fmt("05", &Some(5)), format!("{:05}", 5));
        assert_eq!(fmt("?", &None::<i32>), format!("{:?}", None::<i32>));
    }

    #[test]
    fn text_precision_truncates() {
        assert_eq!(fmt(".3", "abcdef"), format!("{:.3}", "abcdef"));
        assert_eq!(fmt("05", "ab"), "ab   ");
    }

    #[test]
    fn debug_kinds() {
        assert_eq!(fmt("?", "hi"), format!("{:?}", "hi"));
        let seq = [10, 255];
        assert_eq!(fmt("?", &seq), format!("{:?}", seq));
        assert_eq!(fmt("x?", &seq), format!("{:x?}", seq));
        assert_eq!(fmt("X?", &seq), format!("{:X?}", seq));
        assert_eq!(fmt("#?", &seq), format!("{:#?}", seq));
    }

    #[test]
    fn inapplicable_kinds_fail() {
        let spec = FormatSpec::parse("x").unwrap();
        let err = spec
            .apply(&Value::Str("ab".into()), "name", &Context::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidSpec { ref field, .. } if field == "name"));

        let spec = FormatSpec::parse("e").unwrap();
        assert!(spec.apply(&Value::Bool(true), "b", &Context::new()).is_err());
    }

    #[test]
    fn named_counts_resolve_from_context() {
        let spec = FormatSpec::parse(">w$.p$").unwrap();
        let ctx = Context::new().with("w", &8).with("p", &1);
        assert_eq!(spec.apply(&Value::from(2.25), "v", &ctx).unwrap(), format!("{:>8.1}", 2.25));

        let missing = spec.apply(&Value::from(2.25), "v", &Context::new()).unwrap_err();
        assert_eq!(missing, TemplateError::MissingName { name: "w".into() });

        let negative = Context::new().with("w", &-1).with("p", &1);
        assert!(matches!(
            spec.apply(&Value::from(2.25), "v", &negative),
            Err(TemplateError::InvalidSpec { .. })
        ));
    }
}
