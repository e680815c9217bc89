// SPDX-License-Identifier: MIT OR Apache-2.0

//! The invocation context and how it is built.
//!
//! Every call of a decorated function gets a fresh [`Context`]: an ordered mapping from
//! placeholder names to captured [`Value`]s.  The attribute macros build it directly from the
//! function's parameters.  Callers that only know their arguments at run time describe the
//! callable with a [`Signature`] and bind [`Arguments`] against it, the same way a positional
//! and keyword call would be matched to a parameter list.

use crate::error::BindError;
use crate::value::{Loggable, Object, Value};
use std::borrow::Cow;
use std::fmt::Display;

/**
Static identity of a decorated callable.

Templates see it under the callable placeholder (`{callable}` by default), where it displays as
`module::name` and exposes the fields `name`, `module` and `path`.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    module: &'static str,
    name: &'static str,
}

impl CallSite {
    pub const fn new(module: &'static str, name: &'static str) -> Self {
        Self { module, name }
    }

    /// The `module_path!()` of the callable; also the target of its records.
    pub const fn module(&self) -> &'static str {
        self.module
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

impl Loggable for CallSite {
    fn to_value(&self) -> Value {
        let path = self.to_string();
        Value::Object(
            Object::new(path.clone())
                .with_debug(format!("fn {path}"))
                .field("name", self.name)
                .field("module", self.module)
                .field("path", &path),
        )
    }
}

/**
The invocation context: placeholder names mapped to captured values, in insertion order.

```rust
use logwrap::{Context, Value};

let ctx = Context::new().with("x", &5).with("name", "alice").with("x", &6);
assert_eq!(ctx.get("x"), Some(&Value::from(6)));
assert_eq!(ctx.names().collect::<Vec<_>>(), ["x", "name"]);
```
*/
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Vec<(Cow<'static, str>, Value)>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `value` under `name`, replacing an existing entry in place.
    pub fn with<T: Loggable + ?Sized>(mut self, name: impl Into<Cow<'static, str>>, value: &T) -> Self {
        self.insert(name, value.to_value());
        self
    }

    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a [`Param`] accepts arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Filled by position or by keyword.
    Positional,
    /// Collects surplus positional arguments into a sequence.
    VarPositional,
    /// Filled only by keyword.
    KeywordOnly,
    /// Collects unknown keyword arguments into a map.
    VarKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: Cow<'static, str>,
    kind: ParamKind,
    default: Option<Value>,
}

impl Param {
    pub fn positional(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of_kind(name, ParamKind::Positional)
    }

    pub fn var_positional(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of_kind(name, ParamKind::VarPositional)
    }

    pub fn keyword_only(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of_kind(name, ParamKind::KeywordOnly)
    }

    pub fn var_keyword(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of_kind(name, ParamKind::VarKeyword)
    }

    fn of_kind(name: impl Into<Cow<'static, str>>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Value bound when the caller does not supply this parameter.
    pub fn with_default<T: Loggable + ?Sized>(mut self, value: &T) -> Self {
        self.default = Some(value.to_value());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// Arguments as supplied by a caller: positional values in order, then keyword values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg<T: Loggable + ?Sized>(mut self, value: &T) -> Self {
        self.positional.push(value.to_value());
        self
    }

    pub fn kwarg<T: Loggable + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.keyword.push((name.into(), value.to_value()));
        self
    }
}

/**
A declared parameter list.

```rust
use logwrap::{Arguments, Param, Signature, Value};

// fn greet(name, greeting="hello", *rest, loud, **extra)
let signature = Signature::new([
    Param::positional("name"),
    Param::positional("greeting").with_default("hello"),
    Param::var_positional("rest"),
    Param::keyword_only("loud"),
    Param::var_keyword("extra"),
]);

let ctx = signature
    .bind(Arguments::new().arg("bob").kwarg("loud", &true).kwarg("mood", "calm"))
    .unwrap();
assert_eq!(ctx.get("greeting"), Some(&Value::Str("hello".into())));
assert_eq!(ctx.get("rest"), Some(&Value::Seq(vec![])));
assert_eq!(ctx.get("extra").unwrap().to_string(), r#"{"mood": "calm"}"#);
```
*/
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /**
    Binds `arguments` to the declared parameters.

    Positional values fill positional parameters in declaration order; surplus values go to
    the variadic positional parameter.  Keyword values fill parameters by name; unknown
    names go to the variadic keyword parameter.  Parameters left unfilled take their
    default, or are left out when they have none.  The context lists parameters in
    declaration order.
    */
    pub fn bind(&self, arguments: Arguments) -> Result<Context, BindError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        let mut surplus = Vec::new();
        let mut extra_keywords = Vec::new();

        let mut positional_slots = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, param)| param.kind == ParamKind::Positional)
            .map(|(index, _)| index);
        let accepted = self
            .params
            .iter()
            .filter(|param| param.kind == ParamKind::Positional)
            .count();
        let given = arguments.positional.len();
        for value in arguments.positional {
            match positional_slots.next() {
                Some(index) => slots[index] = Some(value),
                None => surplus.push(value),
            }
        }

        let var_positional = self.index_of_kind(ParamKind::VarPositional);
        let var_keyword = self.index_of_kind(ParamKind::VarKeyword);

        if !surplus.is_empty() && var_positional.is_none() {
            return Err(BindError::TooManyPositional { accepted, given });
        }

        for (name, value) in arguments.keyword {
            let declared = self.params.iter().position(|param| {
                param.name == name.as_str()
                    && matches!(param.kind, ParamKind::Positional | ParamKind::KeywordOnly)
            });
            match declared {
                Some(index) if slots[index].is_some() => {
                    return Err(BindError::MultipleValues { name });
                }
                Some(index) => slots[index] = Some(value),
                None if var_keyword.is_some() => {
                    if extra_keywords.iter().any(|(existing, _)| *existing == name) {
                        return Err(BindError::MultipleValues { name });
                    }
                    extra_keywords.push((name, value));
                }
                None => return Err(BindError::UnexpectedKeyword { name }),
            }
        }

        if let Some(index) = var_positional {
            slots[index] = Some(Value::Seq(surplus));
        }
        if let Some(index) = var_keyword {
            slots[index] = Some(Value::Map(extra_keywords));
        }

        let mut context = Context::new();
        for (param, slot) in self.params.iter().zip(slots) {
            if let Some(value) = slot.or_else(|| param.default.clone()) {
                context.insert(param.name.clone(), value);
            }
        }
        Ok(context)
    }

    fn index_of_kind(&self, kind: ParamKind) -> Option<usize> {
        self.params.iter().position(|param| param.kind == kind)
    }
}
