// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Message templates.

A [`Template`] is literal text with named placeholders, rendered against an invocation
[`Context`]:

```text
start {x}                   the value of `x`
{user.name} / {items[0]}    field and index accessors
{total:>10.2}               a Rust format spec
{{ and }}                   literal braces
```

Every placeholder must be named; `{}` and `{0}` are rejected.  The template is parsed once
when it is constructed.  A template that fails to parse still constructs: the failure is kept
and returned from every [`render`](Template::render), so a misconfigured decorator surfaces
its problem at call time like any other template error.
*/

mod spec;

use crate::context::Context;
use crate::error::TemplateError;
use crate::value::Value;
use spec::FormatSpec;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor {
    /// `.name`
    Field(String),
    /// `[key]`
    Index(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    /// The field expression as written, e.g. `user.name`.
    field: String,
    name: String,
    accessors: Vec<Accessor>,
    spec: FormatSpec,
}

impl Placeholder {
    fn resolve(&self, ctx: &Context) -> Result<Value, TemplateError> {
        let mut value = ctx
            .get(&self.name)
            .cloned()
            .ok_or_else(|| TemplateError::MissingName {
                name: self.name.clone(),
            })?;
        for accessor in &self.accessors {
            let next = match accessor {
                Accessor::Field(name) => value.get_field(name),
                Accessor::Index(key) => value.get_index(key),
            };
            value = next.ok_or_else(|| TemplateError::MissingField {
                field: self.field.clone(),
            })?;
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/**
A parsed message template.

```rust
use logwrap::{Context, Template};

let template = Template::new("{callable} took {ms:>5}ms for {items[0]}");
let ctx = Context::new()
    .with("callable", "jobs::import")
    .with("ms", &42)
    .with("items", &vec!["a.csv", "b.csv"]);
assert_eq!(template.render(&ctx).unwrap(), "jobs::import took    42ms for a.csv");
```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parsed: Result<Vec<Segment>, TemplateError>,
}

impl Template {
    /// Parses `source`, keeping any parse error for [`render`](Self::render).
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = parse(&source);
        Template { source, parsed }
    }

    /// Parses `source`, failing immediately on a malformed template.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let template = Self::new(source);
        match &template.parsed {
            Ok(_) => Ok(template),
            Err(error) => Err(error.clone()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parse error, if the template is malformed.
    pub fn error(&self) -> Option<&TemplateError> {
        self.parsed.as_ref().err()
    }

    /// Top-level context names the template reads: placeholder names and `name$` counts,
    /// in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in self.parsed.iter().flatten() {
            if let Segment::Placeholder(placeholder) = segment {
                let referenced = std::iter::once(placeholder.name.as_str())
                    .chain(placeholder.spec.count_names());
                for name in referenced {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Substitutes `ctx` into the template.
    ///
    /// Pure: the same template and context always produce the same result.
    pub fn render(&self, ctx: &Context) -> Result<String, TemplateError> {
        let segments = self.parsed.as_ref().map_err(Clone::clone)?;
        let mut out = String::with_capacity(self.source.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = placeholder.resolve(ctx)?;
                    out.push_str(&placeholder.spec.apply(&value, &placeholder.field, ctx)?);
                }
            }
        }
        Ok(out)
    }
}

impl From<&str> for Template {
    fn from(source: &str) -> Self {
        Template::new(source)
    }
}

impl From<String> for Template {
    fn from(source: String) -> Self {
        Template::new(source)
    }
}

impl Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn malformed(position: usize, reason: &'static str) -> TemplateError {
    TemplateError::Malformed { position, reason }
}

fn parse(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|(_, next)| *next) == Some('{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().map(|(_, next)| *next) == Some('}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(malformed(position, "unmatched `}`")),
            '{' => {
                let start = position + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some((nested, '{')) => {
                            return Err(malformed(nested, "`{` inside a placeholder"));
                        }
                        Some(_) => {}
                        None => return Err(malformed(position, "unclosed `{`")),
                    }
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(parse_placeholder(
                    &source[start..end],
                    start,
                )?));
            }
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses the inside of `{...}`; `offset` is its byte position in the template.
fn parse_placeholder(inner: &str, offset: usize) -> Result<Placeholder, TemplateError> {
    // the first `:` outside brackets separates the spec
    let mut depth = 0usize;
    let split = inner.char_indices().find_map(|(i, c)| {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(i),
            _ => {}
        }
        None
    });
    let (field, raw_spec) = match split {
        Some(i) => (&inner[..i], &inner[i + 1..]),
        None => (inner, ""),
    };
    let field = field.trim();

    let name_end = field.find(['.', '[']).unwrap_or(field.len());
    let name = &field[..name_end];
    if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
        return Err(TemplateError::Positional {
            placeholder: inner.to_string(),
        });
    }
    if !is_name(name) {
        return Err(malformed(offset, "placeholder name is not an identifier"));
    }

    let mut accessors = Vec::new();
    let mut rest = &field[name_end..];
    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let attr = &after_dot[..end];
            if !is_name(attr) && !attr.chars().all(|c| c.is_ascii_digit()) || attr.is_empty() {
                return Err(malformed(offset, "expected a field name after `.`"));
            }
            accessors.push(Accessor::Field(attr.to_string()));
            rest = &after_dot[end..];
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let end = after_bracket
                .find(']')
                .ok_or_else(|| malformed(offset, "unclosed `[`"))?;
            if end == 0 {
                return Err(malformed(offset, "empty `[]` accessor"));
            }
            accessors.push(Accessor::Index(after_bracket[..end].to_string()));
            rest = &after_bracket[end + 1..];
        } else {
            return Err(malformed(offset, "expected `.` or `[` after a field"));
        }
    }

    let spec = FormatSpec::parse(raw_spec).map_err(|reason| TemplateError::InvalidSpec {
        field: field.to_string(),
        spec: raw_spec.to_string(),
        reason,
    })?;

    Ok(Placeholder {
        field: field.to_string(),
        name: name.to_string(),
        accessors,
        spec,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;
    use std::collections::HashMap;

    #[test]
    fn substitutes_arguments() {
        let ctx = Context::new().with("x", &5);
        assert_eq!(Template::new("start {x}").render(&ctx).unwrap(), "start 5");
    }

    #[test]
    fn argument_round_trip() {
        for value in ["plain", "with {braces}", "", "üñí"] {
            let ctx = Context::new().with("arg", value);
            assert_eq!(Template::new("{arg}").render(&ctx).unwrap(), value);
        }
    }

    #[test]
    fn escaped_braces() {
        let ctx = Context::new().with("x", &1);
        assert_eq!(
            Template::new("{{x}} = {x} }}").render(&ctx).unwrap(),
            "{x} = 1 }"
        );
    }

    #[test]
    fn missing_name() {
        let template = Template::new("{missing}");
        assert_eq!(
            template.render(&Context::new()),
            Err(TemplateError::MissingName {
                name: "missing".into()
            })
        );
    }

    #[test]
    fn accessors() {
        let user = Object::new("alice").field("name", "alice").field("tags", &["a", "b"]);
        let mut map = HashMap::new();
        map.insert("key", 3);
        let ctx = Context::new()
            .with("user", &user)
            .with("map", &map)
            .with("items", &vec![10, 20]);
        let template = Template::new("{user.name} {user.tags[1]} {map[key]} {map.key} {items[1]}");
        assert_eq!(template.render(&ctx).unwrap(), "alice b 3 3 20");

        assert_eq!(
            Template::new("{user.age}").render(&ctx),
            Err(TemplateError::MissingField {
                field: "user.age".into()
            })
        );
        assert_eq!(
            Template::new("{items[5]}").render(&ctx),
            Err(TemplateError::MissingField {
                field: "items[5]".into()
            })
        );
    }

    #[test]
    fn specs_apply() {
        let ctx = Context::new()
            .with("name", "ab")
            .with("n", &255)
            .with("f", &2.5f64)
            .with("w", &6);
        let template = Template::new("[{name:>4}] [{n:#x}] [{f:.3}] [{name:*^w$}]");
        assert_eq!(template.render(&ctx).unwrap(), "[  ab] [0xff] [2.500] [**ab**]");
    }

    #[test]
    fn malformed_templates_fail_on_every_render() {
        for source in ["{", "}", "{x", "{a{b}}", "{x.}", "{x[}"] {
            let template = Template::new(source);
            assert!(
                matches!(template.error(), Some(TemplateError::Malformed { .. })),
                "{source}: {:?}",
                template.error()
            );
            let ctx = Context::new().with("x", &1);
            assert!(template.render(&ctx).is_err());
            assert!(template.render(&ctx).is_err());
            assert!(Template::parse(source).is_err());
        }
    }

    #[test]
    fn positional_placeholders_are_rejected() {
        for source in ["{}", "{0}", "{:>3}"] {
            assert!(matches!(
                Template::new(source).error(),
                Some(TemplateError::Positional { .. })
            ));
        }
    }

    #[test]
    fn bad_spec_is_reported_with_its_field() {
        assert_eq!(
            Template::new("{x:q}").error(),
            Some(&TemplateError::InvalidSpec {
                field: "x".into(),
                spec: "q".into(),
                reason: "unknown format type `q` in `q`".into(),
            })
        );
    }

    #[test]
    fn names_include_counts() {
        let template = Template::new("{a} {b.c:w$.p$} {a}");
        assert_eq!(template.names(), ["a", "b", "w", "p"]);
    }

    #[test]
    fn rendering_is_idempotent() {
        let mut map = HashMap::new();
        for i in 0..16 {
            map.insert(format!("k{i}"), i);
        }
        let ctx = Context::new().with("map", &map).with("x", &1.5);
        let template = Template::new("{map} {map:?} {x:+.1}");
        let first = template.render(&ctx).unwrap();
        assert_eq!(template.render(&ctx).unwrap(), first);

        let rebuilt = Context::new().with("map", &map.clone()).with("x", &1.5);
        assert_eq!(template.render(&rebuilt).unwrap(), first);
    }
}
