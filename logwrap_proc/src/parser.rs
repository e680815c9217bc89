//SPDX-License-Identifier: MIT OR Apache-2.0

use proc_macro::{Delimiter, Spacing, TokenStream, TokenTree};

/// One comma-separated attribute argument.
pub enum Arg {
    /// An argument without a key, e.g. the level or the template.
    Positional(Vec<TokenTree>),
    /// `key = value`
    Named(String, Vec<TokenTree>),
}

/// Splits attribute arguments at top-level commas.
///
/// Commas nested in groups (`[A, B]`, `(a, b)`, `{ .. }`) do not split; an expression with a
/// top-level comma, such as a closure with two parameters, has to be parenthesized.
///
/// # Examples
/// ```ignore
/// # // ignore because: This shows pseudo-code for token stream parsing, not actual runnable code
/// // For input: `Level::Info, "start {x}", on_errors = [A, B]`
/// // Returns: [Positional(Level::Info), Positional("start {x}"), Named("on_errors", [A, B])]
/// ```
pub fn split_args(attr: TokenStream) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut current: Vec<TokenTree> = Vec::new();
    for token in attr {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(classify(std::mem::take(&mut current)));
                }
            }
            _ => current.push(token),
        }
    }
    if !current.is_empty() {
        args.push(classify(current));
    }
    args
}

fn classify(tokens: Vec<TokenTree>) -> Arg {
    let is_named = matches!(
        (tokens.first(), tokens.get(1)),
        (Some(TokenTree::Ident(_)), Some(TokenTree::Punct(p)))
            if p.as_char() == '=' && p.spacing() == Spacing::Alone
    );
    if is_named {
        let mut tokens = tokens.into_iter();
        let key = tokens.next().map(|key| key.to_string()).unwrap_or_default();
        tokens.next();
        Arg::Named(key, tokens.collect())
    } else {
        Arg::Positional(tokens)
    }
}

/// Renders tokens back into source text.
pub fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// The value of a string literal token, or `None` if the tokens are not a single string
/// literal.
///
/// Escapes are resolved far enough for placeholder scanning: `\u{..}` becomes a single
/// character so that its braces are not mistaken for a placeholder.
pub fn string_literal(tokens: &[TokenTree]) -> Option<String> {
    let [TokenTree::Literal(literal)] = tokens else {
        return None;
    };
    let text = literal.to_string();
    if let Some(raw) = text.strip_prefix('r') {
        let hashes = raw.chars().take_while(|c| *c == '#').count();
        let inner = raw.get(hashes..raw.len().checked_sub(hashes)?)?;
        return inner
            .strip_prefix('"')
            .and_then(|inner| inner.strip_suffix('"'))
            .map(str::to_string);
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
                out.push('\u{fffd}');
            }
            Some('x') => {
                chars.next();
                chars.next();
                out.push('\u{fffd}');
            }
            Some('\n') => {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}

/// The items of a bracketed list such as `[ParseIntError, io::Error]`, as source text.
pub fn bracket_list(tokens: &[TokenTree]) -> Option<Vec<String>> {
    let [TokenTree::Group(group)] = tokens else {
        return None;
    };
    if group.delimiter() != Delimiter::Bracket {
        return None;
    }
    let items = split_args(group.stream())
        .into_iter()
        .map(|arg| match arg {
            Arg::Positional(tokens) => tokens_to_string(&tokens),
            Arg::Named(key, tokens) => format!("{key} = {}", tokens_to_string(&tokens)),
        })
        .collect();
    Some(items)
}

/// The top-level context names a template reads: placeholder names and `name$` counts.
///
/// Mirrors the runtime template grammar far enough to find names.  Accessors and specs are
/// otherwise left to the runtime, which reports their errors when the message is rendered.
///
/// # Examples
/// ```ignore
/// # // ignore because: This shows pseudo-code for template scanning, not actual runnable code
/// // For input: "{{literal}} {user.name} {total:>w$.2}"
/// // Returns: Ok(["user", "total", "w"])
/// ```
pub fn placeholder_names(template: &str) -> Result<Vec<String>, String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !names.contains(&name) {
            names.push(name);
        }
    };
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
            }
            '}' => return Err("unmatched `}` in template; write `}}` for a literal brace".to_string()),
            '{' => {
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err("`{` inside a template placeholder".to_string()),
                        Some(c) => inner.push(c),
                        None => {
                            return Err("unclosed `{` in template; write `{{` for a literal brace".to_string());
                        }
                    }
                }
                let (field, spec) = split_spec(&inner);
                let name: String = field
                    .trim()
                    .chars()
                    .take_while(|c| *c != '.' && *c != '[')
                    .collect();
                if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
                    return Err(format!(
                        "placeholder `{{{inner}}}` is positional; template placeholders must be named"
                    ));
                }
                push(name);
                for count in counts(spec) {
                    push(count);
                }
            }
            _ => {}
        }
    }
    Ok(names)
}

/// Splits a placeholder at the first `:` outside brackets.
fn split_spec(inner: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return (&inner[..i], &inner[i + 1..]),
            _ => {}
        }
    }
    (inner, "")
}

/// Identifiers followed by `$` in a format spec.
fn counts(spec: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut ident = String::new();
    for c in spec.chars() {
        if c.is_alphanumeric() || c == '_' {
            ident.push(c);
            continue;
        }
        if c == '$' && ident.chars().next().is_some_and(|c| !c.is_ascii_digit()) {
            found.push(ident.clone());
        }
        ident.clear();
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_in_order() {
        assert_eq!(
            placeholder_names("{{lit}} {user.name} {items[0]} {total:>w$.p$} {user}").unwrap(),
            ["user", "items", "total", "w", "p"]
        );
    }

    #[test]
    fn brackets_may_contain_colons() {
        assert_eq!(placeholder_names("{map[a:b]:?}").unwrap(), ["map"]);
    }

    #[test]
    fn positional_and_malformed() {
        assert!(placeholder_names("{}").is_err());
        assert!(placeholder_names("{0}").is_err());
        assert!(placeholder_names("{x").is_err());
        assert!(placeholder_names("x}").is_err());
    }

    #[test]
    fn spec_types_are_not_counts() {
        assert_eq!(counts("x?"), Vec::<String>::new());
        assert_eq!(counts("*^w$.2"), ["w"]);
        assert_eq!(counts("1$"), Vec::<String>::new());
    }
}
