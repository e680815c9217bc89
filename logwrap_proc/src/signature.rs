// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::parser::tokens_to_string;
use proc_macro::{Delimiter, Group, Spacing, TokenStream, TokenTree};

/// The parts of a function item the attributes need.
pub struct FnItem {
    tokens: Vec<TokenTree>,
    body_idx: usize,
    pub name: String,
    pub is_async: bool,
    /// Parameter names bound by a plain identifier pattern, including `self`.
    pub params: Vec<String>,
    /// The return type as source text, if one is declared.
    pub ret: Option<String>,
}

fn is_ident(token: &TokenTree, name: &str) -> bool {
    matches!(token, TokenTree::Ident(ident) if ident.to_string() == name)
}

fn is_punct(token: Option<&TokenTree>, c: char) -> bool {
    matches!(token, Some(TokenTree::Punct(p)) if p.as_char() == c)
}

/// Whether the `>` at `tokens[i]` closes an angle bracket rather than ending `->` or `=>`.
fn closes_angle(tokens: &[TokenTree], i: usize) -> bool {
    match i.checked_sub(1).map(|prev| &tokens[prev]) {
        Some(TokenTree::Punct(prev)) => {
            !(prev.spacing() == Spacing::Joint && matches!(prev.as_char(), '-' | '='))
        }
        _ => true,
    }
}

/// Finds the function name, parameters, return type and body.
///
/// Works on the flat token list the way `#[profile]` does: the first top-level `fn` ident is
/// followed by the name, optional generics, the parameter group and the signature tail, and
/// the last token is the body.
pub fn scan(item: TokenStream, attr_name: &str) -> Result<FnItem, String> {
    let tokens: Vec<TokenTree> = item.into_iter().collect();
    let not_a_fn = || format!("#[{attr_name}] can only be applied to functions");

    let fn_idx = tokens
        .iter()
        .position(|token| is_ident(token, "fn"))
        .ok_or_else(not_a_fn)?;
    let is_async = tokens[..fn_idx].iter().any(|token| is_ident(token, "async"));
    let name = match tokens.get(fn_idx + 1) {
        Some(TokenTree::Ident(name)) => name.to_string(),
        _ => return Err(not_a_fn()),
    };

    let body_idx = tokens.len() - 1;
    match tokens.last() {
        Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Brace => {}
        _ => return Err(format!("#[{attr_name}] requires a function with a body")),
    }

    // skip generics
    let mut i = fn_idx + 2;
    if is_punct(tokens.get(i), '<') {
        let mut depth = 0usize;
        while i < body_idx {
            match &tokens[i] {
                TokenTree::Punct(p) if p.as_char() == '<' => depth += 1,
                TokenTree::Punct(p) if p.as_char() == '>' && closes_angle(&tokens, i) => {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    let params = match tokens.get(i) {
        Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Parenthesis => param_names(g),
        _ => return Err(not_a_fn()),
    };
    i += 1;

    let mut ret = None;
    if is_punct(tokens.get(i), '-') && is_punct(tokens.get(i + 1), '>') {
        let start = i + 2;
        let end = tokens[start..body_idx]
            .iter()
            .position(|token| is_ident(token, "where"))
            .map_or(body_idx, |offset| start + offset);
        ret = Some(tokens_to_string(&tokens[start..end]));
    }

    Ok(FnItem {
        tokens,
        body_idx,
        name,
        is_async,
        params,
        ret,
    })
}

/// Names of the parameters in `group`, skipping destructuring patterns.
fn param_names(group: &Group) -> Vec<String> {
    let tokens: Vec<TokenTree> = group.stream().into_iter().collect();
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for i in 0..=tokens.len() {
        let at_end = i == tokens.len();
        match tokens.get(i) {
            Some(TokenTree::Punct(p)) if p.as_char() == '<' => depth += 1,
            Some(TokenTree::Punct(p)) if p.as_char() == '>' && closes_angle(&tokens, i) => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        if at_end || (depth == 0 && is_punct(tokens.get(i), ',')) {
            if let Some(name) = param_name(&tokens[start..i]) {
                names.push(name);
            }
            start = i + 1;
        }
    }
    names
}

fn param_name(tokens: &[TokenTree]) -> Option<String> {
    // outer attributes on the parameter
    let mut tokens = tokens;
    while let [TokenTree::Punct(p), TokenTree::Group(_), rest @ ..] = tokens {
        if p.as_char() != '#' {
            break;
        }
        tokens = rest;
    }

    let colon = tokens.iter().position(|token| {
        matches!(token, TokenTree::Punct(p) if p.as_char() == ':' && p.spacing() == Spacing::Alone)
    });
    let pattern = &tokens[..colon.unwrap_or(tokens.len())];
    if pattern.iter().any(|token| is_ident(token, "self")) {
        return Some("self".to_string());
    }
    match pattern {
        [TokenTree::Ident(name)] => Some(name.to_string()),
        [mutability, TokenTree::Ident(name)] if is_ident(mutability, "mut") => Some(name.to_string()),
        _ => None,
    }
}

impl FnItem {
    pub fn body(&self) -> &TokenTree {
        &self.tokens[self.body_idx]
    }

    /// The function with its body replaced.
    pub fn with_body(mut self, body: TokenStream) -> TokenStream {
        let span = self.body().span();
        let mut group = Group::new(Delimiter::Brace, body);
        group.set_span(span);
        self.tokens[self.body_idx] = TokenTree::Group(group);
        self.tokens.into_iter().collect()
    }
}

/// The name of the attribute in `group` (`#[name(..)]` or `#[krate::name(..)]`) when its
/// last path segment is one of `names`, with its arguments.
fn stacked_attr(group: &Group, krate: &str, names: &[&str]) -> Option<(String, TokenStream)> {
    let tokens: Vec<TokenTree> = group.stream().into_iter().collect();
    let path = match tokens.as_slice() {
        [TokenTree::Ident(krate_ident), TokenTree::Punct(a), TokenTree::Punct(b), rest @ ..]
            if krate_ident.to_string() == krate && a.as_char() == ':' && b.as_char() == ':' =>
        {
            rest
        }
        rest => rest,
    };
    let (name, args) = match path {
        [TokenTree::Ident(name)] => (name.to_string(), TokenStream::new()),
        [TokenTree::Ident(name), TokenTree::Group(args)] if args.delimiter() == Delimiter::Parenthesis => {
            (name.to_string(), args.stream())
        }
        _ => return None,
    };
    names.contains(&name.as_str()).then_some((name, args))
}

/// Removes the run of `names` attributes at the top of `item`, in source order.
///
/// Doc comments inside the run are kept in place.  Any other attribute ends the run, so
/// attribute macros between two of ours still see the function in between.
pub fn take_stacked(item: TokenStream, krate: &str, names: &[&str]) -> (Vec<(String, TokenStream)>, TokenStream) {
    let tokens: Vec<TokenTree> = item.into_iter().collect();
    let mut taken = Vec::new();
    let mut kept = Vec::new();
    let mut i = 0;
    while let (Some(TokenTree::Punct(hash)), Some(TokenTree::Group(group))) = (tokens.get(i), tokens.get(i + 1)) {
        if hash.as_char() != '#' || group.delimiter() != Delimiter::Bracket {
            break;
        }
        if let Some(attr) = stacked_attr(group, krate, names) {
            taken.push(attr);
        } else if matches!(group.stream().into_iter().next(), Some(TokenTree::Ident(ident)) if ident.to_string() == "doc") {
            kept.extend_from_slice(&tokens[i..i + 2]);
        } else {
            break;
        }
        i += 2;
    }
    kept.extend_from_slice(&tokens[i..]);
    (taken, kept.into_iter().collect())
}
