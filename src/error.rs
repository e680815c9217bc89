// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types.
//!
//! Three categories are kept strictly apart:
//!
//! * [`BindError`]: arguments that do not fit a [`Signature`](crate::Signature).  Only
//!   [`Signature::bind`](crate::Signature::bind) produces it.
//! * [`TemplateError`]: a message template that cannot be rendered against its context.
//!   This is a configuration defect and is never logged or swallowed.
//! * the wrapped callable's own error `E`, carried unchanged in
//!   [`InvocationError::Raised`].

use thiserror::Error;

/// A template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references `{name}`, which is not in the invocation context")]
    MissingName { name: String },

    #[error("template field `{field}` does not resolve")]
    MissingField { field: String },

    #[error("invalid format spec `{spec}` for `{field}`: {reason}")]
    InvalidSpec {
        field: String,
        spec: String,
        reason: String,
    },

    #[error("malformed template at byte {position}: {reason}")]
    Malformed { position: usize, reason: &'static str },

    #[error("placeholder `{{{placeholder}}}` is positional; template placeholders must be named")]
    Positional { placeholder: String },
}

/// Arguments that do not fit a [`Signature`](crate::Signature).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("takes {accepted} positional arguments but {given} were given")]
    TooManyPositional { accepted: usize, given: usize },

    #[error("got an unexpected keyword argument `{name}`")]
    UnexpectedKeyword { name: String },

    #[error("got multiple values for argument `{name}`")]
    MultipleValues { name: String },
}

/**
The failure of a call wrapped by an error hook.

```rust
use logwrap::{InvocationError, TemplateError};

let raised: InvocationError<std::num::ParseIntError> =
    InvocationError::Raised("x".parse::<i32>().unwrap_err());
assert!(raised.raised().is_some());

let template: InvocationError<std::num::ParseIntError> =
    TemplateError::MissingName { name: "missing".into() }.into();
assert!(template.template().is_some());
```
*/
#[derive(Debug, Error)]
pub enum InvocationError<E> {
    /// The error hook's template failed; the callable's own outcome is discarded.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The callable's error, unchanged.
    #[error("{0}")]
    Raised(E),
}

impl<E> InvocationError<E> {
    pub fn raised(&self) -> Option<&E> {
        match self {
            InvocationError::Raised(error) => Some(error),
            InvocationError::Template(_) => None,
        }
    }

    pub fn template(&self) -> Option<&TemplateError> {
        match self {
            InvocationError::Template(error) => Some(error),
            InvocationError::Raised(_) => None,
        }
    }

    /// Splits the two categories: `Ok(e)` for the callable's error, `Err` for a template error.
    pub fn into_raised(self) -> Result<E, TemplateError> {
        match self {
            InvocationError::Raised(error) => Ok(error),
            InvocationError::Template(error) => Err(error),
        }
    }
}
