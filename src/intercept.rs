// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which errors an error hook handles.
//!
//! An [`Intercept`] is a set of matchers over the error value.  Matchers are type-erased so
//! that one [`LogOnError`](crate::LogOnError) configuration type serves every error type and
//! can live in a `static`.

use std::any::Any;
use std::error::Error;
use std::fmt::Debug;

type Matcher = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/**
The set of errors an error hook intercepts.

An error that is not intercepted passes through the hook untouched and unlogged.

```rust
use logwrap::Intercept;
use std::num::ParseIntError;

let intercept = Intercept::of_type::<ParseIntError>();
let error = "x".parse::<i32>().unwrap_err();
assert!(intercept.matches(&error));

// boxed errors match by their concrete type
let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);
assert!(intercept.matches(&boxed));

assert!(!Intercept::none().matches(&boxed));
assert!(Intercept::all().matches(&boxed));
```
*/
pub struct Intercept {
    all: bool,
    labels: Vec<&'static str>,
    matchers: Vec<Matcher>,
}

impl Intercept {
    /// Intercepts nothing.
    pub fn none() -> Self {
        Intercept {
            all: false,
            labels: Vec::new(),
            matchers: Vec::new(),
        }
    }

    /// Intercepts every error.
    pub fn all() -> Self {
        Intercept {
            all: true,
            ..Self::none()
        }
    }

    /// Intercepts errors of type `T`, directly or behind a boxed `dyn Error`.
    pub fn of_type<T: Error + 'static>() -> Self {
        Self::none().or_type::<T>()
    }

    /// Intercepts errors of type `E` for which `predicate` holds.
    ///
    /// ```rust
    /// use logwrap::Intercept;
    /// use std::io;
    ///
    /// let not_found = Intercept::when(|e: &io::Error| e.kind() == io::ErrorKind::NotFound);
    /// assert!(not_found.matches(&io::Error::from(io::ErrorKind::NotFound)));
    /// assert!(!not_found.matches(&io::Error::from(io::ErrorKind::PermissionDenied)));
    /// ```
    pub fn when<E: 'static>(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self::none().or_when(predicate)
    }

    /// Adds `T` to the intercepted types.
    pub fn or_type<T: Error + 'static>(mut self) -> Self {
        self.labels.push(std::any::type_name::<T>());
        self.matchers.push(Box::new(|error: &dyn Any| is_type::<T>(error)));
        self
    }

    /// Adds a predicate over errors of type `E`.
    pub fn or_when<E: 'static>(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        self.labels.push("<predicate>");
        self.matchers.push(Box::new(move |error: &dyn Any| {
            error.downcast_ref::<E>().is_some_and(&predicate)
        }));
        self
    }

    pub fn is_none(&self) -> bool {
        !self.all && self.matchers.is_empty()
    }

    pub fn matches<E: 'static>(&self, error: &E) -> bool {
        let error: &dyn Any = error;
        self.all || self.matchers.iter().any(|matcher| matcher(error))
    }
}

fn is_type<T: Error + 'static>(error: &dyn Any) -> bool {
    if error.is::<T>() {
        return true;
    }
    if let Some(boxed) = error.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return boxed.is::<T>();
    }
    if let Some(boxed) = error.downcast_ref::<Box<dyn Error + Send>>() {
        return boxed.is::<T>();
    }
    if let Some(boxed) = error.downcast_ref::<Box<dyn Error>>() {
        return boxed.is::<T>();
    }
    false
}

impl Default for Intercept {
    fn default() -> Self {
        Self::none()
    }
}

impl Debug for Intercept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.all {
            return f.write_str("Intercept::all()");
        }
        f.debug_tuple("Intercept").field(&self.labels).finish()
    }
}
