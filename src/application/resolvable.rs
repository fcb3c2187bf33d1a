//! Settings that are either fixed or computed per request.

use std::fmt;
use std::sync::Arc;

/// A static value or a closure evaluated once per request.
pub enum Resolvable<T> {
    Static(T),
    Computed(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> Resolvable<T> {
    pub fn computed(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Resolvable::Computed(Arc::new(f))
    }

    pub fn resolve(&self) -> T {
        match self {
            Resolvable::Static(value) => value.clone(),
            Resolvable::Computed(f) => f(),
        }
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Resolvable::Static(value)
    }
}

impl<T: Clone> Clone for Resolvable<T> {
    fn clone(&self) -> Self {
        match self {
            Resolvable::Static(value) => Resolvable::Static(value.clone()),
            Resolvable::Computed(f) => Resolvable::Computed(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Resolvable::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
