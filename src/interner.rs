//! Load-scoped string interning
//!
//! A blocks file repeats the same handful of location ids millions of
//! times. [`StringPool`] hands out one shared [`Symbol`] per distinct
//! string for the lifetime of a load, so every block that names a
//! location points at the same allocation.

use rustc_hash::FxHashSet;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Interned, cheaply clonable string
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// The string contents
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if both symbols share one allocation
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Pool of interned strings for one load
#[derive(Debug, Default)]
pub struct StringPool {
    strings: FxHashSet<Symbol>,
}

impl StringPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical symbol for `s`
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let symbol = Symbol(Arc::from(s));
        self.strings.insert(symbol.clone());
        symbol
    }

    /// Canonical symbol for a non-empty `s`, `None` for empty fields
    pub fn intern_opt(&mut self, s: &str) -> Option<Symbol> {
        if s.is_empty() {
            None
        } else {
            Some(self.intern(s))
        }
    }

    /// Number of distinct strings
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True if nothing was interned
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
