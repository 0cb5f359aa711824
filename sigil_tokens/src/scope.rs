//! An insertion-ordered set of permission scopes

use std::{fmt, slice, vec};

use serde::{Deserialize, Serialize};

use crate::{Scope, ScopeRef};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ScopesDto {
    String(String),
    Array(Vec<Scope>),
}

impl From<ScopesDto> for ScopeSet {
    fn from(dto: ScopesDto) -> Self {
        match dto {
            ScopesDto::String(s) => s.split_whitespace().map(Scope::from).collect(),
            ScopesDto::Array(arr) => arr.into_iter().collect(),
        }
    }
}

impl From<ScopeSet> for ScopesDto {
    fn from(s: ScopeSet) -> Self {
        ScopesDto::String(s.to_string())
    }
}

/// An ordered set of permission scopes
///
/// Scopes are kept in the order they were first inserted, and duplicates are
/// discarded. Interactive flows receive the scopes exactly as configured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "ScopesDto", into = "ScopesDto")]
pub struct ScopeSet(Vec<Scope>);

impl ScopeSet {
    /// Produces an empty scope set
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a scope to the end of the set
    ///
    /// Returns `false` without modifying the set if the scope was already
    /// present.
    pub fn insert(&mut self, scope: Scope) -> bool {
        if self.0.contains(&scope) {
            false
        } else {
            self.0.push(scope);
            true
        }
    }

    /// Checks whether the set contains the given scope
    pub fn contains<T>(&self, scope: T) -> bool
    where
        T: AsRef<ScopeRef>,
    {
        let scope = scope.as_ref();
        self.0.iter().any(|s| AsRef::<ScopeRef>::as_ref(s) == scope)
    }

    /// The number of scopes in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no scopes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Produces an iterator over the scopes, in insertion order
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }
}

impl fmt::Display for ScopeSet {
    /// Formats the set as a space-delimited scope string
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut scopes = self.iter();
        if let Some(first) = scopes.next() {
            f.write_str(first.as_str())?;
            for scope in scopes {
                f.write_str(" ")?;
                f.write_str(scope.as_str())?;
            }
        }
        Ok(())
    }
}

impl Extend<Scope> for ScopeSet {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Scope>,
    {
        for scope in iter {
            self.insert(scope);
        }
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for ScopeSet {
    type Item = Scope;
    type IntoIter = vec::IntoIter<Scope>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An iterator over a set of borrowed scopes
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    iter: slice::Iter<'a, Scope>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ScopeRef;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|x| x.as_ref())
    }
}

impl<'a> IntoIterator for &'a ScopeSet {
    type Item = &'a ScopeRef;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter {
            iter: self.0.iter(),
        }
    }
}
