//! Lexical scopes, scope sets, and the binding table.
//!
//! Hygiene is tracked with sets of scope marks attached to tokens. Macro
//! expansion mints fresh scopes and flips or adds them over produced syntax;
//! reference resolution picks the binding whose scope set is the largest
//! subset of the reference's scope set.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::token::Token;

/// Expansion phase. Phase 0 is runtime; each `for syntax` import moves one
/// phase up.
pub type Phase = u32;

/// An opaque scope mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(pub u32);

/// An immutable set of scope marks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scopes(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self(scopes.into_iter().collect())
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.0.contains(&scope)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A copy of this set with `scope` present.
    pub fn with(&self, scope: Scope) -> Self {
        let mut set = self.0.clone();
        set.insert(scope);
        Self(set)
    }

    /// A copy of this set with `scope` absent.
    pub fn without(&self, scope: Scope) -> Self {
        let mut set = self.0.clone();
        set.remove(&scope);
        Self(set)
    }

    /// A copy with `scope` toggled. Syntax that travels out of the macro that
    /// introduced it loses the mark; syntax minted by the macro gains it.
    pub fn flip(&self, scope: Scope) -> Self {
        if self.contains(scope) {
            self.without(scope)
        } else {
            self.with(scope)
        }
    }

    pub fn is_subset(&self, other: &ScopeSet) -> bool {
        self.0.is_subset(&other.0)
    }
}

/// Maps a surface name to the binding identities visible under various scope
/// sets, per phase.
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: FxHashMap<(String, Phase), Vec<(ScopeSet, String)>>,
    next_id: u32,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh binding for `token` at `phase` and return its
    /// canonical identity.
    pub fn add(&mut self, token: &Token, phase: Phase) -> String {
        let id = format!("{}${}", token.value, self.next_id);
        self.next_id += 1;
        self.entries
            .entry((token.value.clone(), phase))
            .or_default()
            .push((token.scopes.clone(), id.clone()));
        id
    }

    /// Register `token` as denoting an existing identity (aliasing import
    /// bindings and pre-seeded keyword sentinels).
    pub fn alias(&mut self, token: &Token, phase: Phase, id: &str) {
        self.entries
            .entry((token.value.clone(), phase))
            .or_default()
            .push((token.scopes.clone(), id.to_string()));
    }

    /// Resolve `token` at `phase`: among candidates whose scope set is a
    /// subset of the token's, the largest wins. An unbound name resolves to
    /// itself.
    pub fn resolve(&self, token: &Token, phase: Phase) -> String {
        let candidates = match self.entries.get(&(token.value.clone(), phase)) {
            Some(c) => c,
            None => return token.value.clone(),
        };
        let mut best: Option<(&ScopeSet, &String)> = None;
        for (scopes, id) in candidates {
            if !scopes.is_subset(&token.scopes) {
                continue;
            }
            match best {
                Some((best_scopes, _)) if best_scopes.len() >= scopes.len() => {}
                _ => best = Some((scopes, id)),
            }
        }
        match best {
            Some((_, id)) => id.clone(),
            None => token.value.clone(),
        }
    }
}
