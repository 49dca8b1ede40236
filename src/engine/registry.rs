//! Scope registration.
//!
//! This is the static side of the engine: the declaration list a collection
//! type is configured with once, at setup time, and then shares read-only
//! across any number of concurrent invocations.
//!
//! ## Invariants
//!
//! - `ScopeId` is an index into `ScopeRegistry::scopes`; registration order is
//!   application order.
//! - Names are unique, and so are the alias-or-name keys scopes are recorded
//!   under.
//! - `using` keys only appear on hash-typed scopes.
//! - Boolean scopes never allow blanks; `""` is neither `"true"` nor `"false"`.

use crate::{Scope, ScopeError, ScopeFlags, ValueType};

/// Scope identifier (index into the registry).
pub type ScopeId = usize;

/// Ordered, validated collection of scope declarations.
pub struct ScopeRegistry<C, T> {
    scopes: Vec<Scope<C, T>>,
}

impl<C, T> ScopeRegistry<C, T> {
    pub fn new() -> Self {
        ScopeRegistry { scopes: Vec::new() }
    }

    /// Build a registry from declarations in order, failing on the first
    /// invalid one.
    pub fn from_scopes(scopes: impl IntoIterator<Item = Scope<C, T>>) -> Result<Self, ScopeError> {
        let mut registry = Self::new();
        for scope in scopes {
            registry.register(scope)?;
        }
        Ok(registry)
    }

    /// Append `scope` and return its id.
    pub fn register(&mut self, scope: Scope<C, T>) -> Result<ScopeId, ScopeError> {
        if !crate::regex!(r"^[A-Za-z_][A-Za-z0-9_]*[!?]?$").is_match(&scope.name) {
            return Err(ScopeError::InvalidName(scope.name));
        }
        if self.scopes.iter().any(|s| s.name == scope.name || s.key() == scope.key()) {
            return Err(ScopeError::DuplicateDeclaration(scope.name));
        }
        if !scope.using.is_empty() && scope.value_type != ValueType::Hash {
            return Err(ScopeError::UsingWithoutHash(scope.name));
        }
        if scope.flags.contains(ScopeFlags::ALLOW_BLANK) && scope.value_type == ValueType::Boolean {
            return Err(ScopeError::BlankBoolean(scope.name));
        }

        tracing::trace!(scope = %scope.name, key = %scope.key(), kind = ?scope.value_type, "registered scope");
        self.scopes.push(scope);
        Ok(self.scopes.len() - 1)
    }

    /// Chainable form of [`register`](Self::register).
    pub fn with(mut self, scope: Scope<C, T>) -> Result<Self, ScopeError> {
        self.register(scope)?;
        Ok(self)
    }

    /// All declarations in registration order.
    pub fn all(&self) -> &[Scope<C, T>] {
        &self.scopes
    }

    pub fn get(&self, name: &str) -> Option<&Scope<C, T>> {
        self.scopes.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope<C, T>> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl<C, T> Default for ScopeRegistry<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> std::fmt::Debug for ScopeRegistry<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.scopes.iter()).finish()
    }
}
