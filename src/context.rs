//! Request context: the caller side of one invocation.

use crate::Params;
use serde_json::Value;
use std::collections::HashMap;

/// What the engine needs to know about the current request.
///
/// Predicates and deferred defaults captured as closures receive the
/// implementing type directly; the `predicate`/`computed_default` lookups only
/// serve declarations that reference callbacks by name.
pub trait RequestContext {
    /// Name of the action being served, e.g. `"index"`.
    fn action(&self) -> &str;

    /// Raw parameter at `key`, if any.
    fn param(&self, key: &str) -> Option<&Value>;

    /// Evaluate a named boolean predicate. `None` means the name is unknown.
    fn predicate(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Evaluate a named default computation. `None` means the name is unknown.
    fn computed_default(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// A context assembled from plain data.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub action: String,
    pub params: Params,
    pub predicates: HashMap<String, bool>,
    pub defaults: HashMap<String, Value>,
}

impl StaticContext {
    pub fn new(action: impl Into<String>) -> Self {
        StaticContext { action: action.into(), ..Default::default() }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_predicate(mut self, name: impl Into<String>, value: bool) -> Self {
        self.predicates.insert(name.into(), value);
        self
    }

    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }
}

impl RequestContext for StaticContext {
    fn action(&self) -> &str {
        &self.action
    }

    fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    fn predicate(&self, name: &str) -> Option<bool> {
        self.predicates.get(name).copied()
    }

    fn computed_default(&self, name: &str) -> Option<Value> {
        self.defaults.get(name).cloned()
    }
}
