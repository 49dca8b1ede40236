//! Target collections.
//!
//! A collection is any chainable, query-like value. The engine only ever
//! replaces its working reference with whatever a call returns.

use crate::ScopeError;
use serde_json::Value;

/// Dispatch table from scope names to chainable calls.
///
/// Implementations match on `name` and return [`ScopeError::UnknownMethod`]
/// for names they do not expose.
pub trait Collection: Sized {
    fn call_scope(self, name: &str, args: &[Value]) -> Result<Self, ScopeError>;
}

/// One recorded call on a [`CallLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub args: Vec<Value>,
}

/// A collection that accepts every scope name and records the calls in order.
///
/// Useful for dry runs and for asserting application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    calls: Vec<Call>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call; custom transforms use this to note what they did.
    pub fn record(mut self, method: impl Into<String>, args: Vec<Value>) -> Self {
        self.calls.push(Call { method: method.into(), args });
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Method names in call order.
    pub fn methods(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.method.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Collection for CallLog {
    fn call_scope(self, name: &str, args: &[Value]) -> Result<Self, ScopeError> {
        Ok(self.record(name, args.to_vec()))
    }
}
