extern crate self as scopecraft;

#[macro_use]
mod macros;
mod api;
mod collection;
mod context;
mod current_scopes;
mod engine;
mod error;
pub mod manifest;

use serde_json::Value;
use std::fmt;

pub use api::{Applied, ApplyDetails, Options, apply, apply_verbose_with, apply_with};
pub use collection::{Call, CallLog, Collection};
pub use context::{RequestContext, StaticContext};
pub use current_scopes::CurrentScopes;
pub use engine::{Decision, PassMetrics, RunMetrics, ScopeId, ScopeRegistry, ScopeTrace, ValueSource};
pub use error::ScopeError;

/// Raw parameter map as handed over by the hosting layer.
pub type Params = serde_json::Map<String, Value>;

// --- Declarations -----------------------------------------------------------

/// How a raw parameter is coerced before it reaches the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    /// Passed through unchanged; structured (mapping) input is rejected.
    #[default]
    Scalar,
    /// `"true"` applies the scope with no arguments, `"false"` skips it.
    Boolean,
    /// A mapping, optionally unpacked into positional arguments via `using`.
    Hash,
    /// A sequence, passed as a single argument.
    Array,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::Scalar => "a scalar",
            ValueType::Boolean => "a boolean",
            ValueType::Hash => "a hash",
            ValueType::Array => "an array",
        })
    }
}

bitflags::bitflags! {
    /// Per-declaration switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScopeFlags: u8 {
        /// Apply the default even when other scopes came from parameters.
        const ALWAYS      = 1 << 0;
        /// Treat an empty string as a real value. Rejected on boolean scopes,
        /// which only accept `"true"` or `"false"`.
        const ALLOW_BLANK = 1 << 1;
    }
}

/// Restricts which actions consider a declaration at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFilter {
    pub only: Option<Vec<String>>,
    pub except: Vec<String>,
}

impl ActionFilter {
    /// Returns true when `action` passes both the `only` and `except` lists.
    pub fn admits(&self, action: &str) -> bool {
        if self.except.iter().any(|a| a == action) {
            return false;
        }
        match &self.only {
            Some(only) => only.iter().any(|a| a == action),
            None => true,
        }
    }
}

pub type Check<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;
pub type Compute<C> = Box<dyn Fn(&C) -> Value + Send + Sync>;

/// A `(context, collection, args) -> collection` override for the default
/// named call. Boolean scopes receive an empty argument slice.
pub type Transform<C, T> = Box<dyn Fn(&C, T, &[Value]) -> Result<T, ScopeError> + Send + Sync>;

/// An `if`/`unless` condition.
pub enum Guard<C> {
    /// A callable captured at declaration time.
    Check(Check<C>),
    /// A predicate resolved through [`RequestContext::predicate`].
    Named(String),
}

/// A per-declaration default, evaluated lazily per request.
pub enum DefaultValue<C> {
    Literal(Value),
    Deferred(Compute<C>),
    /// A computation resolved through [`RequestContext::computed_default`].
    Named(String),
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Check(_) => f.write_str("Check(<function>)"),
            Guard::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

impl<C> fmt::Debug for DefaultValue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            DefaultValue::Deferred(_) => f.write_str("Deferred(<function>)"),
            DefaultValue::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// One scope declaration: which parameter feeds it, how the value is coerced,
/// when it applies, and what happens when it does.
///
/// Built once with the chainable setters below (or the `scope!` macro) and
/// then frozen inside a [`ScopeRegistry`].
pub struct Scope<C, T> {
    pub(crate) name: String,
    pub(crate) param_key: Option<String>,
    pub(crate) value_type: ValueType,
    pub(crate) using: Vec<String>,
    pub(crate) when: Option<Guard<C>>,
    pub(crate) unless: Option<Guard<C>>,
    pub(crate) actions: ActionFilter,
    pub(crate) flags: ScopeFlags,
    pub(crate) default: Option<DefaultValue<C>>,
    pub(crate) transform: Option<Transform<C, T>>,
}

impl<C, T> Scope<C, T> {
    pub fn new(name: impl Into<String>) -> Self {
        Scope {
            name: name.into(),
            param_key: None,
            value_type: ValueType::Scalar,
            using: Vec::new(),
            when: None,
            unless: None,
            actions: ActionFilter::default(),
            flags: ScopeFlags::empty(),
            default: None,
            transform: None,
        }
    }

    /// Read the value from `key` instead of the scope name. The key is also
    /// what the scope is recorded under in [`CurrentScopes`].
    pub fn param_key(mut self, key: impl Into<String>) -> Self {
        self.param_key = Some(key.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn boolean(self) -> Self {
        self.value_type(ValueType::Boolean)
    }

    pub fn hash(self) -> Self {
        self.value_type(ValueType::Hash)
    }

    pub fn array(self) -> Self {
        self.value_type(ValueType::Array)
    }

    /// Unpack these hash sub-keys into positional arguments.
    pub fn using<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.using = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn when(mut self, check: impl Fn(&C) -> bool + Send + Sync + 'static) -> Self {
        self.when = Some(Guard::Check(Box::new(check)));
        self
    }

    pub fn when_named(mut self, predicate: impl Into<String>) -> Self {
        self.when = Some(Guard::Named(predicate.into()));
        self
    }

    pub fn unless(mut self, check: impl Fn(&C) -> bool + Send + Sync + 'static) -> Self {
        self.unless = Some(Guard::Check(Box::new(check)));
        self
    }

    pub fn unless_named(mut self, predicate: impl Into<String>) -> Self {
        self.unless = Some(Guard::Named(predicate.into()));
        self
    }

    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.except = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn always(mut self, always: bool) -> Self {
        self.flags.set(ScopeFlags::ALWAYS, always);
        self
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.flags.set(ScopeFlags::ALLOW_BLANK, allow);
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Compute the default from the request context, once per request that
    /// actually needs it.
    pub fn default_with(mut self, compute: impl Fn(&C) -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Deferred(Box::new(compute)));
        self
    }

    pub fn default_named(mut self, computation: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Named(computation.into()));
        self
    }

    pub fn transform(
        mut self,
        transform: impl Fn(&C, T, &[Value]) -> Result<T, ScopeError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter key, which doubles as the key in [`CurrentScopes`].
    pub fn key(&self) -> &str {
        self.param_key.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> ValueType {
        self.value_type
    }

    pub fn flags(&self) -> ScopeFlags {
        self.flags
    }

    pub fn actions(&self) -> &ActionFilter {
        &self.actions
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl<C, T> fmt::Debug for Scope<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("param_key", &self.param_key)
            .field("value_type", &self.value_type)
            .field("using", &self.using)
            .field("when", &self.when)
            .field("unless", &self.unless)
            .field("actions", &self.actions)
            .field("flags", &self.flags)
            .field("default", &self.default)
            .field("transform", &self.transform.as_ref().map(|_| "<function>"))
            .finish()
    }
}
