//! File-driven declarations.
//!
//! A manifest describes scopes as data. Guards and computed defaults are
//! referenced by name and resolved through [`RequestContext`](crate::RequestContext)
//! at request time:
//!
//! ```json
//! {
//!   "scopes": [
//!     {"name": "color", "unless": "show_all_colors?"},
//!     {"name": "only_tall", "type": "boolean", "only": ["index"]},
//!     {"name": "root_type", "as": "root", "allow_blank": true},
//!     {"name": "args_paginate", "type": "hash", "using": ["page", "per_page"]},
//!     {"name": "calculate_height", "default_from": "session_height", "only": ["new"]}
//!   ]
//! }
//! ```

use crate::{Scope, ScopeError, ScopeRegistry, ValueType};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeManifest {
    pub scopes: Vec<ScopeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeEntry {
    pub name: String,
    #[serde(default, rename = "as")]
    pub param_key: Option<String>,
    #[serde(default, rename = "type")]
    pub value_type: EntryType,
    #[serde(default)]
    pub using: Vec<String>,
    #[serde(default, rename = "if")]
    pub when: Option<String>,
    #[serde(default)]
    pub unless: Option<String>,
    #[serde(default)]
    pub only: Option<Vec<String>>,
    #[serde(default)]
    pub except: Vec<String>,
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub allow_blank: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub default_from: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    #[serde(alias = "default")]
    Scalar,
    Boolean,
    Hash,
    Array,
}

impl From<EntryType> for ValueType {
    fn from(t: EntryType) -> Self {
        match t {
            EntryType::Scalar => ValueType::Scalar,
            EntryType::Boolean => ValueType::Boolean,
            EntryType::Hash => ValueType::Hash,
            EntryType::Array => ValueType::Array,
        }
    }
}

impl ScopeManifest {
    pub fn from_json(text: &str) -> Result<Self, ScopeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build a registry in manifest order.
    pub fn into_registry<C, T>(self) -> Result<ScopeRegistry<C, T>, ScopeError> {
        ScopeRegistry::from_scopes(self.scopes.into_iter().map(ScopeEntry::into_scope))
    }
}

impl ScopeEntry {
    pub fn into_scope<C, T>(self) -> Scope<C, T> {
        let mut scope = Scope::new(self.name)
            .value_type(self.value_type.into())
            .using(self.using)
            .except(self.except)
            .always(self.always)
            .allow_blank(self.allow_blank);

        if let Some(key) = self.param_key {
            scope = scope.param_key(key);
        }
        if let Some(only) = self.only {
            scope = scope.only(only);
        }
        if let Some(predicate) = self.when {
            scope = scope.when_named(predicate);
        }
        if let Some(predicate) = self.unless {
            scope = scope.unless_named(predicate);
        }
        // A literal default wins over a named computation.
        if let Some(computation) = self.default_from {
            scope = scope.default_named(computation);
        }
        if let Some(value) = self.default {
            scope = scope.default(value);
        }
        scope
    }
}
