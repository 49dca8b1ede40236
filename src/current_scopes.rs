//! The per-invocation record of applied scopes.

use crate::Params;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Ordered `key -> applied value` record, keyed by alias-or-name.
///
/// Entries follow registration order. Built fresh for every invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentScopes {
    entries: Vec<(String, Value)>,
}

impl CurrentScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into a parameter map, e.g. to rebuild pagination links.
    pub fn to_params(&self) -> Params {
        self.entries.iter().cloned().collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_params())
    }
}

impl Serialize for CurrentScopes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
