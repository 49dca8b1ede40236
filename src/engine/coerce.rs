//! Value resolution.
//!
//! Turns a raw parameter (or a resolved default) into what the collection
//! receives:
//!
//! ```text
//! raw ──┬─ missing / null            -> Absent
//!       ├─ "" (allow_blank = false)  -> Absent
//!       └─ by value type
//!            scalar  -> [raw]                  (mapping -> TypeMismatch)
//!            boolean -> "true": [] | "false": Skip
//!            hash    -> [raw] | [raw[k] for k in using]
//!            array   -> [raw]
//! ```
//!
//! The value recorded in `CurrentScopes` is the raw value, except for booleans
//! where it is `true`. Hash scopes with `using` still record the full mapping.

use crate::{DefaultValue, RequestContext, Scope, ScopeError, ScopeFlags, ValueType};
use serde_json::Value;

/// Outcome of resolving one declaration's value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved {
    /// No usable value; defaults may still apply.
    Absent,
    /// A boolean scope explicitly turned off.
    Skip,
    Apply(Application),
}

/// Arguments for the call plus the value to record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Application {
    pub args: Vec<Value>,
    pub recorded: Value,
}

pub(crate) fn coerce<C, T>(scope: &Scope<C, T>, raw: Option<&Value>) -> Result<Resolved, ScopeError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(Resolved::Absent),
        Some(Value::String(s)) if s.is_empty() && !scope.flags.contains(ScopeFlags::ALLOW_BLANK) => {
            return Ok(Resolved::Absent);
        }
        Some(raw) => raw,
    };

    let args = match scope.value_type {
        ValueType::Scalar => {
            if raw.is_object() {
                return Err(mismatch(scope, raw));
            }
            vec![raw.clone()]
        }
        ValueType::Boolean => {
            return match boolean_text(raw) {
                Some("true") => Ok(Resolved::Apply(Application { args: Vec::new(), recorded: Value::Bool(true) })),
                Some("false") => Ok(Resolved::Skip),
                _ => Err(mismatch(scope, raw)),
            };
        }
        ValueType::Hash => {
            let Some(map) = raw.as_object() else {
                return Err(mismatch(scope, raw));
            };
            if scope.using.is_empty() {
                vec![raw.clone()]
            } else {
                scope.using.iter().map(|k| map.get(k).cloned().unwrap_or(Value::Null)).collect()
            }
        }
        ValueType::Array => {
            if !raw.is_array() {
                return Err(mismatch(scope, raw));
            }
            vec![raw.clone()]
        }
    };

    Ok(Resolved::Apply(Application { args, recorded: raw.clone() }))
}

/// Evaluate the declaration's default, if it has one.
pub(crate) fn resolve_default<C: RequestContext, T>(scope: &Scope<C, T>, ctx: &C) -> Result<Option<Value>, ScopeError> {
    match &scope.default {
        None => Ok(None),
        Some(DefaultValue::Literal(v)) => Ok(Some(v.clone())),
        Some(DefaultValue::Deferred(f)) => Ok(Some(f(ctx))),
        Some(DefaultValue::Named(name)) => ctx
            .computed_default(name)
            .map(Some)
            .ok_or_else(|| ScopeError::UnknownDefault { scope: scope.name.clone(), name: name.clone() }),
    }
}

fn boolean_text(raw: &Value) -> Option<&str> {
    match raw {
        Value::String(s) => Some(s.as_str()),
        Value::Bool(true) => Some("true"),
        Value::Bool(false) => Some("false"),
        _ => None,
    }
}

fn mismatch<C, T>(scope: &Scope<C, T>, raw: &Value) -> ScopeError {
    ScopeError::TypeMismatch { scope: scope.name.clone(), expected: scope.value_type, found: describe(raw) }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a hash",
    }
}
