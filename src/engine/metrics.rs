//! Run metrics and per-scope decisions.
//!
//! - `run` always collects the cheap parts: timings, pass counters and one
//!   `Decision` per declaration.
//! - `ScopeTrace` pairs a decision with the scope's names and is only built by
//!   the verbose API.

use crate::CurrentScopes;
use std::time::Duration;

/// Where an applied value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// A request parameter.
    Param,
    /// The declaration's own default.
    Default,
    /// The caller-wide fallback defaults.
    Fallback,
}

/// What happened to one declaration during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// `only`/`except` did not admit the action.
    ExcludedByAction,
    /// The `if` guard was false or the `unless` guard was true.
    GuardRejected,
    /// Eligible, but no value was found.
    Absent,
    /// A boolean scope received `"false"`.
    BooleanFalse,
    /// Has a default, but another scope came from parameters.
    Suppressed,
    Applied(ValueSource),
}

impl Decision {
    pub fn is_applied(&self) -> bool {
        matches!(self, Decision::Applied(_))
    }
}

/// One declaration's decision, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTrace {
    pub scope: String,
    /// Alias-or-name the scope is recorded under.
    pub key: String,
    pub decision: Decision,
}

/// Counters for one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassMetrics {
    /// Declarations the pass looked at.
    pub considered: usize,
    /// Declarations the pass resolved to a value.
    pub resolved: usize,
}

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Time spent deciding applicability and resolving values.
    pub resolve: Duration,
    /// Time spent calling into the collection.
    pub apply: Duration,
    pub params: PassMetrics,
    pub defaults: PassMetrics,
    /// Present only when the caller-wide fallback was consulted.
    pub fallback: Option<PassMetrics>,
}

/// Executor output.
#[derive(Debug)]
pub struct RunResult<T> {
    pub collection: T,
    pub current_scopes: CurrentScopes,
    /// One entry per declaration, in registration order.
    pub decisions: Vec<Decision>,
    pub metrics: RunMetrics,
}
