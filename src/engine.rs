//! Scope resolution and application engine.
//!
//! ## How the parts work together
//!
//! Applying scopes for one request is a small pipeline over an immutable
//! registry:
//!
//! ```text
//! declarations ──┐
//!                │  ScopeRegistry::register       (registry.rs)
//!                └───────────────┬──────────────
//!                                │
//! context ── eligibility ────────┼─ action filter + if/unless guards
//!           (applicability.rs)   │
//!                                v
//!                      plan (executor.rs)
//!                        - pass 1: raw params, coerced (coerce.rs)
//!                        - pass 2: defaults, unless suppressed
//!                        - fallback: caller-wide defaults
//!                                │
//!                                v
//!                      execute in registration order
//!                        - transform or Collection::call_scope
//!                        - record CurrentScopes
//! ```
//!
//! Resolution finishes for every declaration before the first call reaches
//! the collection, so a coercion error leaves the collection untouched.
//!
//! ## Responsibilities by module
//!
//! - `registry.rs`: the ordered, validated declaration list.
//! - `applicability.rs`: action filtering and guard evaluation.
//! - `coerce.rs`: blank handling, type coercion and default evaluation.
//! - `executor.rs`: the passes, suppression, fallback and dispatch.
//! - `metrics.rs`: timings, pass counters and per-scope decisions.
//!
//! ## Debugging
//!
//! Every per-scope decision is emitted as a `tracing` event at `debug` level;
//! dispatched calls are emitted at `trace`.

#[path = "engine/applicability.rs"]
mod applicability;
#[path = "engine/coerce.rs"]
mod coerce;
#[path = "engine/executor.rs"]
mod executor;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/registry.rs"]
mod registry;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub(crate) use executor::run;
pub use metrics::{Decision, PassMetrics, RunMetrics, ScopeTrace, ValueSource};
pub use registry::{ScopeId, ScopeRegistry};
