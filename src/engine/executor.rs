//! Planning and application.
//!
//! This module is the operational core of the engine. A run has two phases:
//!
//! ```text
//! (1) plan
//!     pass 1   eligible + raw param present          -> Applied(Param)
//!     pass 2   eligible + absent + has default
//!                nothing from pass 1 or ALWAYS set   -> Applied(Default)
//!                otherwise                           -> Suppressed
//!     fallback nothing planned + fallback map given
//!                eligible + absent + key in map      -> Applied(Fallback)
//! (2) execute, in registration order
//!     transform(ctx, collection, args) | collection.call_scope(name, args)
//!     record key -> value in CurrentScopes
//! ```
//!
//! Deferred defaults are evaluated only for declarations pass 2 selects.
//! Any error during planning aborts the run before the collection is touched;
//! an error from a call aborts the remaining calls.

use super::applicability::{Eligibility, eligibility};
use super::coerce::{Application, Resolved, coerce, resolve_default};
use super::metrics::{Decision, PassMetrics, RunMetrics, RunResult, ValueSource};
use super::registry::ScopeRegistry;
use crate::{Collection, CurrentScopes, Params, RequestContext, Scope, ScopeError, ScopeFlags};
use std::time::Instant;

struct Step {
    source: ValueSource,
    application: Application,
}

/// Per-run planning state, indexed by `ScopeId`.
struct Plan {
    steps: Vec<Option<Step>>,
    decisions: Vec<Decision>,
}

impl Plan {
    fn new(len: usize) -> Self {
        Plan { steps: (0..len).map(|_| None).collect(), decisions: vec![Decision::Absent; len] }
    }

    fn is_empty(&self) -> bool {
        self.steps.iter().all(Option::is_none)
    }

    /// Record the outcome of resolving one declaration's value.
    fn settle(&mut self, id: usize, resolved: Resolved, source: ValueSource) -> bool {
        match resolved {
            Resolved::Apply(application) => {
                self.steps[id] = Some(Step { source, application });
                self.decisions[id] = Decision::Applied(source);
                true
            }
            Resolved::Skip => {
                self.decisions[id] = Decision::BooleanFalse;
                false
            }
            Resolved::Absent => false,
        }
    }
}

/// Resolve and apply every declaration in `registry` for one request.
pub(crate) fn run<C, T>(
    registry: &ScopeRegistry<C, T>,
    ctx: &C,
    base: T,
    fallback: Option<&Params>,
) -> Result<RunResult<T>, ScopeError>
where
    C: RequestContext,
    T: Collection,
{
    let start = Instant::now();
    let mut metrics = RunMetrics::default();

    let plan = plan(registry, ctx, fallback, &mut metrics)?;
    metrics.resolve = start.elapsed();

    let apply_start = Instant::now();
    let (collection, current_scopes) = execute(registry.all(), ctx, base, plan.steps)?;
    metrics.apply = apply_start.elapsed();
    metrics.total = start.elapsed();

    Ok(RunResult { collection, current_scopes, decisions: plan.decisions, metrics })
}

fn plan<C, T>(
    registry: &ScopeRegistry<C, T>,
    ctx: &C,
    fallback: Option<&Params>,
    metrics: &mut RunMetrics,
) -> Result<Plan, ScopeError>
where
    C: RequestContext,
{
    let scopes = registry.all();
    let mut plan = Plan::new(scopes.len());

    // Pass 1: parameters.
    for (id, scope) in scopes.iter().enumerate() {
        match eligibility(scope, ctx)? {
            Eligibility::ExcludedByAction => plan.decisions[id] = Decision::ExcludedByAction,
            Eligibility::GuardRejected => plan.decisions[id] = Decision::GuardRejected,
            Eligibility::Eligible => {
                metrics.params.considered += 1;
                let resolved = coerce(scope, ctx.param(scope.key()))?;
                if plan.settle(id, resolved, ValueSource::Param) {
                    metrics.params.resolved += 1;
                }
            }
        }
        tracing::debug!(scope = %scope.name, action = %ctx.action(), decision = ?plan.decisions[id], "pass 1");
    }

    // Pass 2: declared defaults, suppressed by any explicit parameter unless pinned.
    let explicit = !plan.is_empty();
    for (id, scope) in scopes.iter().enumerate() {
        if plan.decisions[id] != Decision::Absent || !scope.has_default() {
            continue;
        }
        if explicit && !scope.flags.contains(ScopeFlags::ALWAYS) {
            plan.decisions[id] = Decision::Suppressed;
            tracing::debug!(scope = %scope.name, "default suppressed by explicit parameters");
            continue;
        }

        metrics.defaults.considered += 1;
        let value = resolve_default(scope, ctx)?;
        let resolved = coerce(scope, value.as_ref())?;
        if plan.settle(id, resolved, ValueSource::Default) {
            metrics.defaults.resolved += 1;
        }
        tracing::debug!(scope = %scope.name, decision = ?plan.decisions[id], "pass 2");
    }

    // Fallback: caller-wide defaults, only when nothing else resolved.
    if let Some(fallback) = fallback.filter(|_| plan.is_empty()) {
        let mut pass = PassMetrics::default();
        for (id, scope) in scopes.iter().enumerate() {
            if plan.decisions[id] != Decision::Absent {
                continue;
            }
            let Some(raw) = fallback.get(scope.key()) else {
                continue;
            };

            pass.considered += 1;
            if plan.settle(id, coerce(scope, Some(raw))?, ValueSource::Fallback) {
                pass.resolved += 1;
            }
            tracing::debug!(scope = %scope.name, decision = ?plan.decisions[id], "fallback");
        }
        metrics.fallback = Some(pass);
    }

    Ok(plan)
}

fn execute<C, T>(
    scopes: &[Scope<C, T>],
    ctx: &C,
    base: T,
    steps: Vec<Option<Step>>,
) -> Result<(T, CurrentScopes), ScopeError>
where
    T: Collection,
{
    let mut collection = base;
    let mut current_scopes = CurrentScopes::new();

    for (scope, step) in scopes.iter().zip(steps) {
        let Some(Step { source, application }) = step else {
            continue;
        };

        tracing::trace!(scope = %scope.name, ?source, args = application.args.len(), "applying scope");
        collection = match &scope.transform {
            Some(transform) => transform(ctx, collection, &application.args)?,
            None => collection.call_scope(&scope.name, &application.args)?,
        };
        current_scopes.insert(scope.key(), application.recorded);
    }

    Ok((collection, current_scopes))
}
