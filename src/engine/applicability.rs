//! Applicability: whether a declaration is considered for this request.
//!
//! Checked in order, stopping at the first rejection:
//!
//! ```text
//! except ∋ action ─┐
//! only ∌ action  ──┴─▶ ExcludedByAction
//! if == false    ──┐
//! unless == true ──┴─▶ GuardRejected
//! otherwise          ▶ Eligible
//! ```
//!
//! Eligibility says nothing about where the value comes from; that is decided
//! by the executor.

use crate::{Guard, RequestContext, Scope, ScopeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Eligibility {
    ExcludedByAction,
    GuardRejected,
    Eligible,
}

pub(crate) fn eligibility<C: RequestContext, T>(scope: &Scope<C, T>, ctx: &C) -> Result<Eligibility, ScopeError> {
    if !scope.actions.admits(ctx.action()) {
        return Ok(Eligibility::ExcludedByAction);
    }

    if let Some(guard) = &scope.when {
        if !check(scope, guard, ctx)? {
            return Ok(Eligibility::GuardRejected);
        }
    }
    if let Some(guard) = &scope.unless {
        if check(scope, guard, ctx)? {
            return Ok(Eligibility::GuardRejected);
        }
    }

    Ok(Eligibility::Eligible)
}

fn check<C: RequestContext, T>(scope: &Scope<C, T>, guard: &Guard<C>, ctx: &C) -> Result<bool, ScopeError> {
    match guard {
        Guard::Check(f) => Ok(f(ctx)),
        Guard::Named(name) => ctx
            .predicate(name)
            .ok_or_else(|| ScopeError::UnknownPredicate { scope: scope.name.clone(), name: name.clone() }),
    }
}
