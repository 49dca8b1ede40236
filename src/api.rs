use crate::engine::{self, Decision, RunMetrics, ScopeRegistry, ScopeTrace};
use crate::{Collection, CurrentScopes, Params, RequestContext, ScopeError};

/// Options that affect one invocation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Values applied as if they were request parameters, but only when
    /// neither parameters nor declared defaults resolved any scope.
    pub fallback_defaults: Option<Params>,
}

impl Options {
    pub fn with_fallback_defaults(fallback: Params) -> Self {
        Options { fallback_defaults: Some(fallback) }
    }
}

/// Result from [`apply`] and [`apply_with`].
#[derive(Debug)]
pub struct Applied<T> {
    /// The collection after every applied scope.
    pub collection: T,
    /// What was applied, keyed by alias-or-name, in registration order.
    pub current_scopes: CurrentScopes,
    pub metrics: RunMetrics,
}

impl<T> Applied<T> {
    pub fn into_parts(self) -> (T, CurrentScopes) {
        (self.collection, self.current_scopes)
    }
}

/// Additional details returned by [`apply_verbose_with`].
#[derive(Debug, Clone)]
pub struct ApplyDetails {
    /// One entry per declaration, in registration order.
    pub traces: Vec<ScopeTrace>,
}

impl ApplyDetails {
    pub fn applied(&self) -> impl Iterator<Item = &ScopeTrace> {
        self.traces.iter().filter(|t| t.decision.is_applied())
    }
}

/// Apply `registry` to `base` for the request described by `ctx`.
///
/// # Example
/// ```
/// use scopecraft::{CallLog, Scope, ScopeRegistry, StaticContext, apply};
///
/// let registry: ScopeRegistry<StaticContext, CallLog> = ScopeRegistry::new()
///     .with(Scope::new("color"))
///     .unwrap();
/// let ctx = StaticContext::new("index").with_param("color", "blue");
///
/// let out = apply(&registry, &ctx, CallLog::new()).unwrap();
/// assert_eq!(out.collection.methods(), vec!["color"]);
/// assert_eq!(out.current_scopes.get("color"), Some(&serde_json::json!("blue")));
/// ```
pub fn apply<C, T>(registry: &ScopeRegistry<C, T>, ctx: &C, base: T) -> Result<Applied<T>, ScopeError>
where
    C: RequestContext,
    T: Collection,
{
    apply_with(registry, ctx, base, &Options::default())
}

/// Like [`apply`], with explicit [`Options`].
pub fn apply_with<C, T>(
    registry: &ScopeRegistry<C, T>,
    ctx: &C,
    base: T,
    options: &Options,
) -> Result<Applied<T>, ScopeError>
where
    C: RequestContext,
    T: Collection,
{
    let run = engine::run(registry, ctx, base, options.fallback_defaults.as_ref())?;
    Ok(Applied { collection: run.collection, current_scopes: run.current_scopes, metrics: run.metrics })
}

/// Like [`apply_with`], and also report what was decided for every scope.
pub fn apply_verbose_with<C, T>(
    registry: &ScopeRegistry<C, T>,
    ctx: &C,
    base: T,
    options: &Options,
) -> Result<(Applied<T>, ApplyDetails), ScopeError>
where
    C: RequestContext,
    T: Collection,
{
    let run = engine::run(registry, ctx, base, options.fallback_defaults.as_ref())?;
    let traces = registry.iter().zip(run.decisions).map(|(scope, decision)| trace(scope, decision)).collect();

    let applied = Applied { collection: run.collection, current_scopes: run.current_scopes, metrics: run.metrics };
    Ok((applied, ApplyDetails { traces }))
}

fn trace<C, T>(scope: &crate::Scope<C, T>, decision: Decision) -> ScopeTrace {
    ScopeTrace { scope: scope.name().to_string(), key: scope.key().to_string(), decision }
}
