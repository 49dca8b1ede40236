#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Declare a scope with `option = value` pairs, each mapping onto the builder
/// method of the same name on [`Scope`](crate::Scope).
///
/// ```
/// use scopecraft::{CallLog, Scope, StaticContext, scope};
///
/// let only_tall: Scope<StaticContext, CallLog> = scope!("only_tall", value_type = scopecraft::ValueType::Boolean, only = ["index"]);
/// assert_eq!(only_tall.name(), "only_tall");
/// ```
#[macro_export]
macro_rules! scope {
    ($name:expr $(, $opt:ident = $val:expr)* $(,)?) => {{
        let scope = $crate::Scope::new($name);
        $( let scope = scope.$opt($val); )*
        scope
    }};
}
