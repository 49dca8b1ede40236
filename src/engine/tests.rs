use crate::{
    Applied, Call, CallLog, Collection, Decision, Options, Params, RequestContext, Scope, ScopeError, ScopeRegistry,
    ValueSource, apply, apply_verbose_with, apply_with,
};
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A request against the trees listing.
struct TreeRequest {
    action: &'static str,
    params: Params,
    session_height: Option<i64>,
    object_id: u64,
    restrict_to_only_tall_trees: bool,
    show_all_colors: bool,
}

impl TreeRequest {
    fn new(action: &'static str, params: Value) -> Self {
        TreeRequest {
            action,
            params: params.as_object().cloned().unwrap_or_default(),
            session_height: None,
            object_id: 4242,
            restrict_to_only_tall_trees: true,
            show_all_colors: false,
        }
    }
}

impl RequestContext for TreeRequest {
    fn action(&self) -> &str {
        self.action
    }

    fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

static TREES: Lazy<ScopeRegistry<TreeRequest, CallLog>> = Lazy::new(|| {
    ScopeRegistry::from_scopes([
        Scope::new("color").unless(|r: &TreeRequest| r.show_all_colors),
        Scope::new("only_tall").boolean().only(["index"]).when(|r: &TreeRequest| r.restrict_to_only_tall_trees),
        Scope::new("shadown_range").default(10).except(["index", "show", "new"]),
        Scope::new("always_shadown_range").default(20).always(true).only(["other_edit"]),
        Scope::new("ignored_always_shadown_range").always(true).only(["another_edit"]),
        Scope::new("root_type").param_key("root").allow_blank(true),
        Scope::new("calculate_height")
            .default_with(|r: &TreeRequest| json!(r.session_height.unwrap_or(20)))
            .only(["new"]),
        Scope::new("paginate").hash(),
        Scope::new("args_paginate").hash().using(["page", "per_page"]),
        Scope::new("categories").array(),
        Scope::new("only_short").boolean().transform(|r: &TreeRequest, trees: CallLog, _args: &[Value]| {
            Ok(trees.record("only_really_short!", vec![json!(r.object_id)]))
        }),
        Scope::new("by_category").transform(|r: &TreeRequest, trees: CallLog, args: &[Value]| {
            let category = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| ScopeError::transform("by_category", "expected a category name"))?;
            Ok(trees.record("by_given_category", vec![json!(r.object_id), json!(format!("{category}_id"))]))
        }),
    ])
    .unwrap()
});

fn get(request: TreeRequest) -> Applied<CallLog> {
    apply(&TREES, &request, CallLog::new()).unwrap()
}

fn call(method: &str, args: Vec<Value>) -> Call {
    Call { method: method.to_string(), args }
}

#[test]
fn boolean_scope_is_called_when_param_is_true() {
    let out = get(TreeRequest::new("index", json!({"only_tall": "true"})));
    assert_eq!(out.collection.calls(), &[call("only_tall", vec![])]);
    assert_eq!(out.current_scopes.to_json(), json!({"only_tall": true}));
}

#[test]
fn boolean_scope_is_not_called_when_param_is_false() {
    let out = get(TreeRequest::new("index", json!({"only_tall": "false"})));
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn scope_is_called_only_on_listed_actions() {
    let out = get(TreeRequest::new("show", json!({"only_tall": "true", "id": "42"})));
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn scope_is_skipped_when_if_guard_is_false() {
    let mut request = TreeRequest::new("index", json!({"only_tall": "true"}));
    request.restrict_to_only_tall_trees = false;
    let out = get(request);
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn scope_is_skipped_when_unless_guard_is_true() {
    let mut request = TreeRequest::new("index", json!({"color": "blue"}));
    request.show_all_colors = true;
    let out = get(request);
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn scope_is_not_called_on_excepted_actions() {
    let out = get(TreeRequest::new("index", json!({"shadown_range": 20})));
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn scope_is_called_with_arguments() {
    let out = get(TreeRequest::new("index", json!({"color": "blue"})));
    assert_eq!(out.collection.calls(), &[call("color", vec![json!("blue")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"color": "blue"}));
}

#[test]
fn blank_value_is_ignored() {
    let out = get(TreeRequest::new("index", json!({"color": ""})));
    assert!(out.collection.is_empty());
    assert!(out.current_scopes.is_empty());
}

#[test]
fn blank_value_is_applied_when_allowed() {
    let out = get(TreeRequest::new("index", json!({"root": ""})));
    assert_eq!(out.collection.calls(), &[call("root_type", vec![json!("")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"root": ""}));
}

#[test]
fn blank_value_falls_back_to_default() {
    let out = get(TreeRequest::new("edit", json!({"shadown_range": ""})));
    assert_eq!(out.collection.calls(), &[call("shadown_range", vec![json!(10)])]);
}

#[test]
fn multiple_scopes_apply_in_registration_order() {
    // Parameter order is the reverse of declaration order.
    let out = get(TreeRequest::new("index", json!({"only_tall": "true", "color": "blue"})));
    assert_eq!(out.collection.methods(), vec!["color", "only_tall"]);
    assert_eq!(out.current_scopes.keys(), vec!["color", "only_tall"]);
    assert_eq!(out.current_scopes.to_json(), json!({"color": "blue", "only_tall": true}));
}

#[test]
fn hash_scope_receives_the_mapping() {
    let hash = json!({"page": "1", "per_page": "10"});
    let out = get(TreeRequest::new("index", json!({"paginate": hash.clone()})));
    assert_eq!(out.collection.calls(), &[call("paginate", vec![hash.clone()])]);
    assert_eq!(out.current_scopes.to_json(), json!({"paginate": hash}));
}

#[test]
fn hash_scope_with_using_receives_positional_arguments() {
    let hash = json!({"page": "1", "per_page": "10"});
    let out = get(TreeRequest::new("index", json!({"args_paginate": hash.clone()})));
    assert_eq!(out.collection.calls(), &[call("args_paginate", vec![json!("1"), json!("10")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"args_paginate": hash}));
}

#[test]
fn array_scope_receives_the_sequence() {
    let list = json!(["book", "kitchen", "sport"]);
    let out = get(TreeRequest::new("index", json!({"categories": list.clone()})));
    assert_eq!(out.collection.calls(), &[call("categories", vec![list.clone()])]);
    assert_eq!(out.current_scopes.to_json(), json!({"categories": list}));
}

#[test]
fn mapping_for_scalar_scope_is_rejected() {
    let request = TreeRequest::new("index", json!({"color": {"blue": "red"}}));
    let err = apply(&TREES, &request, CallLog::new()).unwrap_err();
    assert!(matches!(err, ScopeError::TypeMismatch { ref scope, .. } if scope == "color"));
    assert!(err.is_input_error());
}

#[test]
fn type_error_prevents_every_call() {
    let registry: ScopeRegistry<TreeRequest, CallLog> = ScopeRegistry::from_scopes([
        Scope::new("color").transform(|_: &TreeRequest, _: CallLog, _: &[Value]| -> Result<CallLog, ScopeError> {
            panic!("color must not be applied when a later scope fails to coerce")
        }),
        Scope::new("paginate").hash(),
    ])
    .unwrap();

    let request = TreeRequest::new("index", json!({"color": "red", "paginate": "1"}));
    let err = apply(&registry, &request, CallLog::new()).unwrap_err();
    assert!(matches!(err, ScopeError::TypeMismatch { ref scope, found: "a string", .. } if scope == "paginate"));
}

#[test]
fn scope_is_called_with_default_value() {
    let out = get(TreeRequest::new("edit", json!({"id": "42"})));
    assert_eq!(out.collection.calls(), &[call("shadown_range", vec![json!(10)])]);
    assert_eq!(out.current_scopes.to_json(), json!({"shadown_range": 10}));
}

#[test]
fn default_value_can_be_overwritten() {
    let out = get(TreeRequest::new("edit", json!({"id": "42", "shadown_range": "20"})));
    assert_eq!(out.collection.calls(), &[call("shadown_range", vec![json!("20")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"shadown_range": "20"}));
}

#[test]
fn default_is_suppressed_when_any_scope_is_given() {
    let out = get(TreeRequest::new("edit", json!({"id": "42", "color": "red"})));
    assert_eq!(out.collection.calls(), &[call("color", vec![json!("red")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"color": "red"}));
}

#[test]
fn always_default_applies_alongside_given_scopes() {
    let out = get(TreeRequest::new("other_edit", json!({"id": "42", "color": "red"})));
    assert_eq!(
        out.collection.calls(),
        &[call("color", vec![json!("red")]), call("always_shadown_range", vec![json!(20)])]
    );
    assert_eq!(out.current_scopes.to_json(), json!({"always_shadown_range": 20, "color": "red"}));
}

#[test]
fn always_default_declared_first_runs_first() {
    let registry: ScopeRegistry<TreeRequest, CallLog> =
        ScopeRegistry::from_scopes([Scope::new("pinned").default(1).always(true), Scope::new("color")]).unwrap();
    let out = apply(&registry, &TreeRequest::new("index", json!({"color": "red"})), CallLog::new()).unwrap();
    assert_eq!(out.collection.methods(), vec!["pinned", "color"]);
    assert_eq!(out.current_scopes.keys(), vec!["pinned", "color"]);
    assert_eq!(out.current_scopes.to_json(), json!({"color": "red", "pinned": 1}));
}

#[test]
fn always_without_default_is_ignored() {
    let out = get(TreeRequest::new("another_edit", json!({"id": "42", "color": "red"})));
    assert_eq!(out.collection.calls(), &[call("color", vec![json!("red")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"color": "red"}));
}

#[test]
fn scope_reads_and_records_its_alias() {
    let out = get(TreeRequest::new("show", json!({"id": "42", "root": "outside"})));
    assert_eq!(out.collection.calls(), &[call("root_type", vec![json!("outside")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"root": "outside"}));
}

#[test]
fn deferred_default_reads_the_request() {
    let mut request = TreeRequest::new("new", json!({}));
    request.session_height = Some(100);
    let out = get(request);
    assert_eq!(out.collection.calls(), &[call("calculate_height", vec![json!(100)])]);
    assert_eq!(out.current_scopes.to_json(), json!({"calculate_height": 100}));

    let out = get(TreeRequest::new("new", json!({})));
    assert_eq!(out.current_scopes.to_json(), json!({"calculate_height": 20}));
}

#[test]
fn boolean_transform_receives_the_request() {
    let out = get(TreeRequest::new("index", json!({"only_short": "true"})));
    assert_eq!(out.collection.calls(), &[call("only_really_short!", vec![json!(4242)])]);
    assert_eq!(out.current_scopes.to_json(), json!({"only_short": true}));
}

#[test]
fn value_transform_receives_the_request_and_value() {
    let out = get(TreeRequest::new("index", json!({"by_category": "for"})));
    assert_eq!(out.collection.calls(), &[call("by_given_category", vec![json!(4242), json!("for_id")])]);
    assert_eq!(out.current_scopes.to_json(), json!({"by_category": "for"}));
}

#[test]
fn transform_errors_abort_the_run() {
    let request = TreeRequest::new("index", json!({"by_category": ["for"]}));
    let err = apply(&TREES, &request, CallLog::new()).unwrap_err();
    assert_eq!(err.code(), "TRANSFORM_FAILED");
}

#[test]
fn repeated_runs_are_identical() {
    let request = TreeRequest::new("index", json!({"color": "blue", "only_tall": "true", "root": "x"}));
    let first = get(TreeRequest::new("index", request.params.clone().into()));
    let second = get(request);
    assert_eq!(first.collection, second.collection);
    assert_eq!(first.current_scopes, second.current_scopes);
}

#[test]
fn suppressed_deferred_defaults_are_never_evaluated() {
    let evaluated = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluated);
    let registry: ScopeRegistry<TreeRequest, CallLog> = ScopeRegistry::from_scopes([
        Scope::new("color"),
        Scope::new("size").default_with(move |_: &TreeRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            json!("huge")
        }),
    ])
    .unwrap();

    let out = apply(&registry, &TreeRequest::new("index", json!({"color": "red"})), CallLog::new()).unwrap();
    assert_eq!(out.current_scopes.to_json(), json!({"color": "red"}));
    assert_eq!(evaluated.load(Ordering::SeqCst), 0);

    let out = apply(&registry, &TreeRequest::new("index", json!({})), CallLog::new()).unwrap();
    assert_eq!(out.current_scopes.to_json(), json!({"size": "huge"}));
    assert_eq!(evaluated.load(Ordering::SeqCst), 1);
}

#[test]
fn boolean_false_does_not_trigger_the_default() {
    let registry: ScopeRegistry<TreeRequest, CallLog> =
        ScopeRegistry::from_scopes([Scope::new("only_tall").boolean().default(true), Scope::new("size").default(3)])
            .unwrap();

    let out = apply(&registry, &TreeRequest::new("index", json!({"only_tall": "false"})), CallLog::new()).unwrap();
    assert_eq!(out.collection.calls(), &[call("size", vec![json!(3)])]);

    let out = apply(&registry, &TreeRequest::new("index", json!({})), CallLog::new()).unwrap();
    assert_eq!(out.collection.calls(), &[call("only_tall", vec![]), call("size", vec![json!(3)])]);
}

#[test]
fn fallback_defaults_apply_only_when_nothing_resolved() {
    let registry: ScopeRegistry<TreeRequest, CallLog> = ScopeRegistry::from_scopes([
        Scope::new("color"),
        Scope::new("size"),
        Scope::new("shadown_range").default(10).only(["show"]),
    ])
    .unwrap();
    let options = Options::with_fallback_defaults(json!({"size": "huge", "color": "red"}).as_object().cloned().unwrap());

    let out = apply_with(&registry, &TreeRequest::new("index", json!({})), CallLog::new(), &options).unwrap();
    assert_eq!(out.collection.calls(), &[call("color", vec![json!("red")]), call("size", vec![json!("huge")])]);

    let out = apply_with(&registry, &TreeRequest::new("index", json!({"size": "tiny"})), CallLog::new(), &options)
        .unwrap();
    assert_eq!(out.collection.calls(), &[call("size", vec![json!("tiny")])]);
    assert!(out.metrics.fallback.is_none());

    let out = apply_with(&registry, &TreeRequest::new("show", json!({})), CallLog::new(), &options).unwrap();
    assert_eq!(out.current_scopes.to_json(), json!({"shadown_range": 10}));
}

#[test]
fn verbose_run_explains_suppression() {
    let request = TreeRequest::new("edit", json!({"color": "red", "only_tall": "true"}));
    let (_, details) = apply_verbose_with(&TREES, &request, CallLog::new(), &Options::default()).unwrap();

    let decision = |name: &str| details.traces.iter().find(|t| t.scope == name).map(|t| t.decision);
    assert_eq!(decision("color"), Some(Decision::Applied(ValueSource::Param)));
    assert_eq!(decision("only_tall"), Some(Decision::ExcludedByAction));
    assert_eq!(decision("shadown_range"), Some(Decision::Suppressed));
    assert_eq!(decision("root_type"), Some(Decision::Absent));
}

/// A collection that only understands `color`.
#[derive(Debug, Default)]
struct ColorOnly(Vec<String>);

impl Collection for ColorOnly {
    fn call_scope(mut self, name: &str, args: &[Value]) -> Result<Self, ScopeError> {
        match name {
            "color" => {
                self.0.extend(args.iter().filter_map(Value::as_str).map(str::to_string));
                Ok(self)
            }
            other => Err(ScopeError::UnknownMethod(other.to_string())),
        }
    }
}

#[test]
fn unknown_collection_methods_are_reported() {
    let registry: ScopeRegistry<TreeRequest, ColorOnly> =
        ScopeRegistry::from_scopes([Scope::new("color"), Scope::new("size")]).unwrap();

    let out = apply(&registry, &TreeRequest::new("index", json!({"color": "red"})), ColorOnly::default()).unwrap();
    assert_eq!(out.collection.0, vec!["red"]);

    let err = apply(&registry, &TreeRequest::new("index", json!({"size": "huge"})), ColorOnly::default()).unwrap_err();
    assert!(matches!(err, ScopeError::UnknownMethod(ref name) if name == "size"));
}

#[test]
fn concurrent_runs_share_the_registry() {
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                s.spawn(move || {
                    let color = format!("color-{i}");
                    let out = get(TreeRequest::new("index", json!({"color": color.clone()})));
                    (color, out)
                })
            })
            .collect();

        for handle in handles {
            let (color, out) = handle.join().unwrap();
            assert_eq!(out.collection.calls(), &[call("color", vec![json!(color.clone())])]);
            assert_eq!(out.current_scopes.to_json(), json!({"color": color}));
        }
    });
}
