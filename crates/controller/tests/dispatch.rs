//! End-to-end dispatch through the registry and console sessions.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter, ActionParams,
    ParamsExt, ToolCall,
};
use switchboard_controller::{
    ConsoleSession, ControllerRegistry, DispatchPolicy, PageController, RouteTable,
};
use switchboard_core::{OrganizationContext, UserContext};
use switchboard_telemetry::{ActionEventKind, AuditLogger, Instrumentation, MemoryAuditSink, names};

// ── Helpers ─────────────────────────────────────────────────────────────

fn params(value: Value) -> ActionParams {
    match value {
        Value::Object(map) => map,
        _ => ActionParams::new(),
    }
}

fn org() -> OrganizationContext {
    OrganizationContext::new("org-1", "Acme")
}

fn reader() -> UserContext {
    UserContext::new("reader").with_permission("x:read")
}

/// Page `x` with `getX` (needs `x:read`), `boom` (always fails), and
/// `openY` (navigation to `/y`).
fn x_page(instrumentation: Instrumentation) -> PageController {
    let page = PageController::named("x", "X", instrumentation);
    page.register_action(
        ActionMetadata::new("getX", "Get X", "Fetch an X")
            .with_permission("x:read")
            .with_parameter(ActionParameter::string("name").required()),
        |params: ActionParams, ctx: ActionContext| async move {
            let name = params.required_str("name")?.to_owned();
            Ok::<_, ActionError>(json!({
                "name": name,
                "organizationId": ctx.organization_id(),
            }))
        },
    );
    page.register_action(
        ActionMetadata::new("boom", "Boom", "Always fails").with_permission("x:read"),
        |_: ActionParams, _: ActionContext| async {
            Err::<Value, _>(ActionError::execution("boom"))
        },
    );
    page.register_action(
        ActionMetadata::new("openY", "Open Y", "Go to Y")
            .with_category(ActionCategory::Navigation)
            .with_organization_required(false),
        |_: ActionParams, _: ActionContext| async {
            Ok::<_, ActionError>(json!({"path": "/y/42"}))
        },
    );
    page
}

fn registry(policy: DispatchPolicy) -> Arc<ControllerRegistry> {
    let registry = ControllerRegistry::new(Instrumentation::new(64)).with_policy(policy);
    registry.register_page_controller(x_page(registry.instrumentation().clone()));
    Arc::new(registry)
}

fn routes() -> Arc<RouteTable> {
    Arc::new(
        RouteTable::new()
            .with_route("/x", "x")
            .and_then(|t| t.with_route("/y/:id", "y"))
            .unwrap(),
    )
}

// ── Dispatch ────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_x_needs_organization() {
    let registry = registry(DispatchPolicy::enforcing());

    let without = registry
        .execute_action("getX", params(json!({"name": "a"})), ActionContext::new(reader()))
        .await;
    assert!(!without.success);
    assert_eq!(
        without.error.as_deref(),
        Some("Organization ID is required for this operation")
    );

    let with = registry
        .execute_action(
            "getX",
            params(json!({"name": "a"})),
            ActionContext::new(reader()).with_organization(org()),
        )
        .await;
    assert!(with.success, "{:?}", with.error);
    assert_eq!(with.data, Some(json!({"name": "a", "organizationId": "org-1"})));
    assert_eq!(with.message.as_deref(), Some("Get X executed successfully"));
}

#[tokio::test]
async fn advisory_dispatch_still_checks_organization_in_wrapper() {
    let registry = registry(DispatchPolicy::advisory());
    let result = registry
        .execute_action("getX", params(json!({"name": "a"})), ActionContext::new(reader()))
        .await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Organization ID is required for this operation")
    );
}

#[tokio::test]
async fn executor_error_is_reported_verbatim() {
    let registry = registry(DispatchPolicy::enforcing());
    let result = registry
        .execute_action(
            "boom",
            ActionParams::new(),
            ActionContext::new(reader()).with_organization(org()),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("boom"));
    assert_eq!(result.metadata.action_id, "boom");
    assert_eq!(result.metadata.user_id, "reader");
}

#[tokio::test]
async fn unknown_action_fails_without_panicking() {
    let registry = registry(DispatchPolicy::enforcing());
    let result = registry
        .execute_action("nope", ActionParams::new(), ActionContext::new(reader()))
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Action not found: nope"));
}

#[tokio::test]
async fn re_registration_replaces_definition() {
    let registry = registry(DispatchPolicy::advisory());
    registry
        .register_action(
            "x",
            ActionMetadata::new("getX", "Get X v2", "Replacement").with_organization_required(false),
            |_: ActionParams, _: ActionContext| async { Ok::<_, ActionError>(json!("v2")) },
        )
        .unwrap();

    let result = registry
        .execute_action("getX", ActionParams::new(), ActionContext::new(reader()))
        .await;
    assert_eq!(result.data, Some(json!("v2")));
    assert_eq!(registry.action("getX").unwrap().metadata().name, "Get X v2");
    assert_eq!(registry.statistics().total_actions, 3);
}

#[tokio::test]
async fn enforcing_dispatch_denies_and_emits_event() {
    let registry = registry(DispatchPolicy::enforcing());
    let mut events = registry.instrumentation().events().subscribe();
    let stranger = UserContext::new("stranger");

    let result = registry
        .execute_action(
            "getX",
            params(json!({"name": "a"})),
            ActionContext::new(stranger).with_organization(org()),
        )
        .await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Missing required permissions: x:read")
    );
    let event = events.try_recv().expect("denial event");
    assert_eq!(event.kind, ActionEventKind::PermissionDenied);
    assert_eq!(event.page_id, "x");
    assert_eq!(event.data.params.get("name"), Some(&json!("a")));
    assert_eq!(registry.statistics().denied, 1);
}

#[tokio::test]
async fn advisory_dispatch_lets_callers_through() {
    let registry = registry(DispatchPolicy::advisory());
    let result = registry
        .execute_action(
            "getX",
            params(json!({"name": "a"})),
            ActionContext::new(UserContext::new("stranger")).with_organization(org()),
        )
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn system_admin_bypasses_permissions() {
    let registry = registry(DispatchPolicy::enforcing());
    let admin = UserContext::new("root").with_role("SystemAdmin");
    let result = registry
        .execute_action(
            "getX",
            params(json!({"name": "a"})),
            ActionContext::new(admin).with_organization(org()),
        )
        .await;
    assert!(result.success);
}

#[tokio::test]
async fn concurrent_dispatches_are_independent() {
    let registry = registry(DispatchPolicy::enforcing());
    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .execute_action(
                    "getX",
                    params(json!({"name": format!("n{i}")})),
                    ActionContext::new(reader()).with_organization(org()),
                )
                .await
        }));
    }
    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.data.unwrap()["name"], json!(format!("n{i}")));
    }
    let snapshot = registry.instrumentation().metrics().snapshot();
    assert_eq!(snapshot.counter(names::ACTIONS_EXECUTED_TOTAL), 16);
}

// ── Availability ────────────────────────────────────────────────────────

#[test]
fn availability_filters_by_permission() {
    let registry = registry(DispatchPolicy::enforcing());
    let org = org();

    let ids = |user: &UserContext| -> Vec<String> {
        registry
            .get_available_actions(user, Some(&org))
            .into_iter()
            .map(|m| m.id)
            .collect()
    };
    assert_eq!(ids(&reader()), vec!["getX", "boom", "openY"]);
    assert_eq!(ids(&UserContext::new("stranger")), vec!["openY"]);

    assert!(registry.can_execute_action("getX", &reader(), Some(&org)));
    assert!(!registry.can_execute_action("getX", &reader(), None));
    assert!(!registry.can_execute_action("missing", &reader(), Some(&org)));

    let tools = registry.tool_definitions(&reader(), Some(&org));
    assert_eq!(tools[0].name, "getX");
    assert_eq!(tools[0].parameters["required"], json!(["name"]));
}

// ── Sessions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_builds_context_and_follows_navigation() {
    let registry = registry(DispatchPolicy::enforcing());
    registry
        .page_controller("x")
        .unwrap()
        .set_state("selected", json!("a"));

    let mut session = ConsoleSession::new(registry.clone(), routes(), reader())
        .with_organization(org());
    assert_eq!(session.current_page(), None);
    assert_eq!(session.navigate("/x"), Some("x"));

    let ctx = session.context_for("getX");
    assert_eq!(ctx.page_id(), Some("x"));
    assert_eq!(ctx.navigation.current_path, "/x");
    let page = ctx.page.as_ref().unwrap();
    assert_eq!(page.state.get("selected"), Some(&json!("a")));

    let result = session.execute_action("openY", ActionParams::new()).await;
    assert!(result.success);
    assert_eq!(session.navigation().current_path, "/y/42");
    assert_eq!(session.current_page(), Some("y"));
    assert_eq!(session.navigation().breadcrumbs.len(), 2);
}

#[tokio::test]
async fn tool_calls_dispatch_by_sanitized_name() {
    let registry = registry(DispatchPolicy::enforcing());
    let mut session =
        ConsoleSession::new(registry, routes(), reader()).with_organization(org());

    let result = session
        .execute_tool_call(ToolCall::new("getX", json!({"name": "tool"})))
        .await;
    assert!(result.success);
    assert_eq!(result.data.unwrap()["name"], json!("tool"));

    let result = session
        .execute_tool_call(ToolCall::new("unknown_tool", json!({})))
        .await;
    assert_eq!(result.error.as_deref(), Some("Action not found: unknown_tool"));
}

#[tokio::test]
async fn audit_logger_records_every_outcome() {
    let registry = registry(DispatchPolicy::enforcing());
    let sink = Arc::new(MemoryAuditSink::new());
    let logger = AuditLogger::spawn(registry.instrumentation().events(), sink.clone());

    let ctx = || ActionContext::new(reader()).with_organization(org());
    registry
        .execute_action("getX", params(json!({"name": "a"})), ctx())
        .await;
    registry.execute_action("boom", ActionParams::new(), ctx()).await;
    registry
        .execute_action(
            "getX",
            ActionParams::new(),
            ActionContext::new(UserContext::new("stranger")).with_organization(org()),
        )
        .await;

    assert_eq!(logger.shutdown().await, 3);
    let kinds: Vec<ActionEventKind> = sink.events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActionEventKind::ActionExecuted,
            ActionEventKind::ActionFailed,
            ActionEventKind::PermissionDenied,
        ]
    );
}
