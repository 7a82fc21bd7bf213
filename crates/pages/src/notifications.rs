//! Per-user notifications inside an organization.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_action::{
    ActionCategory, ActionContext, ActionError, ActionMetadata, ActionParameter,
};
use switchboard_controller::{PageConfig, PageController};
use switchboard_store::{Query, Record};
use switchboard_telemetry::Instrumentation;

use crate::scope::{NoParams, load_owned, non_empty, organization_id, owned_record, scoped, to_json};
use crate::services::{PageServices, bind, register};

/// Page id.
pub const PAGE_ID: &str = "notifications";

/// Record class.
pub const CLASS: &str = "Notification";

/// Unread notifications addressed to `user_id`.
pub(crate) fn unread_for(organization_id: &str, user_id: &str) -> Query {
    scoped(CLASS, organization_id)
        .equal_to("userId", user_id)
        .equal_to("read", false)
}

/// Build the notifications page.
pub fn notifications_page(services: &PageServices, instrumentation: Instrumentation) -> PageController {
    let page = PageController::new(
        PageConfig::new(PAGE_ID, "Notifications")
            .describe("Messages addressed to the current user")
            .with_category("overview")
            .with_permission("notifications:read"),
        instrumentation,
    );

    register(
        &page,
        ActionMetadata::new("notifications.list", "List Notifications", "Newest notifications for the current user")
            .with_category(ActionCategory::Data)
            .with_permission("notifications:read")
            .with_parameter(ActionParameter::boolean("unreadOnly").describe("Only unread notifications"))
            .with_parameter(ActionParameter::integer("limit").describe("Maximum number returned").range(1.0, 200.0)),
        bind(services, list),
    );

    register(
        &page,
        ActionMetadata::new("notifications.unread_count", "Unread Count", "Number of unread notifications")
            .with_category(ActionCategory::Data)
            .with_permission("notifications:read"),
        bind(services, unread_count),
    );

    register(
        &page,
        ActionMetadata::new("notifications.mark_read", "Mark Read", "Mark one or all notifications as read")
            .with_category(ActionCategory::Ui)
            .with_permission("notifications:read")
            .with_parameter(ActionParameter::string("notificationId").describe("Notification to mark"))
            .with_parameter(ActionParameter::boolean("all").describe("Mark every unread notification")),
        bind(services, mark_read),
    );

    register(
        &page,
        ActionMetadata::new("notifications.send", "Send Notification", "Notify a user in the organization")
            .with_category(ActionCategory::Data)
            .with_permission("notifications:send")
            .with_parameter(ActionParameter::string("userId").required().describe("Recipient"))
            .with_parameter(ActionParameter::string("title").required().describe("Headline"))
            .with_parameter(ActionParameter::string("body").describe("Message text")),
        bind(services, send),
    );

    page
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    #[serde(default)]
    unread_only: bool,
    limit: Option<usize>,
}

async fn list(services: PageServices, p: ListParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let query = if p.unread_only {
        unread_for(&org, &ctx.user.id)
    } else {
        scoped(CLASS, &org).equal_to("userId", ctx.user.id.as_str())
    };
    let records = services
        .store
        .find(&query.descending("createdAt").limit(p.limit.unwrap_or(50)))
        .await?;
    Ok(json!({ "results": to_json(&records), "count": records.len() }))
}

async fn unread_count(services: PageServices, _: NoParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let unread = services.store.count(&unread_for(&org, &ctx.user.id)).await?;
    Ok(json!({ "unread": unread }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkRead {
    notification_id: Option<String>,
    #[serde(default)]
    all: bool,
}

async fn mark_read(services: PageServices, p: MarkRead, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let store = services.store.as_ref();

    let targets = match (p.notification_id, p.all) {
        (_, true) => store.find(&unread_for(&org, &ctx.user.id)).await?,
        (Some(id), false) => {
            let record = load_owned(store, CLASS, &id, &org).await?;
            if record.get_str("userId") != Some(ctx.user.id.as_str()) {
                return Err(switchboard_store::StoreError::not_found(CLASS, id).into());
            }
            vec![record]
        }
        (None, false) => {
            return Err(ActionError::validation("notificationId or all is required"));
        }
    };

    let now = Utc::now().to_rfc3339();
    let mut marked = 0;
    for record in targets {
        let Some(id) = record.object_id else { continue };
        store
            .save(Record::with_id(CLASS, id).with_field("read", true).with_field("readAt", now.as_str()))
            .await?;
        marked += 1;
    }
    Ok(json!({ "marked": marked }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendParams {
    user_id: String,
    title: String,
    #[serde(default)]
    body: String,
}

async fn send(services: PageServices, p: SendParams, ctx: ActionContext) -> Result<Value, ActionError> {
    let org = organization_id(&ctx)?;
    let title = non_empty("title", &p.title)?;
    let record = owned_record(CLASS, &org)
        .with_field("userId", p.user_id.as_str())
        .with_field("title", title)
        .with_field("body", p.body.as_str())
        .with_field("read", false)
        .with_field("sentBy", ctx.user.id.as_str());
    let saved = services.store.save(record).await?;
    tracing::debug!(recipient = %p.user_id, "notification sent");
    Ok(saved.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use switchboard_action::{Action, ActionParams};
    use switchboard_core::UserContext;

    fn params(value: Value) -> ActionParams {
        match value {
            Value::Object(map) => map,
            _ => ActionParams::new(),
        }
    }

    fn ctx(user: &str) -> ActionContext {
        ActionContext::new(UserContext::new(user).with_organization("org-1"))
    }

    #[tokio::test]
    async fn send_then_read_everything() {
        let (services, _, _) = PageServices::in_memory();
        let page = notifications_page(&services, Instrumentation::default());

        for title in ["Deploy finished", "Report ready"] {
            let sent = page
                .action("notifications.send")
                .unwrap()
                .execute(params(json!({"userId": "u-2", "title": title})), ctx("u-1"))
                .await;
            assert!(sent.success, "{:?}", sent.error);
        }

        let count = page.action("notifications.unread_count").unwrap();
        let unread = count.execute(ActionParams::new(), ctx("u-2")).await;
        assert_eq!(unread.data, Some(json!({"unread": 2})));
        let other = count.execute(ActionParams::new(), ctx("u-1")).await;
        assert_eq!(other.data, Some(json!({"unread": 0})));

        let marked = page
            .action("notifications.mark_read")
            .unwrap()
            .execute(params(json!({"all": true})), ctx("u-2"))
            .await;
        assert_eq!(marked.data, Some(json!({"marked": 2})));
        let unread = count.execute(ActionParams::new(), ctx("u-2")).await;
        assert_eq!(unread.data, Some(json!({"unread": 0})));
    }

    #[tokio::test]
    async fn cannot_mark_someone_elses_notification() {
        let (services, store, _) = PageServices::in_memory();
        let theirs = store.insert(
            owned_record(CLASS, "org-1")
                .with_field("userId", "u-2")
                .with_field("read", false),
        );
        let page = notifications_page(&services, Instrumentation::default());

        let result = page
            .action("notifications.mark_read")
            .unwrap()
            .execute(
                params(json!({"notificationId": theirs.object_id.unwrap()})),
                ctx("u-1"),
            )
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn mark_read_needs_a_target() {
        let (services, _, _) = PageServices::in_memory();
        let page = notifications_page(&services, Instrumentation::default());
        let result = page
            .action("notifications.mark_read")
            .unwrap()
            .execute(ActionParams::new(), ctx("u-1"))
            .await;
        assert_eq!(
            result.error.as_deref(),
            Some("Validation failed: notificationId or all is required")
        );
    }
}
