// Notification and audit log routes

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use eventdesk_core::AuditLogEntry;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common::{ApiResult, ErrorResponse, ListResponse};
use crate::auth::{AdminUser, AuthState, AuthUser, FromRef};
use crate::services::ActivityService;
use crate::storage::NotificationRow;

/// App state for activity routes
#[derive(Clone)]
pub struct ActivityState {
    pub service: Arc<ActivityService>,
    pub auth: AuthState,
}

impl FromRef<ActivityState> for AuthState {
    fn from_ref(input: &ActivityState) -> Self {
        input.auth.clone()
    }
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            title: row.title,
            message: row.message,
            link: row.link,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// Query parameters for activity listing
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of rows (1-500, default 50)
    pub limit: Option<i64>,
}

/// Create activity routes
pub fn routes(state: ActivityState) -> Router {
    Router::new()
        .route("/v1/notifications", get(list_notifications))
        .route("/v1/audit-logs", get(list_audit_logs))
        .with_state(state)
}

/// GET /v1/notifications - The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/v1/notifications",
    params(LimitQuery),
    responses(
        (status = 200, description = "Notifications", body = ListResponse<Notification>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "activity"
)]
pub async fn list_notifications(
    State(state): State<ActivityState>,
    user: AuthUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ListResponse<Notification>>> {
    let rows = state
        .service
        .notifications(&user.actor(), query.limit)
        .await?;
    Ok(Json(ListResponse::new(
        rows.into_iter().map(Notification::from).collect(),
    )))
}

/// GET /v1/audit-logs - Recent audit entries, newest first
#[utoipa::path(
    get,
    path = "/v1/audit-logs",
    params(LimitQuery),
    responses(
        (status = 200, description = "Audit entries", body = ListResponse<AuditLogEntry>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "activity"
)]
pub async fn list_audit_logs(
    State(state): State<ActivityState>,
    AdminUser(user): AdminUser,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<ListResponse<AuditLogEntry>>> {
    let entries = state.service.audit_logs(&user.actor(), query.limit).await?;
    Ok(Json(ListResponse::new(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_from_row() {
        let row = NotificationRow {
            id: Uuid::nil(),
            user_id: Uuid::now_v7(),
            title: "Registration confirmed".to_string(),
            message: "See you there".to_string(),
            link: None,
            is_read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(Notification::from(row)).unwrap();
        assert_eq!(json["isRead"], false);
        assert!(json.get("link").is_none());
        assert!(json.get("userId").is_none());
    }
}
