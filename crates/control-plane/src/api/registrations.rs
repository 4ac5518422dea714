// Registration HTTP routes
// Decision: Status and action arrive as strings and are parsed here, so a bad
// value is a 400 with a message rather than a body rejection

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use eventdesk_core::{BulkAction, RegistrationDetail, RegistrationStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ApiResult, ErrorResponse, ListResponse};
use super::validation::{normalize_reason, parse_ids};
use crate::auth::{AdminUser, AuthState, AuthUser, FromRef};
use crate::services::RegistrationService;

/// App state for registration routes
#[derive(Clone)]
pub struct RegistrationsState {
    pub service: Arc<RegistrationService>,
    pub auth: AuthState,
}

impl FromRef<RegistrationsState> for AuthState {
    fn from_ref(input: &RegistrationsState) -> Self {
        input.auth.clone()
    }
}

/// Request to change one registration's status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status: pending, confirmed, waitlisted, cancelled, attended, no-show, rejected
    #[schema(example = "confirmed")]
    pub status: String,
    /// Optional reason, included in the attendee email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub ok: bool,
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub previous_status: RegistrationStatus,
}

/// Request to apply one action to many registrations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRequest {
    /// 1 to 50 registration ids
    pub ids: Vec<String>,
    /// approve, reject, attend, noshow or delete
    #[schema(example = "approve")]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkResponse {
    pub ok: bool,
    /// Rows the action was applied to
    pub processed: usize,
    /// Requested ids that were missing or not eligible
    pub skipped: usize,
}

/// Request to register for an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,
    /// Register someone else (admin only). Defaults to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateRegistrationResponse {
    pub ok: bool,
    /// pending when slots remain, waitlisted otherwise
    pub status: RegistrationStatus,
    pub registration: RegistrationDetail,
}

/// Optional body for a self-service cancellation
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CancelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

/// Create registration routes
pub fn routes(state: RegistrationsState) -> Router {
    Router::new()
        .route("/v1/registrations", post(create_registration))
        .route("/v1/registrations/bulk", post(bulk_registrations))
        .route(
            "/v1/registrations/:id",
            patch(transition_registration)
                .get(get_registration)
                .delete(delete_registration),
        )
        .route("/v1/registrations/:id/cancel", post(cancel_registration))
        .route("/v1/events/:id/registrations", get(list_event_registrations))
        .with_state(state)
}

/// PATCH /v1/registrations/{id} - Change a registration's status
#[utoipa::path(
    patch,
    path = "/v1/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration ID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status changed", body = TransitionResponse),
        (status = 400, description = "Invalid status", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse),
        (status = 500, description = "Capacity exceeded or internal error", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn transition_registration(
    State(state): State<RegistrationsState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<TransitionResponse>> {
    let next: RegistrationStatus = req.status.parse()?;
    let reason = normalize_reason(req.reason)?;

    let outcome = state
        .service
        .transition(&user.actor(), id, next, reason)
        .await?
        .into_value();

    Ok(Json(TransitionResponse {
        ok: true,
        id,
        status: outcome.status(),
        previous_status: outcome.previous,
    }))
}

/// POST /v1/registrations/bulk - Apply one action to many registrations
///
/// All approvals in the batch succeed or none do. Ids that are missing or not
/// eligible for the action are counted as skipped.
#[utoipa::path(
    post,
    path = "/v1/registrations/bulk",
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Batch applied", body = BulkResponse),
        (status = 400, description = "Invalid action or id list", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
        (status = 500, description = "Capacity exceeded or internal error", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn bulk_registrations(
    State(state): State<RegistrationsState>,
    AdminUser(user): AdminUser,
    Json(req): Json<BulkRequest>,
) -> ApiResult<Json<BulkResponse>> {
    let action: BulkAction = req.action.parse()?;
    let ids = parse_ids(&req.ids)?;
    let reason = normalize_reason(req.reason)?;

    let outcome = state
        .service
        .bulk(&user.actor(), action, &ids, reason)
        .await?
        .into_value();

    Ok(Json(BulkResponse {
        ok: true,
        processed: outcome.processed,
        skipped: outcome.skipped,
    }))
}

/// POST /v1/registrations - Register for an event
#[utoipa::path(
    post,
    path = "/v1/registrations",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = CreateRegistrationResponse),
        (status = 400, description = "Event not open for registration", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Registering another user requires admin", body = ErrorResponse),
        (status = 404, description = "Event or user not found", body = ErrorResponse),
        (status = 409, description = "Already registered", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn create_registration(
    State(state): State<RegistrationsState>,
    user: AuthUser,
    Json(req): Json<CreateRegistrationRequest>,
) -> ApiResult<(StatusCode, Json<CreateRegistrationResponse>)> {
    let detail = state
        .service
        .create(&user.actor(), req.event_id, req.user_id)
        .await?
        .into_value();

    Ok((
        StatusCode::CREATED,
        Json(CreateRegistrationResponse {
            ok: true,
            status: detail.status(),
            registration: detail,
        }),
    ))
}

/// GET /v1/registrations/{id} - Get one registration
#[utoipa::path(
    get,
    path = "/v1/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration found", body = RegistrationDetail),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn get_registration(
    State(state): State<RegistrationsState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RegistrationDetail>> {
    let detail = state.service.get(&user.actor(), id).await?;
    Ok(Json(detail))
}

/// DELETE /v1/registrations/{id} - Archive and delete one registration
#[utoipa::path(
    delete,
    path = "/v1/registrations/{id}",
    params(("id" = Uuid, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration archived and deleted", body = OkResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn delete_registration(
    State(state): State<RegistrationsState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state.service.delete(&user.actor(), id).await?;
    Ok(Json(OkResponse { ok: true }))
}

/// POST /v1/registrations/{id}/cancel - Cancel your own registration
#[utoipa::path(
    post,
    path = "/v1/registrations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Registration ID")),
    request_body(content = CancelRequest, description = "Optional cancellation reason"),
    responses(
        (status = 200, description = "Registration cancelled", body = TransitionResponse),
        (status = 400, description = "Registration already closed", body = ErrorResponse),
        (status = 403, description = "Not the registration holder", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn cancel_registration(
    State(state): State<RegistrationsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    body: Option<Json<CancelRequest>>,
) -> ApiResult<Json<TransitionResponse>> {
    let reason = normalize_reason(body.and_then(|Json(req)| req.reason))?;

    let outcome = state
        .service
        .cancel_own(&user.actor(), id, reason)
        .await?
        .into_value();

    Ok(Json(TransitionResponse {
        ok: true,
        id,
        status: outcome.status(),
        previous_status: outcome.previous,
    }))
}

/// GET /v1/events/{id}/registrations - List an event's registrations
#[utoipa::path(
    get,
    path = "/v1/events/{id}/registrations",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registrations for the event", body = ListResponse<RegistrationDetail>),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    tag = "registrations"
)]
pub async fn list_event_registrations(
    State(state): State<RegistrationsState>,
    AdminUser(user): AdminUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<ListResponse<RegistrationDetail>>> {
    let rows = state.service.list_for_event(&user.actor(), event_id).await?;
    Ok(Json(ListResponse::new(rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_response_is_camel_case() {
        let json = serde_json::to_value(TransitionResponse {
            ok: true,
            id: Uuid::nil(),
            status: RegistrationStatus::Confirmed,
            previous_status: RegistrationStatus::Pending,
        })
        .unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["previousStatus"], "pending");
    }

    #[test]
    fn test_create_request_deserialize() {
        let id = Uuid::now_v7();
        let req: CreateRegistrationRequest =
            serde_json::from_str(&format!(r#"{{"eventId":"{id}"}}"#)).unwrap();
        assert_eq!(req.event_id, id);
        assert_eq!(req.user_id, None);
    }

    #[test]
    fn test_bulk_request_reason_optional() {
        let req: BulkRequest =
            serde_json::from_str(r#"{"ids":["a"],"action":"noshow"}"#).unwrap();
        assert_eq!(req.action, "noshow");
        assert!(req.reason.is_none());
    }
}
