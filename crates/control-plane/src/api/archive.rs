// Archive HTTP routes: browse, restore and permanently delete archived items

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use eventdesk_core::{ArchivedRegistration, Event, PurgeOutcome, RegistrationError, RestoreOutcome};

use super::common::{ApiResult, ErrorResponse, IdsRequest, ListResponse};
use super::users::User;
use super::validation::parse_ids;
use crate::auth::{AdminUser, AuthState, FromRef};
use crate::services::{ArchiveKind, ArchiveService};

/// App state for archive routes
#[derive(Clone)]
pub struct ArchiveState {
    pub service: Arc<ArchiveService>,
    pub auth: AuthState,
}

impl FromRef<ArchiveState> for AuthState {
    fn from_ref(input: &ArchiveState) -> Self {
        input.auth.clone()
    }
}

/// Archive collection in the URL path
#[derive(Debug, Clone, Copy)]
pub struct KindParam(ArchiveKind);

impl std::str::FromStr for KindParam {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registrations" => Ok(KindParam(ArchiveKind::Registrations)),
            "events" => Ok(KindParam(ArchiveKind::Events)),
            "users" => Ok(KindParam(ArchiveKind::Users)),
            other => Err(RegistrationError::not_found(format!(
                "Unknown archive: {other}"
            ))),
        }
    }
}

/// Create archive routes
pub fn routes(state: ArchiveState) -> Router {
    Router::new()
        .route("/v1/archive/registrations", get(list_archived_registrations))
        .route("/v1/archive/events", get(list_archived_events))
        .route("/v1/archive/users", get(list_archived_users))
        .route("/v1/archive/:kind/restore", post(restore_archived))
        .route("/v1/archive/:kind/delete", post(purge_archived))
        .with_state(state)
}

/// GET /v1/archive/registrations - List archived registration snapshots
#[utoipa::path(
    get,
    path = "/v1/archive/registrations",
    responses(
        (status = 200, description = "Archived registrations, newest first", body = ListResponse<ArchivedRegistration>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "archive"
)]
pub async fn list_archived_registrations(
    State(state): State<ArchiveState>,
    AdminUser(user): AdminUser,
) -> ApiResult<Json<ListResponse<ArchivedRegistration>>> {
    let rows = state.service.list_registrations(&user.actor()).await?;
    Ok(Json(ListResponse::new(rows)))
}

/// GET /v1/archive/events - List archived events
#[utoipa::path(
    get,
    path = "/v1/archive/events",
    responses(
        (status = 200, description = "Archived events", body = ListResponse<Event>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "archive"
)]
pub async fn list_archived_events(
    State(state): State<ArchiveState>,
    AdminUser(user): AdminUser,
) -> ApiResult<Json<ListResponse<Event>>> {
    let events = state.service.list_events(&user.actor()).await?;
    Ok(Json(ListResponse::new(events)))
}

/// GET /v1/archive/users - List archived users
#[utoipa::path(
    get,
    path = "/v1/archive/users",
    responses(
        (status = 200, description = "Archived users", body = ListResponse<User>),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "archive"
)]
pub async fn list_archived_users(
    State(state): State<ArchiveState>,
    AdminUser(user): AdminUser,
) -> ApiResult<Json<ListResponse<User>>> {
    let rows = state.service.list_users(&user.actor()).await?;
    Ok(Json(ListResponse::new(rows.into_iter().map(User::from).collect())))
}

/// POST /v1/archive/{kind}/restore - Restore archived items
///
/// Items that cannot be restored (still live, missing, parent gone, or a
/// registration colliding with a live one) are counted in `skippedCount`.
#[utoipa::path(
    post,
    path = "/v1/archive/{kind}/restore",
    params(("kind" = String, Path, description = "registrations, events or users")),
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Restore applied", body = RestoreOutcome),
        (status = 400, description = "Invalid id list", body = ErrorResponse),
        (status = 404, description = "Unknown archive", body = ErrorResponse)
    ),
    tag = "archive"
)]
pub async fn restore_archived(
    State(state): State<ArchiveState>,
    AdminUser(user): AdminUser,
    Path(kind): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<RestoreOutcome>> {
    let KindParam(kind) = kind.parse()?;
    let ids = parse_ids(&req.ids)?;
    let outcome = state
        .service
        .restore(&user.actor(), kind, &ids)
        .await?
        .into_value();
    Ok(Json(outcome))
}

/// POST /v1/archive/{kind}/delete - Permanently delete archived items
///
/// Events and users are only purged when no live registration references them.
#[utoipa::path(
    post,
    path = "/v1/archive/{kind}/delete",
    params(("kind" = String, Path, description = "registrations, events or users")),
    request_body = IdsRequest,
    responses(
        (status = 200, description = "Purge applied", body = PurgeOutcome),
        (status = 400, description = "Invalid id list", body = ErrorResponse),
        (status = 404, description = "Unknown archive", body = ErrorResponse)
    ),
    tag = "archive"
)]
pub async fn purge_archived(
    State(state): State<ArchiveState>,
    AdminUser(user): AdminUser,
    Path(kind): Path<String>,
    Json(req): Json<IdsRequest>,
) -> ApiResult<Json<PurgeOutcome>> {
    let KindParam(kind) = kind.parse()?;
    let ids = parse_ids(&req.ids)?;
    let outcome = state
        .service
        .purge(&user.actor(), kind, &ids)
        .await?
        .into_value();
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_param_parsing() {
        let KindParam(kind) = "events".parse().unwrap();
        assert_eq!(kind, ArchiveKind::Events);
        assert!(matches!(
            "sessions".parse::<KindParam>(),
            Err(RegistrationError::NotFound(_))
        ));
    }
}
