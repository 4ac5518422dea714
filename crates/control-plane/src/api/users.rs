// Users API routes
// Decision: User administration is admin-only; identities themselves are
// managed by the external identity provider

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use eventdesk_core::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ApiResult, ErrorResponse, ListResponse};
use crate::auth::{AdminUser, AuthState, FromRef};
use crate::services::UserService;
use crate::storage::UserRow;

/// App state for users routes
#[derive(Clone)]
pub struct UsersState {
    pub service: Arc<UserService>,
    pub auth: AuthState,
}

impl FromRef<UsersState> for AuthState {
    fn from_ref(input: &UsersState) -> Self {
        input.auth.clone()
    }
}

/// User response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            role: Role::from(row.role.as_str()),
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            archived_at: row.archived_at,
        }
    }
}

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub ok: bool,
    pub archived_registrations: usize,
}

/// Create users routes
pub fn routes(state: UsersState) -> Router {
    Router::new()
        .route("/v1/users", get(list_users).post(create_user))
        .route("/v1/users/:id", delete(delete_user))
        .with_state(state)
}

/// GET /v1/users - List live users
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "List of users", body = ListResponse<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<UsersState>,
    AdminUser(user): AdminUser,
) -> ApiResult<Json<ListResponse<User>>> {
    let rows = state.service.list(&user.actor()).await?;
    Ok(Json(ListResponse::new(rows.into_iter().map(User::from).collect())))
}

/// POST /v1/users - Create a user
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<UsersState>,
    AdminUser(user): AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let row = state
        .service
        .create(&user.actor(), &req.name, &req.email, req.role)
        .await?
        .into_value();
    Ok((StatusCode::CREATED, Json(User::from(row))))
}

/// DELETE /v1/users/{id} - Archive a user and their registrations
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User archived", body = DeleteUserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let archived = state.service.delete(&user.actor(), id).await?.into_value();
    Ok(Json(DeleteUserResponse {
        ok: true,
        archived_registrations: archived,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization() {
        let user = User {
            id: Uuid::nil(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
            archived_at: None,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("archivedAt").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_create_user_request_defaults_to_user_role() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert_eq!(req.role, Role::User);
    }
}
