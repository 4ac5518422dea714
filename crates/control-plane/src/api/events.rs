// Event HTTP routes
// Decision: Events are readable by any authenticated caller, writable by admins

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use eventdesk_core::{Event, EventStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ApiResult, ErrorResponse, ListResponse};
use crate::auth::{AdminUser, AuthState, AuthUser, FromRef};
use crate::services::{CreateEventInput, EventService};
use crate::storage::UpdateEvent;

/// App state for event routes
#[derive(Clone)]
pub struct EventsState {
    pub service: Arc<EventService>,
    pub auth: AuthState,
}

impl FromRef<EventsState> for AuthState {
    fn from_ref(input: &EventsState) -> Self {
        input.auth.clone()
    }
}

/// Request to create an event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = "Rust Meetup")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Admission capacity; available slots start at this value
    #[schema(example = 40)]
    pub total_slots: i32,
    /// Defaults to draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

/// Request to update an event. Only provided fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New capacity; available slots shift by the same amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_slots: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventResponse {
    pub ok: bool,
    /// Registrations moved to the archive with the event
    pub archived_registrations: usize,
}

/// Create event routes
pub fn routes(state: EventsState) -> Router {
    Router::new()
        .route("/v1/events", post(create_event).get(list_events))
        .route(
            "/v1/events/:id",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .with_state(state)
}

/// POST /v1/events - Create a new event
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<EventsState>,
    AdminUser(user): AdminUser,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let input = CreateEventInput {
        title: req.title,
        description: req.description,
        event_date: req.event_date,
        event_time: req.event_time,
        location: req.location,
        total_slots: req.total_slots,
        status: req.status,
    };
    let event = state.service.create(&user.actor(), input).await?.into_value();
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events - List live events
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "List of events", body = ListResponse<Event>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<EventsState>,
    _auth: AuthUser, // Require authentication
) -> ApiResult<Json<ListResponse<Event>>> {
    let events = state.service.list().await?;
    Ok(Json(ListResponse::new(events)))
}

/// GET /v1/events/{id} - Get event by ID
#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<EventsState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    let event = state.service.get(id).await?;
    Ok(Json(event))
}

/// PATCH /v1/events/{id} - Update event
#[utoipa::path(
    patch,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Capacity below confirmed seats", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<EventsState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    let input = UpdateEvent {
        title: req.title,
        description: req.description,
        event_date: req.event_date,
        event_time: req.event_time,
        location: req.location,
        total_slots: req.total_slots,
        status: req.status,
    };
    let event = state
        .service
        .update(&user.actor(), id, input)
        .await?
        .into_value();
    Ok(Json(event))
}

/// DELETE /v1/events/{id} - Archive an event and its registrations
#[utoipa::path(
    delete,
    path = "/v1/events/{id}",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event archived", body = DeleteEventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<EventsState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteEventResponse>> {
    let archived = state.service.delete(&user.actor(), id).await?.into_value();
    Ok(Json(DeleteEventResponse {
        ok: true,
        archived_registrations: archived,
    }))
}
