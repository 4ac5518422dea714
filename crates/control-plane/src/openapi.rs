// OpenAPI specification generation
//
// Shared by the API server (Swagger UI) and the export-openapi binary.

use crate::api;
use crate::api::{ErrorResponse, ListResponse};
use eventdesk_core::{
    ArchivedRegistration, AuditLogEntry, DeletionSource, Event, EventStatus, EventSummary,
    PurgeOutcome, Registration, RegistrationDetail, RegistrationStatus, RestoreOutcome, Role,
    UserSummary,
};
use utoipa::OpenApi;

/// OpenAPI documentation for the Eventdesk API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::registrations::create_registration,
        api::registrations::bulk_registrations,
        api::registrations::transition_registration,
        api::registrations::get_registration,
        api::registrations::delete_registration,
        api::registrations::cancel_registration,
        api::registrations::list_event_registrations,
        api::events::create_event,
        api::events::list_events,
        api::events::get_event,
        api::events::update_event,
        api::events::delete_event,
        api::users::list_users,
        api::users::create_user,
        api::users::delete_user,
        api::archive::list_archived_registrations,
        api::archive::list_archived_events,
        api::archive::list_archived_users,
        api::archive::restore_archived,
        api::archive::purge_archived,
        api::activity::list_notifications,
        api::activity::list_audit_logs,
    ),
    components(
        schemas(
            ErrorResponse,
            Event, EventStatus,
            Registration, RegistrationDetail, RegistrationStatus, UserSummary, EventSummary,
            ArchivedRegistration, DeletionSource, RestoreOutcome, PurgeOutcome,
            Role, AuditLogEntry,
            api::common::IdsRequest,
            api::registrations::TransitionRequest, api::registrations::TransitionResponse,
            api::registrations::BulkRequest, api::registrations::BulkResponse,
            api::registrations::CreateRegistrationRequest,
            api::registrations::CreateRegistrationResponse,
            api::registrations::CancelRequest, api::registrations::OkResponse,
            api::events::CreateEventRequest, api::events::UpdateEventRequest,
            api::events::DeleteEventResponse,
            api::users::User, api::users::CreateUserRequest, api::users::DeleteUserResponse,
            api::activity::Notification,
            ListResponse<Event>,
            ListResponse<RegistrationDetail>,
            ListResponse<ArchivedRegistration>,
            ListResponse<api::users::User>,
            ListResponse<api::activity::Notification>,
            ListResponse<AuditLogEntry>,
        )
    ),
    tags(
        (name = "registrations", description = "Registration status and bulk endpoints"),
        (name = "events", description = "Event management endpoints"),
        (name = "users", description = "User management endpoints"),
        (name = "archive", description = "Archive browse, restore and purge endpoints"),
        (name = "activity", description = "Notifications and audit log endpoints")
    ),
    info(
        title = "Eventdesk API",
        version = "0.1.0",
        description = "API for event registrations, capacity and the deletion archive",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_registration_paths() {
        let json: serde_json::Value = serde_json::from_str(&ApiDoc::to_json().unwrap()).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/v1/registrations/bulk"));
        assert!(paths.contains_key("/v1/registrations/{id}/cancel"));
        assert!(paths.contains_key("/v1/archive/{kind}/restore"));
    }
}
