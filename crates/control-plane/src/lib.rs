// Eventdesk Control Plane Library
// Decision: Shared library for binaries (API server, OpenAPI export) and integration tests

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use eventdesk_core::Notifier;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Process configuration
pub mod config;

// Services layer
pub mod services;
pub use services::{
    ActivityService, ArchiveService, Committed, EventService, RegistrationService, UserService,
};

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

use crate::auth::{AuthConfig, AuthState};
use crate::config::AppConfig;
use crate::services::{Mailer, StorageNotifier};
use crate::storage::StorageBackend;

/// Services wired against one storage backend and notifier
#[derive(Clone)]
pub struct AppContext {
    pub storage: Arc<StorageBackend>,
    pub auth: AuthState,
    pub registrations: Arc<RegistrationService>,
    pub events: Arc<EventService>,
    pub users: Arc<UserService>,
    pub archive: Arc<ArchiveService>,
    pub activity: Arc<ActivityService>,
}

impl AppContext {
    /// Build services that deliver side effects through storage and `mailer`
    pub fn new(storage: Arc<StorageBackend>, mailer: Arc<dyn Mailer>, auth: AuthConfig) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(StorageNotifier::new(storage.clone(), mailer));
        Self::with_notifier(storage, notifier, auth)
    }

    /// Build services around a caller-supplied notifier
    pub fn with_notifier(
        storage: Arc<StorageBackend>,
        notifier: Arc<dyn Notifier>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            auth: AuthState::new(auth),
            registrations: Arc::new(RegistrationService::new(storage.clone(), notifier.clone())),
            events: Arc::new(EventService::new(storage.clone(), notifier.clone())),
            users: Arc::new(UserService::new(storage.clone(), notifier.clone())),
            archive: Arc::new(ArchiveService::new(storage.clone(), notifier)),
            activity: Arc::new(ActivityService::new(storage.clone())),
            storage,
        }
    }

    /// Every `/v1` route, unprefixed and without outer layers
    pub fn api_routes(&self) -> Router {
        let auth = self.auth.clone();
        Router::new()
            .merge(api::registrations::routes(api::registrations::RegistrationsState {
                service: self.registrations.clone(),
                auth: auth.clone(),
            }))
            .merge(api::events::routes(api::events::EventsState {
                service: self.events.clone(),
                auth: auth.clone(),
            }))
            .merge(api::users::routes(api::users::UsersState {
                service: self.users.clone(),
                auth: auth.clone(),
            }))
            .merge(api::archive::routes(api::archive::ArchiveState {
                service: self.archive.clone(),
                auth: auth.clone(),
            }))
            .merge(api::activity::routes(api::activity::ActivityState {
                service: self.activity.clone(),
                auth,
            }))
    }

    /// Full application router: health, prefixed API, Swagger UI, CORS and tracing
    pub fn router(&self, config: &AppConfig) -> Router {
        let health_state = HealthState {
            storage: self.storage.mode_name(),
            auth_mode: self.auth.config.mode.as_str(),
        };

        let api_prefix = config.api_prefix.as_deref().unwrap_or_default();

        let app = Router::new()
            .route("/health", get(health).with_state(health_state))
            .merge(build_router_with_prefix(self.api_routes(), api_prefix))
            .merge(
                SwaggerUi::new("/swagger-ui")
                    .url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
            );

        let app = match cors_layer(&config.cors_allowed_origins) {
            Some(cors) => app.layer(cors),
            None => app,
        };

        app.layer(TraceLayer::new_for_http())
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
    auth_mode: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
    auth_mode: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
        auth_mode: state.auth_mode,
    })
}

/// CORS is only enabled when at least one valid origin is configured
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
                header::ORIGIN,
            ])
            .allow_credentials(true),
    )
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
