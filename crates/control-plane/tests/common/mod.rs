// Shared setup for the control-plane integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use eventdesk_control_plane::auth::AuthConfig;
use eventdesk_control_plane::services::{CreateEventInput, LogMailer};
use eventdesk_control_plane::storage::StorageBackend;
use eventdesk_control_plane::AppContext;
use eventdesk_core::{Actor, Event, EventStatus, RegistrationDetail, Role};
use uuid::Uuid;

pub struct Harness {
    pub ctx: AppContext,
    pub admin: Actor,
}

impl Harness {
    /// In-memory services with one stored admin
    pub async fn new(auth: AuthConfig) -> Self {
        let ctx = AppContext::new(
            Arc::new(StorageBackend::in_memory()),
            Arc::new(LogMailer),
            auth,
        );
        let bootstrap = Actor::admin(Uuid::nil());
        let admin = ctx
            .users
            .create(&bootstrap, "Admin", "admin@example.com", Role::Admin)
            .await
            .unwrap()
            .settled()
            .await;

        Self {
            ctx,
            admin: Actor::admin(admin.id),
        }
    }

    pub async fn in_memory() -> Self {
        Self::new(AuthConfig::default()).await
    }

    pub async fn user(&self, name: &str) -> Uuid {
        let email = format!("{}@example.com", name.to_lowercase());
        self.ctx
            .users
            .create(&self.admin, name, &email, Role::User)
            .await
            .unwrap()
            .settled()
            .await
            .id
    }

    /// A published event open for registration
    pub async fn event(&self, total_slots: i32) -> Event {
        self.ctx
            .events
            .create(
                &self.admin,
                CreateEventInput {
                    title: "Rust Meetup".to_string(),
                    description: None,
                    event_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
                    event_time: None,
                    location: Some("Hall B".to_string()),
                    total_slots,
                    status: Some(EventStatus::Published),
                },
            )
            .await
            .unwrap()
            .settled()
            .await
    }

    pub async fn register(&self, event_id: Uuid, user_id: Uuid) -> RegistrationDetail {
        self.ctx
            .registrations
            .create(&self.admin, event_id, Some(user_id))
            .await
            .unwrap()
            .settled()
            .await
    }

    pub async fn available_slots(&self, event_id: Uuid) -> i32 {
        self.ctx.events.get(event_id).await.unwrap().available_slots
    }

    pub async fn status_of(&self, id: Uuid) -> eventdesk_core::RegistrationStatus {
        self.ctx
            .registrations
            .get(&self.admin, id)
            .await
            .unwrap()
            .status()
    }
}
