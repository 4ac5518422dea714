// PostgreSQL backend tests
// Run with: DATABASE_URL=postgres://... cargo test -p eventdesk-control-plane --test postgres_storage -- --ignored

use std::sync::Arc;

use chrono::NaiveDate;
use eventdesk_control_plane::auth::AuthConfig;
use eventdesk_control_plane::services::{ArchiveKind, CreateEventInput, LogMailer};
use eventdesk_control_plane::storage::StorageBackend;
use eventdesk_control_plane::AppContext;
use eventdesk_core::{
    Actor, BulkAction, Event, EventStatus, RegistrationError, RegistrationStatus, Role,
};
use uuid::Uuid;

async fn connect() -> AppContext {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    let storage = StorageBackend::postgres(&url, 5)
        .await
        .expect("Failed to connect to database");
    AppContext::new(Arc::new(storage), Arc::new(LogMailer), AuthConfig::default())
}

async fn published_event(
    ctx: &AppContext,
    admin: &Actor,
    title: String,
    total_slots: i32,
) -> Event {
    ctx.events
        .create(
            admin,
            CreateEventInput {
                title,
                description: None,
                event_date: NaiveDate::from_ymd_opt(2026, 12, 3).unwrap(),
                event_time: None,
                location: None,
                total_slots,
                status: Some(EventStatus::Published),
            },
        )
        .await
        .unwrap()
        .settled()
        .await
}

async fn user(ctx: &AppContext, admin: &Actor, email: String) -> Uuid {
    ctx.users
        .create(admin, "Attendee", &email, Role::User)
        .await
        .unwrap()
        .settled()
        .await
        .id
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_capacity_and_archive() {
    let ctx = connect().await;
    let admin = Actor::admin(Uuid::nil());
    let suffix = Uuid::now_v7().simple().to_string();

    let event = ctx
        .events
        .create(
            &admin,
            CreateEventInput {
                title: format!("Capacity check {suffix}"),
                description: None,
                event_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                event_time: None,
                location: None,
                total_slots: 1,
                status: Some(EventStatus::Published),
            },
        )
        .await
        .unwrap()
        .settled()
        .await;

    let mut ids = Vec::new();
    for name in ["alice", "bob"] {
        let user = ctx
            .users
            .create(&admin, name, &format!("{name}-{suffix}@example.com"), Role::User)
            .await
            .unwrap()
            .settled()
            .await;
        let registration = ctx
            .registrations
            .create(&admin, event.id, Some(user.id))
            .await
            .unwrap()
            .settled()
            .await;
        ids.push(registration.id());
    }

    let err = ctx
        .registrations
        .bulk(&admin, BulkAction::Approve, &ids, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::CapacityExceeded { needed: 2, available: 1, .. }));

    let outcome = ctx
        .registrations
        .bulk(&admin, BulkAction::Approve, &ids[..1], None)
        .await
        .unwrap()
        .settled()
        .await;
    assert_eq!(outcome.processed, 1);
    assert_eq!(ctx.events.get(event.id).await.unwrap().available_slots, 0);

    let outcome = ctx
        .registrations
        .bulk(&admin, BulkAction::Delete, &ids, None)
        .await
        .unwrap()
        .settled()
        .await;
    assert_eq!(outcome.processed, 2);

    let archived = ctx.archive.list_registrations(&admin).await.unwrap();
    let snapshot = archived.iter().find(|a| a.id == ids[0]).unwrap();
    assert_eq!(snapshot.status, RegistrationStatus::Confirmed);
    assert_eq!(ctx.events.get(event.id).await.unwrap().available_slots, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_concurrent_approvals() {
    let ctx = connect().await;
    let admin = Actor::admin(Uuid::nil());
    let suffix = Uuid::now_v7().simple().to_string();

    let event = ctx
        .events
        .create(
            &admin,
            CreateEventInput {
                title: format!("Race {suffix}"),
                description: None,
                event_date: NaiveDate::from_ymd_opt(2026, 12, 2).unwrap(),
                event_time: None,
                location: None,
                total_slots: 1,
                status: Some(EventStatus::Published),
            },
        )
        .await
        .unwrap()
        .settled()
        .await;

    let mut ids = Vec::new();
    for i in 0..6 {
        let user = ctx
            .users
            .create(&admin, "racer", &format!("racer{i}-{suffix}@example.com"), Role::User)
            .await
            .unwrap()
            .settled()
            .await;
        let registration = ctx
            .registrations
            .create(&admin, event.id, Some(user.id))
            .await
            .unwrap()
            .settled()
            .await;
        ids.push(registration.id());
    }

    let tasks = ids.iter().map(|&id| {
        let service = ctx.registrations.clone();
        tokio::spawn(async move {
            service
                .transition(&admin, id, RegistrationStatus::Confirmed, None)
                .await
                .map(|c| c.into_value())
        })
    });
    let results = futures::future::join_all(tasks).await;

    let confirmed = results
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(confirmed, 1);
    assert_eq!(ctx.events.get(event.id).await.unwrap().available_slots, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_restore_skips_re_registered_pair() {
    let ctx = connect().await;
    let admin = Actor::admin(Uuid::nil());
    let suffix = Uuid::now_v7().simple().to_string();

    let event = published_event(&ctx, &admin, format!("Restore {suffix}"), 3).await;
    let alice = user(&ctx, &admin, format!("alice-{suffix}@example.com")).await;
    let original = ctx
        .registrations
        .create(&admin, event.id, Some(alice))
        .await
        .unwrap()
        .settled()
        .await;
    ctx.registrations
        .delete(&admin, original.id())
        .await
        .unwrap()
        .settled()
        .await;
    let again = ctx
        .registrations
        .create(&admin, event.id, Some(alice))
        .await
        .unwrap()
        .settled()
        .await;
    assert_ne!(again.id(), original.id());

    let outcome = ctx
        .archive
        .restore(&admin, ArchiveKind::Registrations, &[original.id()])
        .await
        .unwrap()
        .into_value();
    assert_eq!(outcome.restored, 0);
    assert_eq!(outcome.skipped_count, 1);

    let archived = ctx.archive.list_registrations(&admin).await.unwrap();
    assert!(archived.iter().any(|a| a.id == original.id()));
    let live = ctx.registrations.get(&admin, again.id()).await.unwrap();
    assert_eq!(live.status(), RegistrationStatus::Pending);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_event_delete_races_approvals_and_signups() {
    let ctx = connect().await;
    let admin = Actor::admin(Uuid::nil());
    let suffix = Uuid::now_v7().simple().to_string();

    for round in 0..10 {
        let title = format!("Teardown {round} {suffix}");
        let event = published_event(&ctx, &admin, title, 10).await;
        let mut ids = Vec::new();
        for i in 0..5 {
            let email = format!("td{round}-{i}-{suffix}@example.com");
            let attendee = user(&ctx, &admin, email).await;
            let registration = ctx
                .registrations
                .create(&admin, event.id, Some(attendee))
                .await
                .unwrap()
                .settled()
                .await;
            ids.push(registration.id());
        }
        let late = user(&ctx, &admin, format!("td{round}-late-{suffix}@example.com")).await;

        let approve = {
            let service = ctx.registrations.clone();
            let ids = ids.clone();
            tokio::spawn(async move {
                service
                    .bulk(&admin, BulkAction::Approve, &ids, None)
                    .await
                    .map(|c| c.into_value().processed)
            })
        };
        let confirm_one = {
            let service = ctx.registrations.clone();
            let id = ids[0];
            tokio::spawn(async move {
                service
                    .transition(&admin, id, RegistrationStatus::Confirmed, None)
                    .await
                    .map(|_| 1usize)
            })
        };
        let signup = {
            let service = ctx.registrations.clone();
            let event_id = event.id;
            tokio::spawn(async move {
                service
                    .create(&admin, event_id, Some(late))
                    .await
                    .map(|_| 1usize)
            })
        };
        let teardown = {
            let service = ctx.events.clone();
            let event_id = event.id;
            tokio::spawn(async move {
                service
                    .delete(&admin, event_id)
                    .await
                    .map(|c| c.into_value())
            })
        };

        let results = futures::future::join_all([approve, confirm_one, signup, teardown]).await;
        for result in results {
            match result.unwrap() {
                Ok(_)
                | Err(RegistrationError::NotFound(_))
                | Err(RegistrationError::EventClosed(_))
                | Err(RegistrationError::Validation(_)) => {}
                Err(other) => panic!("round {round}: unexpected error {other:?}"),
            }
        }

        let err = ctx.events.get(event.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::NotFound(_)));
        let archived = ctx.archive.list_registrations(&admin).await.unwrap();
        for id in &ids {
            assert!(archived.iter().any(|a| a.id == *id), "round {round}: {id} not archived");
        }
    }
}
