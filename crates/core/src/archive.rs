// Archive snapshot types
//
// A registration is copied into the archive, with the user and event display
// fields materialized, before its live row is removed. Restoring re-inserts
// the live row from the snapshot.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::registration::{
    EventSummary, Registration, RegistrationDetail, RegistrationStatus, UserSummary,
};

/// Why a registration was archived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DeletionSource {
    /// Single registration deleted by an admin
    AdminSingle,
    /// Registration deleted through the bulk endpoint
    AdminBulk,
    /// Owning event was deleted
    EventDeleted,
    /// Owning user was deleted
    UserDeleted,
}

impl DeletionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionSource::AdminSingle => "admin_single",
            DeletionSource::AdminBulk => "admin_bulk",
            DeletionSource::EventDeleted => "event_deleted",
            DeletionSource::UserDeleted => "user_deleted",
        }
    }
}

impl std::fmt::Display for DeletionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DeletionSource {
    fn from(s: &str) -> Self {
        match s {
            "admin_single" => DeletionSource::AdminSingle,
            "event_deleted" => DeletionSource::EventDeleted,
            "user_deleted" => DeletionSource::UserDeleted,
            _ => DeletionSource::AdminBulk,
        }
    }
}

/// Which live registrations to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveScope {
    Registrations(Vec<Uuid>),
    Events(Vec<Uuid>),
    Users(Vec<Uuid>),
}

impl ArchiveScope {
    pub fn is_empty(&self) -> bool {
        match self {
            ArchiveScope::Registrations(ids)
            | ArchiveScope::Events(ids)
            | ArchiveScope::Users(ids) => ids.is_empty(),
        }
    }

    /// Whether a live registration falls inside this scope
    pub fn matches(&self, registration: &Registration) -> bool {
        match self {
            ArchiveScope::Registrations(ids) => ids.contains(&registration.id),
            ArchiveScope::Events(ids) => ids.contains(&registration.event_id),
            ArchiveScope::Users(ids) => ids.contains(&registration.user_id),
        }
    }
}

/// Denormalized, append-only snapshot of a deleted registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ArchivedRegistration {
    /// Id of the original live registration.
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub event_title: String,
    pub event_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_location: Option<String>,
    pub deleted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Uuid>,
    pub deletion_source: DeletionSource,
}

impl ArchivedRegistration {
    /// Materialize a snapshot from a registration read with its joined fields
    pub fn snapshot(
        detail: &RegistrationDetail,
        deleted_by: Option<Uuid>,
        deletion_source: DeletionSource,
        deleted_at: DateTime<Utc>,
    ) -> Self {
        let r = &detail.registration;
        Self {
            id: r.id,
            event_id: r.event_id,
            user_id: r.user_id,
            status: r.status,
            registered_at: r.registered_at,
            user_name: detail.user.name.clone(),
            user_email: detail.user.email.clone(),
            event_title: detail.event.title.clone(),
            event_date: detail.event.event_date,
            event_time: detail.event.event_time,
            event_location: detail.event.location.clone(),
            deleted_at,
            deleted_by,
            deletion_source,
        }
    }

    /// Live row to re-insert on restore
    pub fn to_registration(&self) -> Registration {
        Registration {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            status: self.status,
            registered_at: self.registered_at,
        }
    }

    /// Snapshot fields as a detail view (used for notifications about archived rows)
    pub fn to_detail(&self) -> RegistrationDetail {
        RegistrationDetail {
            registration: self.to_registration(),
            user: UserSummary {
                name: self.user_name.clone(),
                email: self.user_email.clone(),
            },
            event: EventSummary {
                title: self.event_title.clone(),
                event_date: self.event_date,
                event_time: self.event_time,
                location: self.event_location.clone(),
            },
        }
    }
}

/// Result of a bulk restore.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored: usize,
    pub skipped_count: usize,
}

/// Result of a bulk permanent delete of archived items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PurgeOutcome {
    pub deleted: usize,
    pub skipped_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> RegistrationDetail {
        RegistrationDetail {
            registration: Registration {
                id: Uuid::now_v7(),
                event_id: Uuid::now_v7(),
                user_id: Uuid::now_v7(),
                status: RegistrationStatus::Confirmed,
                registered_at: Utc::now(),
            },
            user: UserSummary {
                name: "Linus".to_string(),
                email: "linus@example.com".to_string(),
            },
            event: EventSummary {
                title: "Hack Night".to_string(),
                event_date: NaiveDate::from_ymd_opt(2026, 10, 30).unwrap(),
                event_time: NaiveTime::from_hms_opt(18, 30, 0),
                location: Some("Garage".to_string()),
            },
        }
    }

    #[test]
    fn test_snapshot_copies_joined_fields() {
        let d = detail();
        let admin = Uuid::now_v7();
        let snap = ArchivedRegistration::snapshot(&d, Some(admin), DeletionSource::AdminBulk, Utc::now());
        assert_eq!(snap.id, d.id());
        assert_eq!(snap.user_email, "linus@example.com");
        assert_eq!(snap.event_title, "Hack Night");
        assert_eq!(snap.event_location.as_deref(), Some("Garage"));
        assert_eq!(snap.deleted_by, Some(admin));
        assert_eq!(snap.to_registration(), d.registration);
        assert_eq!(snap.to_detail(), d);
    }

    #[test]
    fn test_scope_matching() {
        let d = detail();
        let r = &d.registration;
        assert!(ArchiveScope::Registrations(vec![r.id]).matches(r));
        assert!(ArchiveScope::Events(vec![r.event_id]).matches(r));
        assert!(ArchiveScope::Users(vec![r.user_id]).matches(r));
        assert!(!ArchiveScope::Users(vec![r.event_id]).matches(r));
        assert!(ArchiveScope::Events(vec![]).is_empty());
    }

    #[test]
    fn test_outcome_wire_names() {
        let json = serde_json::to_value(RestoreOutcome {
            restored: 2,
            skipped_count: 1,
        })
        .unwrap();
        assert_eq!(json["restored"], 2);
        assert_eq!(json["skippedCount"], 1);
        assert_eq!(DeletionSource::from("event_deleted"), DeletionSource::EventDeleted);
    }
}
