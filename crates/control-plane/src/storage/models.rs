// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eventdesk_core::{
    ArchivedRegistration, AuditLogEntry, DeletionSource, Event, EventStatus, EventSummary,
    Registration, RegistrationDetail, RegistrationError, RegistrationStatus, Role, UserSummary,
};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Users
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl UserRow {
    pub fn is_live(&self) -> bool {
        self.archived_at.is_none()
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ============================================
// Events
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub total_slots: i32,
    pub available_slots: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            event_time: row.event_time,
            location: row.location,
            total_slots: row.total_slots,
            available_slots: row.available_slots,
            status: EventStatus::from(row.status.as_str()),
            created_at: row.created_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub total_slots: i32,
    pub status: EventStatus,
}

/// Partial event edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub total_slots: Option<i32>,
    pub status: Option<EventStatus>,
}

/// Slot counters as locked for update
#[derive(Debug, Clone, FromRow)]
pub struct SlotRow {
    pub id: Uuid,
    pub total_slots: i32,
    pub available_slots: i32,
}

// ============================================
// Registrations
// ============================================

/// Registration joined with the user and event display fields
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationDetailRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub event_location: Option<String>,
}

impl TryFrom<RegistrationDetailRow> for RegistrationDetail {
    type Error = RegistrationError;

    fn try_from(row: RegistrationDetailRow) -> Result<Self, Self::Error> {
        let status: RegistrationStatus = row
            .status
            .parse()
            .map_err(|_| RegistrationError::store(format!("Unknown registration status '{}'", row.status)))?;
        Ok(RegistrationDetail {
            registration: Registration {
                id: row.id,
                event_id: row.event_id,
                user_id: row.user_id,
                status,
                registered_at: row.registered_at,
            },
            user: UserSummary {
                name: row.user_name,
                email: row.user_email,
            },
            event: EventSummary {
                title: row.event_title,
                event_date: row.event_date,
                event_time: row.event_time,
                location: row.event_location,
            },
        })
    }
}

// ============================================
// Archive
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ArchivedRegistrationRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub event_location: Option<String>,
    pub deleted_at: DateTime<Utc>,
    pub deleted_by: Option<Uuid>,
    pub deletion_source: String,
}

impl TryFrom<ArchivedRegistrationRow> for ArchivedRegistration {
    type Error = RegistrationError;

    fn try_from(row: ArchivedRegistrationRow) -> Result<Self, Self::Error> {
        let status: RegistrationStatus = row
            .status
            .parse()
            .map_err(|_| RegistrationError::store(format!("Unknown registration status '{}'", row.status)))?;
        Ok(ArchivedRegistration {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status,
            registered_at: row.registered_at,
            user_name: row.user_name,
            user_email: row.user_email,
            event_title: row.event_title,
            event_date: row.event_date,
            event_time: row.event_time,
            event_location: row.event_location,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
            deletion_source: DeletionSource::from(row.deletion_source.as_str()),
        })
    }
}

// ============================================
// Audit logs and notifications
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_role: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogEntry {
    fn from(row: AuditLogRow) -> Self {
        AuditLogEntry {
            id: row.id,
            actor_id: row.actor_id,
            actor_role: Role::from(row.actor_role.as_str()),
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
