// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use std::sync::Arc;

use eventdesk_core::{
    ArchivedRegistration, AuditEntry, AuditLogEntry, BulkAction, BulkResult, NewNotification,
    PurgeOutcome, RegistrationDetail, RegistrationStatus, RestoreOutcome, Result,
    TransitionOutcome,
};
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend and bring its schema up to date
    pub async fn postgres(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = Database::from_url(database_url, max_connections).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Name reported by the health endpoint
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_users().await,
            Self::InMemory(db) => db.list_users().await,
        }
    }

    pub async fn list_archived_users(&self) -> Result<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_archived_users().await,
            Self::InMemory(db) => db.list_archived_users().await,
        }
    }

    pub async fn list_admins(&self) -> Result<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_admins().await,
            Self::InMemory(db) => db.list_admins().await,
        }
    }

    /// Archive the user's registrations and soft-delete the user.
    /// Returns `None` when the user is missing or already archived.
    pub async fn delete_user(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        match self {
            Self::Postgres(db) => db.delete_user(id, deleted_by).await,
            Self::InMemory(db) => db.delete_user(id, deleted_by).await,
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.create_event(input).await,
            Self::InMemory(db) => db.create_event(input).await,
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.get_event(id).await,
            Self::InMemory(db) => db.get_event(id).await,
        }
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        match self {
            Self::Postgres(db) => db.list_events().await,
            Self::InMemory(db) => db.list_events().await,
        }
    }

    pub async fn list_archived_events(&self) -> Result<Vec<EventRow>> {
        match self {
            Self::Postgres(db) => db.list_archived_events().await,
            Self::InMemory(db) => db.list_archived_events().await,
        }
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEvent) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.update_event(id, input).await,
            Self::InMemory(db) => db.update_event(id, input).await,
        }
    }

    pub async fn delete_event(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        match self {
            Self::Postgres(db) => db.delete_event(id, deleted_by).await,
            Self::InMemory(db) => db.delete_event(id, deleted_by).await,
        }
    }

    // ============================================
    // Registrations
    // ============================================

    pub async fn get_registration(&self, id: Uuid) -> Result<Option<RegistrationDetail>> {
        match self {
            Self::Postgres(db) => db.get_registration(id).await,
            Self::InMemory(db) => db.get_registration(id).await,
        }
    }

    pub async fn list_event_registrations(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationDetail>> {
        match self {
            Self::Postgres(db) => db.list_event_registrations(event_id).await,
            Self::InMemory(db) => db.list_event_registrations(event_id).await,
        }
    }

    /// Register a user for an event. The flag is true when a cancelled
    /// registration was reconfirmed instead of inserted.
    pub async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(RegistrationDetail, bool)> {
        match self {
            Self::Postgres(db) => db.create_registration(event_id, user_id).await,
            Self::InMemory(db) => db.create_registration(event_id, user_id).await,
        }
    }

    /// Atomically change one registration's status and its event's slot counter.
    /// With `owner` set, only that user's non-terminal registration may change.
    pub async fn transition_registration(
        &self,
        id: Uuid,
        next: RegistrationStatus,
        owner: Option<Uuid>,
    ) -> Result<TransitionOutcome> {
        match self {
            Self::Postgres(db) => db.transition_registration(id, next, owner).await,
            Self::InMemory(db) => db.transition_registration(id, next, owner).await,
        }
    }

    /// Apply one action to many registrations in a single transaction
    pub async fn bulk_transition(
        &self,
        action: BulkAction,
        ids: &[Uuid],
        deleted_by: Option<Uuid>,
    ) -> Result<BulkResult> {
        match self {
            Self::Postgres(db) => db.bulk_transition(action, ids, deleted_by).await,
            Self::InMemory(db) => db.bulk_transition(action, ids, deleted_by).await,
        }
    }

    pub async fn delete_registration(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<RegistrationDetail>> {
        match self {
            Self::Postgres(db) => db.delete_registration(id, deleted_by).await,
            Self::InMemory(db) => db.delete_registration(id, deleted_by).await,
        }
    }

    // ============================================
    // Archive
    // ============================================

    pub async fn list_archived_registrations(&self) -> Result<Vec<ArchivedRegistration>> {
        match self {
            Self::Postgres(db) => db.list_archived_registrations().await,
            Self::InMemory(db) => db.list_archived_registrations().await,
        }
    }

    pub async fn restore_registrations(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        match self {
            Self::Postgres(db) => db.restore_registrations(ids).await,
            Self::InMemory(db) => db.restore_registrations(ids).await,
        }
    }

    pub async fn restore_events(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        match self {
            Self::Postgres(db) => db.restore_events(ids).await,
            Self::InMemory(db) => db.restore_events(ids).await,
        }
    }

    pub async fn restore_users(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        match self {
            Self::Postgres(db) => db.restore_users(ids).await,
            Self::InMemory(db) => db.restore_users(ids).await,
        }
    }

    pub async fn purge_registrations(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        match self {
            Self::Postgres(db) => db.purge_registrations(ids).await,
            Self::InMemory(db) => db.purge_registrations(ids).await,
        }
    }

    pub async fn purge_events(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        match self {
            Self::Postgres(db) => db.purge_events(ids).await,
            Self::InMemory(db) => db.purge_events(ids).await,
        }
    }

    pub async fn purge_users(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        match self {
            Self::Postgres(db) => db.purge_users(ids).await,
            Self::InMemory(db) => db.purge_users(ids).await,
        }
    }

    // ============================================
    // Audit logs and notifications
    // ============================================

    pub async fn insert_audit_log(&self, entry: &AuditEntry) -> Result<()> {
        match self {
            Self::Postgres(db) => db.insert_audit_log(entry).await,
            Self::InMemory(db) => db.insert_audit_log(entry).await,
        }
    }

    pub async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>> {
        match self {
            Self::Postgres(db) => db.list_audit_logs(limit).await,
            Self::InMemory(db) => db.list_audit_logs(limit).await,
        }
    }

    pub async fn insert_notification(
        &self,
        user_id: Uuid,
        notification: &NewNotification,
    ) -> Result<()> {
        match self {
            Self::Postgres(db) => db.insert_notification(user_id, notification).await,
            Self::InMemory(db) => db.insert_notification(user_id, notification).await,
        }
    }

    pub async fn insert_admin_notifications(
        &self,
        notification: &NewNotification,
    ) -> Result<usize> {
        match self {
            Self::Postgres(db) => db.insert_admin_notifications(notification).await,
            Self::InMemory(db) => db.insert_admin_notifications(notification).await,
        }
    }

    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<NotificationRow>> {
        match self {
            Self::Postgres(db) => db.list_notifications(user_id, limit).await,
            Self::InMemory(db) => db.list_notifications(user_id, limit).await,
        }
    }
}
