// Archive service: browse, restore and purge archived items

use std::sync::Arc;

use eventdesk_core::{
    dispatch, normalize_ids, Actor, ArchivedRegistration, AuditEntry, Event, Notifier,
    PurgeOutcome, RestoreOutcome, Result, SideEffect,
};
use serde_json::json;
use uuid::Uuid;

use super::Committed;
use crate::storage::{StorageBackend, UserRow};

/// Which archive a restore or purge targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Registrations,
    Events,
    Users,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Registrations => "registrations",
            ArchiveKind::Events => "events",
            ArchiveKind::Users => "users",
        }
    }

    fn entity_type(&self) -> &'static str {
        match self {
            ArchiveKind::Registrations => "registration",
            ArchiveKind::Events => "event",
            ArchiveKind::Users => "user",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ArchiveService {
    storage: Arc<StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl ArchiveService {
    pub fn new(storage: Arc<StorageBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    pub async fn list_registrations(&self, actor: &Actor) -> Result<Vec<ArchivedRegistration>> {
        actor.require_admin()?;
        self.storage.list_archived_registrations().await
    }

    pub async fn list_events(&self, actor: &Actor) -> Result<Vec<Event>> {
        actor.require_admin()?;
        let rows = self.storage.list_archived_events().await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    pub async fn list_users(&self, actor: &Actor) -> Result<Vec<UserRow>> {
        actor.require_admin()?;
        self.storage.list_archived_users().await
    }

    /// Bring archived items back. Items that cannot be restored are counted
    /// in `skipped_count`, never reported as errors.
    pub async fn restore(
        &self,
        actor: &Actor,
        kind: ArchiveKind,
        ids: &[Uuid],
    ) -> Result<Committed<RestoreOutcome>> {
        actor.require_admin()?;
        let ids = normalize_ids(ids)?;

        let outcome = match kind {
            ArchiveKind::Registrations => self.storage.restore_registrations(&ids).await?,
            ArchiveKind::Events => self.storage.restore_events(&ids).await?,
            ArchiveKind::Users => self.storage.restore_users(&ids).await?,
        };
        tracing::info!(
            %kind,
            restored = outcome.restored,
            skipped = outcome.skipped_count,
            "Archive restore"
        );

        let effects = vec![self.audit(actor, kind, "restore", &ids, outcome.restored)];
        Ok(Committed {
            value: outcome,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    /// Permanently remove archived items
    pub async fn purge(
        &self,
        actor: &Actor,
        kind: ArchiveKind,
        ids: &[Uuid],
    ) -> Result<Committed<PurgeOutcome>> {
        actor.require_admin()?;
        let ids = normalize_ids(ids)?;

        let outcome = match kind {
            ArchiveKind::Registrations => self.storage.purge_registrations(&ids).await?,
            ArchiveKind::Events => self.storage.purge_events(&ids).await?,
            ArchiveKind::Users => self.storage.purge_users(&ids).await?,
        };
        tracing::info!(
            %kind,
            deleted = outcome.deleted,
            skipped = outcome.skipped_count,
            "Archive purge"
        );

        let effects = vec![self.audit(actor, kind, "purge", &ids, outcome.deleted)];
        Ok(Committed {
            value: outcome,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    fn audit(
        &self,
        actor: &Actor,
        kind: ArchiveKind,
        verb: &str,
        ids: &[Uuid],
        affected: usize,
    ) -> SideEffect {
        SideEffect::Audit(
            AuditEntry::new(
                actor,
                format!("archive.{}.{verb}", kind.entity_type()),
                kind.entity_type(),
            )
            .details(json!({ "ids": ids, "affected": affected })),
        )
    }
}
