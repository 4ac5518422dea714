// In-memory storage implementation for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: One lock over every table; a write guard held for a whole
//           operation stands in for the PostgreSQL transaction and row locks
//
// This implementation mirrors the PostgreSQL repository API, allowing the
// control-plane to run without a database. Guards are never held across an
// await point.

use std::collections::HashMap;

use chrono::Utc;
use eventdesk_core::{
    authorize_owner_cancel, initial_status, plan_bulk, plan_transition, ArchiveScope,
    ArchivedRegistration, AuditEntry, AuditLogEntry, BulkAction, BulkResult, DeletionSource,
    Event, NewNotification, PurgeOutcome, Registration, RegistrationDetail, RegistrationError,
    RegistrationStatus, RestoreOutcome, Result, SlotLedger, TransitionOutcome,
};
use parking_lot::RwLock;
use uuid::Uuid;

use super::models::*;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    events: HashMap<Uuid, EventRow>,
    registrations: HashMap<Uuid, Registration>,
    archived: HashMap<Uuid, ArchivedRegistration>,
    audit_logs: Vec<AuditLogEntry>,
    notifications: Vec<NotificationRow>,
}

impl Tables {
    fn detail(&self, registration: &Registration) -> Result<RegistrationDetail> {
        let user = self
            .users
            .get(&registration.user_id)
            .ok_or_else(|| RegistrationError::store("Registration references a missing user"))?;
        let event = self
            .events
            .get(&registration.event_id)
            .ok_or_else(|| RegistrationError::store("Registration references a missing event"))?;
        Ok(RegistrationDetail {
            registration: registration.clone(),
            user: user.summary(),
            event: Event::from(event.clone()).summary(),
        })
    }

    fn ledger(&self, event_id: Uuid) -> Option<SlotLedger> {
        self.events
            .get(&event_id)
            .map(|e| SlotLedger::new(e.id, e.total_slots, e.available_slots))
    }

    fn write_ledger(&mut self, ledger: &SlotLedger) {
        if let Some(event) = self.events.get_mut(&ledger.event_id) {
            event.available_slots = ledger.available_slots;
            event.total_slots = ledger.total_slots;
            event.updated_at = Utc::now();
        }
    }

    /// Snapshot then remove every live registration in `scope`
    fn archive_and_delete(
        &mut self,
        scope: &ArchiveScope,
        deleted_by: Option<Uuid>,
        source: DeletionSource,
    ) -> Result<Vec<RegistrationDetail>> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }
        let mut matching: Vec<&Registration> = self
            .registrations
            .values()
            .filter(|r| scope.matches(r))
            .collect();
        matching.sort_by_key(|r| r.id);
        let archived = matching
            .into_iter()
            .map(|r| self.detail(r))
            .collect::<Result<Vec<_>>>()?;
        if let Some(clash) = archived.iter().find(|d| self.archived.contains_key(&d.id())) {
            return Err(RegistrationError::store(format!(
                "Registration {} already has an archive snapshot; refusing to delete",
                clash.id()
            )));
        }

        let deleted_at = Utc::now();
        for detail in &archived {
            self.archived.insert(
                detail.id(),
                ArchivedRegistration::snapshot(detail, deleted_by, source, deleted_at),
            );
        }
        for detail in &archived {
            self.registrations.remove(&detail.id());
        }
        Ok(archived)
    }
}

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let mut tables = self.tables.write();
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(RegistrationError::conflict(
                "Conflicts with an existing record (users_email_key)",
            ));
        }
        let now = Utc::now();
        let row = UserRow {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email,
            role: input.role.to_string(),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        let mut users: Vec<UserRow> = self
            .tables
            .read()
            .users
            .values()
            .filter(|u| u.is_live())
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    pub async fn list_archived_users(&self) -> Result<Vec<UserRow>> {
        let mut users: Vec<UserRow> = self
            .tables
            .read()
            .users
            .values()
            .filter(|u| !u.is_live())
            .cloned()
            .collect();
        users.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        Ok(users)
    }

    pub async fn list_admins(&self) -> Result<Vec<UserRow>> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .filter(|u| u.is_live() && u.role == "admin")
            .cloned()
            .collect())
    }

    pub async fn delete_user(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        let mut tables = self.tables.write();
        if !tables.users.get(&id).is_some_and(UserRow::is_live) {
            return Ok(None);
        }
        let archived = tables.archive_and_delete(
            &ArchiveScope::Users(vec![id]),
            deleted_by,
            DeletionSource::UserDeleted,
        )?;
        if let Some(user) = tables.users.get_mut(&id) {
            let now = Utc::now();
            user.archived_at = Some(now);
            user.updated_at = now;
        }
        Ok(Some(archived))
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        let now = Utc::now();
        let row = EventRow {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            event_date: input.event_date,
            event_time: input.event_time,
            location: input.location,
            total_slots: input.total_slots,
            available_slots: input.total_slots,
            status: input.status.to_string(),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        self.tables.write().events.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        Ok(self.tables.read().events.get(&id).cloned())
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        let mut events: Vec<EventRow> = self
            .tables
            .read()
            .events
            .values()
            .filter(|e| e.archived_at.is_none())
            .cloned()
            .collect();
        events.sort_by(|a, b| (a.event_date, a.event_time).cmp(&(b.event_date, b.event_time)));
        Ok(events)
    }

    pub async fn list_archived_events(&self) -> Result<Vec<EventRow>> {
        let mut events: Vec<EventRow> = self
            .tables
            .read()
            .events
            .values()
            .filter(|e| e.archived_at.is_some())
            .cloned()
            .collect();
        events.sort_by(|a, b| b.archived_at.cmp(&a.archived_at));
        Ok(events)
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEvent) -> Result<Option<EventRow>> {
        let mut tables = self.tables.write();
        let Some(mut ledger) = tables
            .events
            .get(&id)
            .filter(|e| e.archived_at.is_none())
            .map(|e| SlotLedger::new(e.id, e.total_slots, e.available_slots))
        else {
            return Ok(None);
        };
        if let Some(total) = input.total_slots {
            ledger.resize(total)?;
        }

        let Some(event) = tables.events.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = input.title {
            event.title = title;
        }
        if let Some(description) = input.description {
            event.description = Some(description);
        }
        if let Some(date) = input.event_date {
            event.event_date = date;
        }
        if let Some(time) = input.event_time {
            event.event_time = Some(time);
        }
        if let Some(location) = input.location {
            event.location = Some(location);
        }
        if let Some(status) = input.status {
            event.status = status.to_string();
        }
        event.total_slots = ledger.total_slots;
        event.available_slots = ledger.available_slots;
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    pub async fn delete_event(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        let mut tables = self.tables.write();
        if !tables.events.get(&id).is_some_and(|e| e.archived_at.is_none()) {
            return Ok(None);
        }
        let archived = tables.archive_and_delete(
            &ArchiveScope::Events(vec![id]),
            deleted_by,
            DeletionSource::EventDeleted,
        )?;
        if let Some(event) = tables.events.get_mut(&id) {
            let now = Utc::now();
            event.archived_at = Some(now);
            event.updated_at = now;
        }
        Ok(Some(archived))
    }

    // ============================================
    // Registrations
    // ============================================

    pub async fn get_registration(&self, id: Uuid) -> Result<Option<RegistrationDetail>> {
        let tables = self.tables.read();
        tables
            .registrations
            .get(&id)
            .map(|r| tables.detail(r))
            .transpose()
    }

    pub async fn list_event_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationDetail>> {
        let tables = self.tables.read();
        let mut rows: Vec<&Registration> = tables
            .registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .collect();
        rows.sort_by_key(|r| r.registered_at);
        rows.into_iter().map(|r| tables.detail(r)).collect()
    }

    pub async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(RegistrationDetail, bool)> {
        let mut tables = self.tables.write();

        let event: Event = tables
            .events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| RegistrationError::not_found("Event not found"))?
            .into();
        if !event.accepts_registrations() {
            return Err(RegistrationError::EventClosed(event_id));
        }
        if !tables.users.get(&user_id).is_some_and(UserRow::is_live) {
            return Err(RegistrationError::not_found("User not found"));
        }

        let status = initial_status(event.available_slots);
        let existing = tables
            .registrations
            .values_mut()
            .find(|r| r.event_id == event_id && r.user_id == user_id);

        let (registration, reconfirmed) = match existing {
            Some(r) if r.status == RegistrationStatus::Cancelled => {
                r.status = status;
                r.registered_at = Utc::now();
                (r.clone(), true)
            }
            Some(_) => {
                return Err(RegistrationError::conflict("Already registered for this event"));
            }
            None => {
                let r = Registration {
                    id: Uuid::now_v7(),
                    event_id,
                    user_id,
                    status,
                    registered_at: Utc::now(),
                };
                tables.registrations.insert(r.id, r.clone());
                (r, false)
            }
        };

        Ok((tables.detail(&registration)?, reconfirmed))
    }

    pub async fn transition_registration(
        &self,
        id: Uuid,
        next: RegistrationStatus,
        owner: Option<Uuid>,
    ) -> Result<TransitionOutcome> {
        let mut tables = self.tables.write();

        let current = tables
            .registrations
            .get(&id)
            .map(|r| tables.detail(r))
            .transpose()?
            .ok_or_else(RegistrationError::registration_not_found)?;
        if let Some(owner) = owner {
            authorize_owner_cancel(&current, owner)?;
        }

        let mut ledger = tables
            .ledger(current.event_id())
            .ok_or_else(|| RegistrationError::not_found("Event not found"))?;
        let plan = plan_transition(&current, next, &mut ledger)?;

        tables.write_ledger(&ledger);
        if let Some(r) = tables.registrations.get_mut(&id) {
            r.status = next;
        }

        let mut detail = current;
        detail.registration.status = next;
        Ok(TransitionOutcome {
            detail,
            previous: plan.previous,
            effect: plan.effect,
        })
    }

    pub async fn bulk_transition(
        &self,
        action: BulkAction,
        ids: &[Uuid],
        deleted_by: Option<Uuid>,
    ) -> Result<BulkResult> {
        let mut tables = self.tables.write();

        let locked = ids
            .iter()
            .filter_map(|id| tables.registrations.get(id))
            .map(|r| tables.detail(r))
            .collect::<Result<Vec<_>>>()?;
        let mut ledgers: HashMap<Uuid, SlotLedger> = locked
            .iter()
            .filter_map(|d| tables.ledger(d.event_id()))
            .map(|l| (l.event_id, l))
            .collect();

        let plan = plan_bulk(action, ids, locked, &mut ledgers)?;
        if plan.is_empty() {
            return Ok(BulkResult::empty(plan.skipped.len()));
        }

        for event_id in plan.slot_deltas.keys() {
            if let Some(ledger) = ledgers.get(event_id) {
                tables.write_ledger(ledger);
            }
        }

        if action == BulkAction::Delete {
            tables.archive_and_delete(
                &ArchiveScope::Registrations(plan.eligible_ids()),
                deleted_by,
                DeletionSource::AdminBulk,
            )?;
        } else {
            for item in &plan.eligible {
                if let (Some(next), Some(r)) =
                    (item.next, tables.registrations.get_mut(&item.detail.id()))
                {
                    r.status = next;
                }
            }
        }

        Ok(BulkResult::from_plan(&plan))
    }

    pub async fn delete_registration(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<RegistrationDetail>> {
        let mut archived = self.tables.write().archive_and_delete(
            &ArchiveScope::Registrations(vec![id]),
            deleted_by,
            DeletionSource::AdminSingle,
        )?;
        Ok(archived.pop())
    }

    // ============================================
    // Archive
    // ============================================

    pub async fn list_archived_registrations(&self) -> Result<Vec<ArchivedRegistration>> {
        let mut rows: Vec<ArchivedRegistration> =
            self.tables.read().archived.values().cloned().collect();
        rows.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
        Ok(rows)
    }

    pub async fn restore_registrations(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let mut tables = self.tables.write();
        let mut outcome = RestoreOutcome::default();

        for id in ids {
            let Some(snapshot) = tables.archived.get(id).cloned() else {
                outcome.skipped_count += 1;
                continue;
            };
            let parents_live = tables
                .events
                .get(&snapshot.event_id)
                .is_some_and(|e| e.archived_at.is_none())
                && tables.users.get(&snapshot.user_id).is_some_and(UserRow::is_live);
            let collides = tables.registrations.values().any(|r| {
                r.id == snapshot.id
                    || (r.event_id == snapshot.event_id && r.user_id == snapshot.user_id)
            });
            if !parents_live || collides {
                outcome.skipped_count += 1;
                continue;
            }

            let registration = snapshot.to_registration();
            tables.registrations.insert(registration.id, registration);
            tables.archived.remove(id);
            outcome.restored += 1;
        }
        Ok(outcome)
    }

    pub async fn restore_events(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let mut tables = self.tables.write();
        let mut outcome = RestoreOutcome::default();
        for id in ids {
            match tables.events.get_mut(id) {
                Some(event) if event.archived_at.is_some() => {
                    event.archived_at = None;
                    event.updated_at = Utc::now();
                    outcome.restored += 1;
                }
                _ => outcome.skipped_count += 1,
            }
        }
        Ok(outcome)
    }

    pub async fn restore_users(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let mut tables = self.tables.write();
        let mut outcome = RestoreOutcome::default();
        for id in ids {
            match tables.users.get_mut(id) {
                Some(user) if user.archived_at.is_some() => {
                    user.archived_at = None;
                    user.updated_at = Utc::now();
                    outcome.restored += 1;
                }
                _ => outcome.skipped_count += 1,
            }
        }
        Ok(outcome)
    }

    pub async fn purge_registrations(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let mut tables = self.tables.write();
        let deleted = ids
            .iter()
            .filter(|id| tables.archived.remove(*id).is_some())
            .count();
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    pub async fn purge_events(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let mut tables = self.tables.write();
        let mut deleted = 0;
        for id in ids {
            let archived = tables.events.get(id).is_some_and(|e| e.archived_at.is_some());
            let referenced = tables.registrations.values().any(|r| r.event_id == *id);
            if archived && !referenced {
                tables.events.remove(id);
                deleted += 1;
            }
        }
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    pub async fn purge_users(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let mut tables = self.tables.write();
        let mut deleted = 0;
        for id in ids {
            let archived = tables.users.get(id).is_some_and(|u| !u.is_live());
            let referenced = tables.registrations.values().any(|r| r.user_id == *id);
            if archived && !referenced {
                tables.users.remove(id);
                tables.notifications.retain(|n| n.user_id != *id);
                deleted += 1;
            }
        }
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    // ============================================
    // Audit logs and notifications
    // ============================================

    pub async fn insert_audit_log(&self, entry: &AuditEntry) -> Result<()> {
        self.tables.write().audit_logs.push(AuditLogEntry {
            id: Uuid::now_v7(),
            actor_id: entry.actor_id,
            actor_role: entry.actor_role,
            action: entry.action.clone(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            details: entry.details.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let tables = self.tables.read();
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    pub async fn insert_notification(&self, user_id: Uuid, notification: &NewNotification) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            return Err(RegistrationError::not_found("User not found"));
        }
        tables.notifications.push(NotificationRow {
            id: Uuid::now_v7(),
            user_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            link: notification.link.clone(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    pub async fn insert_admin_notifications(&self, notification: &NewNotification) -> Result<usize> {
        let admins = self.list_admins().await?;
        for admin in &admins {
            self.insert_notification(admin.id, notification).await?;
        }
        Ok(admins.len())
    }

    pub async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<NotificationRow>> {
        let tables = self.tables.read();
        Ok(tables
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
