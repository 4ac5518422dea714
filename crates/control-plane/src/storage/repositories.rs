// PostgreSQL repository
//
// Every operation that touches slot counters or deletes live registrations
// runs in one transaction. Lock order is fixed across all of them:
// registration rows first (ascending id), then event or user rows in id order.
// The core planners decide only after every lock is held.

use std::collections::HashMap;

use anyhow::Context;
use eventdesk_core::{
    authorize_owner_cancel, initial_status, plan_bulk, plan_transition, ArchiveScope,
    ArchivedRegistration, AuditEntry, AuditLogEntry, BulkAction, BulkResult, DeletionSource,
    Event, NewNotification, PurgeOutcome, RegistrationDetail, RegistrationError,
    RegistrationStatus, RestoreOutcome, Result, SlotEffect, SlotLedger, TransitionOutcome,
};
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::models::*;

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at, archived_at";

const EVENT_COLUMNS: &str = "id, title, description, event_date, event_time, location, \
     total_slots, available_slots, status, created_at, updated_at, archived_at";

const DETAIL_SELECT: &str = r#"
    SELECT r.id, r.event_id, r.user_id, r.status, r.registered_at,
           u.name AS user_name, u.email AS user_email,
           e.title AS event_title, e.event_date, e.event_time, e.location AS event_location
    FROM registrations r
    JOIN users u ON u.id = r.user_id
    JOIN events e ON e.id = r.event_id
"#;

const ARCHIVE_COLUMNS: &str = "id, event_id, user_id, status, registered_at, user_name, \
     user_email, event_title, event_date, event_time, event_location, deleted_at, deleted_by, \
     deletion_source";

/// Idempotent archive table DDL, run at boot after migrations
const ARCHIVE_TABLE_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS archived_registrations (
        id UUID PRIMARY KEY,
        event_id UUID NOT NULL,
        user_id UUID NOT NULL,
        status TEXT NOT NULL,
        registered_at TIMESTAMPTZ NOT NULL,
        user_name TEXT NOT NULL,
        user_email TEXT NOT NULL,
        event_title TEXT NOT NULL,
        event_date DATE NOT NULL,
        event_time TIME,
        event_location TEXT,
        deleted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        deleted_by UUID,
        deletion_source TEXT NOT NULL
    )
"#;

/// Map a driver error onto the domain error, turning unique violations into conflicts
fn db_err(e: sqlx::Error) -> RegistrationError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RegistrationError::conflict(format!(
                "Conflicts with an existing record ({})",
                db.constraint().unwrap_or("unique key")
            ));
        }
    }
    RegistrationError::store(e.to_string())
}

fn details(rows: Vec<RegistrationDetailRow>) -> Result<Vec<RegistrationDetail>> {
    rows.into_iter().map(RegistrationDetail::try_from).collect()
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection pool from URL
    pub async fn from_url(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Apply pending migrations and make sure the archive table exists
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        self.ensure_archive_table().await?;
        Ok(())
    }

    pub async fn ensure_archive_table(&self) -> anyhow::Result<()> {
        sqlx::query(ARCHIVE_TABLE_DDL)
            .execute(&self.pool)
            .await
            .context("Failed to create archived_registrations")?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.role.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE archived_at IS NULL ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn list_archived_users(&self) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE archived_at IS NOT NULL ORDER BY archived_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn list_admins(&self) -> Result<Vec<UserRow>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'admin' AND archived_at IS NULL"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    /// Archive the user's registrations, delete them and soft-delete the user.
    /// Returns `None` when no live user has this id.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_user(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        lock_registrations_of(&mut tx, "user_id", id).await?;
        let found: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if found.is_none() {
            return Ok(None);
        }

        let archived = archive_and_delete(
            &mut tx,
            &ArchiveScope::Users(vec![id]),
            deleted_by,
            DeletionSource::UserDeleted,
        )
        .await?;

        sqlx::query("UPDATE users SET archived_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(archived))
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (id, title, description, event_date, event_time, location,
                                total_slots, available_slots, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.event_date)
        .bind(input.event_time)
        .bind(&input.location)
        .bind(input.total_slots)
        .bind(input.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE archived_at IS NULL ORDER BY event_date, event_time"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    pub async fn list_archived_events(&self) -> Result<Vec<EventRow>> {
        sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE archived_at IS NOT NULL ORDER BY archived_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }

    /// Edit an event. A capacity change shifts `available_slots` by the same
    /// delta while the event row is locked.
    #[instrument(skip(self), level = "debug")]
    pub async fn update_event(&self, id: Uuid, input: UpdateEvent) -> Result<Option<EventRow>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, total_slots, available_slots
            FROM events
            WHERE id = $1 AND archived_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        let Some(current) = current else {
            return Ok(None);
        };

        let mut ledger = SlotLedger::new(current.id, current.total_slots, current.available_slots);
        if let Some(total) = input.total_slots {
            ledger.resize(total)?;
        }

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_date = COALESCE($4, event_date),
                event_time = COALESCE($5, event_time),
                location = COALESCE($6, location),
                total_slots = $7,
                available_slots = $8,
                status = COALESCE($9, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.event_date)
        .bind(input.event_time)
        .bind(&input.location)
        .bind(ledger.total_slots)
        .bind(ledger.available_slots)
        .bind(input.status.map(|s| s.to_string()))
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(row))
    }

    /// Archive the event's registrations, delete them and soft-delete the event.
    /// Returns `None` when no live event has this id.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_event(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<Vec<RegistrationDetail>>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        lock_registrations_of(&mut tx, "event_id", id).await?;
        let found: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM events WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if found.is_none() {
            return Ok(None);
        }

        let archived = archive_and_delete(
            &mut tx,
            &ArchiveScope::Events(vec![id]),
            deleted_by,
            DeletionSource::EventDeleted,
        )
        .await?;

        sqlx::query("UPDATE events SET archived_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(archived))
    }

    // ============================================
    // Registrations
    // ============================================

    pub async fn get_registration(&self, id: Uuid) -> Result<Option<RegistrationDetail>> {
        sqlx::query_as::<_, RegistrationDetailRow>(&format!("{DETAIL_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(RegistrationDetail::try_from)
            .transpose()
    }

    pub async fn list_event_registrations(&self, event_id: Uuid) -> Result<Vec<RegistrationDetail>> {
        let rows = sqlx::query_as::<_, RegistrationDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE r.event_id = $1 ORDER BY r.registered_at"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        details(rows)
    }

    /// Register `user_id` for `event_id`, reusing a cancelled row for the pair.
    /// Returns the written registration and whether it was a reconfirmation.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<(RegistrationDetail, bool)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let existing = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, status FROM registrations WHERE event_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let event: Event = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| RegistrationError::not_found("Event not found"))?
        .into();
        if !event.accepts_registrations() {
            return Err(RegistrationError::EventClosed(event_id));
        }

        let user_live: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;
        if user_live.is_none() {
            return Err(RegistrationError::not_found("User not found"));
        }

        let status = initial_status(event.available_slots);
        let (registration_id, reconfirmed) = match existing {
            Some((id, current)) if current == RegistrationStatus::Cancelled.as_str() => {
                sqlx::query(
                    "UPDATE registrations SET status = $2, registered_at = NOW() WHERE id = $1",
                )
                .bind(id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                (id, true)
            }
            Some(_) => {
                return Err(RegistrationError::conflict("Already registered for this event"));
            }
            None => {
                let id = Uuid::now_v7();
                sqlx::query(
                    r#"
                    INSERT INTO registrations (id, event_id, user_id, status, registered_at)
                    VALUES ($1, $2, $3, $4, NOW())
                    "#,
                )
                .bind(id)
                .bind(event_id)
                .bind(user_id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                (id, false)
            }
        };

        let row = sqlx::query_as::<_, RegistrationDetailRow>(&format!("{DETAIL_SELECT} WHERE r.id = $1"))
            .bind(registration_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok((RegistrationDetail::try_from(row)?, reconfirmed))
    }

    /// Move one registration to `next`, adjusting the event's slot counter.
    ///
    /// With `owner` set, the change is an attendee withdrawing their own
    /// registration and ownership is checked under the same lock.
    #[instrument(skip(self), level = "debug")]
    pub async fn transition_registration(
        &self,
        id: Uuid,
        next: RegistrationStatus,
        owner: Option<Uuid>,
    ) -> Result<TransitionOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current: RegistrationDetail = sqlx::query_as::<_, RegistrationDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE r.id = $1 FOR UPDATE OF r"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(RegistrationError::registration_not_found)?
        .try_into()?;

        if let Some(owner) = owner {
            authorize_owner_cancel(&current, owner)?;
        }

        let slots = sqlx::query_as::<_, SlotRow>(
            "SELECT id, total_slots, available_slots FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(current.event_id())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        let mut ledger = SlotLedger::new(slots.id, slots.total_slots, slots.available_slots);

        let plan = plan_transition(&current, next, &mut ledger)?;

        if plan.effect != SlotEffect::Unchanged {
            write_ledger(&mut tx, &ledger).await?;
        }

        sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(next.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let mut detail = current;
        detail.registration.status = next;
        Ok(TransitionOutcome {
            detail,
            previous: plan.previous,
            effect: plan.effect,
        })
    }

    /// Apply a bulk action to already-normalized ids, all or nothing.
    #[instrument(skip(self, ids), fields(count = ids.len()), level = "debug")]
    pub async fn bulk_transition(
        &self,
        action: BulkAction,
        ids: &[Uuid],
        deleted_by: Option<Uuid>,
    ) -> Result<BulkResult> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let rows = sqlx::query_as::<_, RegistrationDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE r.id = ANY($1) ORDER BY r.id FOR UPDATE OF r"
        ))
        .bind(ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;
        let locked = details(rows)?;

        let mut event_ids: Vec<Uuid> = locked.iter().map(|d| d.event_id()).collect();
        event_ids.sort();
        event_ids.dedup();

        let slot_rows = sqlx::query_as::<_, SlotRow>(
            r#"
            SELECT id, total_slots, available_slots
            FROM events
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&event_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;
        let mut ledgers: HashMap<Uuid, SlotLedger> = slot_rows
            .into_iter()
            .map(|r| (r.id, SlotLedger::new(r.id, r.total_slots, r.available_slots)))
            .collect();

        let plan = plan_bulk(action, ids, locked, &mut ledgers)?;
        if plan.is_empty() {
            tx.rollback().await.map_err(db_err)?;
            return Ok(BulkResult::empty(plan.skipped.len()));
        }

        for event_id in plan.slot_deltas.keys() {
            if let Some(ledger) = ledgers.get(event_id) {
                write_ledger(&mut tx, ledger).await?;
            }
        }

        if action == BulkAction::Delete {
            archive_and_delete(
                &mut tx,
                &ArchiveScope::Registrations(plan.eligible_ids()),
                deleted_by,
                DeletionSource::AdminBulk,
            )
            .await?;
        } else {
            // Row by row: each row keeps its own previous status for the notify phase.
            for item in &plan.eligible {
                let Some(next) = item.next else { continue };
                sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
                    .bind(item.detail.id())
                    .bind(next.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(BulkResult::from_plan(&plan))
    }

    /// Archive and delete one registration. No slot change.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_registration(
        &self,
        id: Uuid,
        deleted_by: Option<Uuid>,
    ) -> Result<Option<RegistrationDetail>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut archived = archive_and_delete(
            &mut tx,
            &ArchiveScope::Registrations(vec![id]),
            deleted_by,
            DeletionSource::AdminSingle,
        )
        .await?;
        tx.commit().await.map_err(db_err)?;
        Ok(archived.pop())
    }

    // ============================================
    // Archive
    // ============================================

    pub async fn list_archived_registrations(&self) -> Result<Vec<ArchivedRegistration>> {
        sqlx::query_as::<_, ArchivedRegistrationRow>(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archived_registrations ORDER BY deleted_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(ArchivedRegistration::try_from)
        .collect()
    }

    /// Re-insert live rows from snapshots, skipping ids that are not archived,
    /// collide with a live row or pair, or whose event or user is gone.
    #[instrument(skip(self, ids), fields(count = ids.len()), level = "debug")]
    pub async fn restore_registrations(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut outcome = RestoreOutcome::default();

        for id in ids {
            let snapshot = sqlx::query_as::<_, ArchivedRegistrationRow>(&format!(
                "SELECT {ARCHIVE_COLUMNS} FROM archived_registrations WHERE id = $1 FOR UPDATE"
            ))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
            let Some(snapshot) = snapshot else {
                outcome.skipped_count += 1;
                continue;
            };

            let parents_live: bool = sqlx::query_scalar(
                r#"
                SELECT EXISTS (SELECT 1 FROM events WHERE id = $1 AND archived_at IS NULL)
                   AND EXISTS (SELECT 1 FROM users WHERE id = $2 AND archived_at IS NULL)
                "#,
            )
            .bind(snapshot.event_id)
            .bind(snapshot.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
            if !parents_live {
                outcome.skipped_count += 1;
                continue;
            }

            let inserted = sqlx::query(
                r#"
                INSERT INTO registrations (id, event_id, user_id, status, registered_at)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(snapshot.id)
            .bind(snapshot.event_id)
            .bind(snapshot.user_id)
            .bind(&snapshot.status)
            .bind(snapshot.registered_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            if inserted.rows_affected() == 0 {
                outcome.skipped_count += 1;
                continue;
            }

            sqlx::query("DELETE FROM archived_registrations WHERE id = $1")
                .bind(snapshot.id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            outcome.restored += 1;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(outcome)
    }

    pub async fn restore_events(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE events SET archived_at = NULL, updated_at = NOW()
            WHERE id = ANY($1) AND archived_at IS NOT NULL
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let restored = result.rows_affected() as usize;
        Ok(RestoreOutcome {
            restored,
            skipped_count: ids.len() - restored,
        })
    }

    pub async fn restore_users(&self, ids: &[Uuid]) -> Result<RestoreOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE users SET archived_at = NULL, updated_at = NOW()
            WHERE id = ANY($1) AND archived_at IS NOT NULL
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let restored = result.rows_affected() as usize;
        Ok(RestoreOutcome {
            restored,
            skipped_count: ids.len() - restored,
        })
    }

    pub async fn purge_registrations(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let result = sqlx::query("DELETE FROM archived_registrations WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        let deleted = result.rows_affected() as usize;
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    pub async fn purge_events(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let result = sqlx::query(
            r#"
            DELETE FROM events e
            WHERE e.id = ANY($1)
              AND e.archived_at IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM registrations r WHERE r.event_id = e.id)
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let deleted = result.rows_affected() as usize;
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    pub async fn purge_users(&self, ids: &[Uuid]) -> Result<PurgeOutcome> {
        let result = sqlx::query(
            r#"
            DELETE FROM users u
            WHERE u.id = ANY($1)
              AND u.archived_at IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM registrations r WHERE r.user_id = u.id)
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        let deleted = result.rows_affected() as usize;
        Ok(PurgeOutcome {
            deleted,
            skipped_count: ids.len() - deleted,
        })
    }

    // ============================================
    // Audit logs and notifications
    // ============================================

    pub async fn insert_audit_log(&self, entry: &AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, actor_id, actor_role, action, entity_type, entity_id, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(entry.actor_id)
        .bind(entry.actor_role.to_string())
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    pub async fn list_audit_logs(&self, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, actor_id, actor_role, action, entity_type, entity_id, details, created_at
            FROM audit_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows.into_iter().map(AuditLogEntry::from).collect())
    }

    pub async fn insert_notification(&self, user_id: Uuid, notification: &NewNotification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, link)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.link)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    /// One notification row per live admin. Returns the number written.
    pub async fn insert_admin_notifications(&self, notification: &NewNotification) -> Result<usize> {
        let admins = self.list_admins().await?;
        for admin in &admins {
            self.insert_notification(admin.id, notification).await?;
        }
        Ok(admins.len())
    }

    pub async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<NotificationRow>> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, title, message, link, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}

/// Lock the live registrations of one event or user in id order, ahead of
/// the parent row
async fn lock_registrations_of(conn: &mut PgConnection, column: &str, id: Uuid) -> Result<()> {
    sqlx::query(&format!(
        "SELECT id FROM registrations WHERE {column} = $1 ORDER BY id FOR UPDATE"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

/// Persist a ledger that was read under the event row lock
async fn write_ledger(conn: &mut PgConnection, ledger: &SlotLedger) -> Result<()> {
    sqlx::query("UPDATE events SET available_slots = $2, updated_at = NOW() WHERE id = $1")
        .bind(ledger.event_id)
        .bind(ledger.available_slots)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

/// Snapshot every live registration in `scope` into the archive, then delete
/// the live rows. Both statements run on the caller's transaction; the delete
/// only happens after every snapshot row was written. An existing snapshot
/// with the same id is never overwritten and aborts the whole transaction.
async fn archive_and_delete(
    conn: &mut PgConnection,
    scope: &ArchiveScope,
    deleted_by: Option<Uuid>,
    source: DeletionSource,
) -> Result<Vec<RegistrationDetail>> {
    if scope.is_empty() {
        return Ok(Vec::new());
    }
    let (column, ids) = match scope {
        ArchiveScope::Registrations(ids) => ("r.id", ids),
        ArchiveScope::Events(ids) => ("r.event_id", ids),
        ArchiveScope::Users(ids) => ("r.user_id", ids),
    };

    let rows = sqlx::query_as::<_, RegistrationDetailRow>(&format!(
        "{DETAIL_SELECT} WHERE {column} = ANY($1) ORDER BY r.id FOR UPDATE OF r"
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_err)?;
    let archived = details(rows)?;
    if archived.is_empty() {
        return Ok(archived);
    }
    let registration_ids: Vec<Uuid> = archived.iter().map(|d| d.id()).collect();

    let inserted = sqlx::query(&format!(
        r#"
        INSERT INTO archived_registrations ({ARCHIVE_COLUMNS})
        SELECT r.id, r.event_id, r.user_id, r.status, r.registered_at,
               u.name, u.email, e.title, e.event_date, e.event_time, e.location,
               NOW(), $2, $3
        FROM registrations r
        JOIN users u ON u.id = r.user_id
        JOIN events e ON e.id = r.event_id
        WHERE r.id = ANY($1)
        ON CONFLICT (id) DO NOTHING
        "#
    ))
    .bind(&registration_ids)
    .bind(deleted_by)
    .bind(source.as_str())
    .execute(&mut *conn)
    .await
    .map_err(db_err)?;

    if inserted.rows_affected() as usize != registration_ids.len() {
        return Err(RegistrationError::store(format!(
            "Archived {} of {} registrations; refusing to delete",
            inserted.rows_affected(),
            registration_ids.len()
        )));
    }

    sqlx::query("DELETE FROM registrations WHERE id = ANY($1)")
        .bind(&registration_ids)
        .execute(&mut *conn)
        .await
        .map_err(db_err)?;

    tracing::debug!(
        count = registration_ids.len(),
        source = %source,
        "Archived and deleted registrations"
    );
    Ok(archived)
}
