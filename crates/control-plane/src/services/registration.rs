// Registration service: status changes, bulk actions, creation and deletion
//
// Every method runs in two phases: the storage call commits the state change
// (slot ledger included), then side effects are dispatched without awaiting.

use std::sync::Arc;

use eventdesk_core::{
    creation_effects, deletion_effects, dispatch, normalize_ids, transition_effects, Actor,
    BulkAction, BulkOutcome, DeletionSource, Notifier, RegistrationDetail, RegistrationError,
    RegistrationStatus, Result, TransitionOutcome,
};
use uuid::Uuid;

use super::Committed;
use crate::storage::StorageBackend;

pub struct RegistrationService {
    storage: Arc<StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl RegistrationService {
    pub fn new(storage: Arc<StorageBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    /// Admin status change for one registration
    pub async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        next: RegistrationStatus,
        reason: Option<String>,
    ) -> Result<Committed<TransitionOutcome>> {
        actor.require_admin()?;

        let outcome = self.storage.transition_registration(id, next, None).await?;
        tracing::info!(
            registration_id = %id,
            previous = %outcome.previous,
            status = %outcome.status(),
            slot_effect = ?outcome.effect,
            "Registration status changed"
        );

        let effects = transition_effects(
            &outcome,
            actor,
            "registration.status_changed",
            reason.as_deref(),
        );
        Ok(Committed {
            value: outcome,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    /// Apply one action to up to `MAX_BULK_IDS` registrations.
    ///
    /// Ineligible or missing ids are skipped; a capacity shortfall on any
    /// event fails the whole batch.
    pub async fn bulk(
        &self,
        actor: &Actor,
        action: BulkAction,
        ids: &[Uuid],
        reason: Option<String>,
    ) -> Result<Committed<BulkOutcome>> {
        actor.require_admin()?;
        let ids = normalize_ids(ids)?;

        let result = self
            .storage
            .bulk_transition(action, &ids, actor.recorded_id())
            .await?;
        tracing::info!(
            %action,
            processed = result.outcome.processed,
            skipped = result.outcome.skipped,
            "Bulk registration action applied"
        );

        let audit_action = format!("registration.bulk_{action}");
        let mut effects = Vec::new();
        for outcome in &result.transitions {
            effects.extend(transition_effects(
                outcome,
                actor,
                &audit_action,
                reason.as_deref(),
            ));
        }
        effects.extend(deletion_effects(
            &result.deleted,
            actor,
            DeletionSource::AdminBulk,
        ));

        Ok(Committed {
            value: result.outcome,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    /// Register `user_id` (or the caller) for an event.
    ///
    /// Registering someone else requires admin. The initial status is
    /// `pending` when slots remain and `waitlisted` otherwise.
    pub async fn create(
        &self,
        actor: &Actor,
        event_id: Uuid,
        user_id: Option<Uuid>,
    ) -> Result<Committed<RegistrationDetail>> {
        let user_id = match user_id {
            Some(id) if id != actor.id => {
                actor.require_admin()?;
                id
            }
            _ => actor.id,
        };

        let (detail, reconfirmed) = self.storage.create_registration(event_id, user_id).await?;
        tracing::info!(
            registration_id = %detail.id(),
            %event_id,
            %user_id,
            status = %detail.status(),
            reconfirmed,
            "Registration created"
        );

        let effects = creation_effects(&detail, actor, reconfirmed);
        Ok(Committed {
            value: detail,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    /// Attendee withdraws their own registration
    pub async fn cancel_own(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Committed<TransitionOutcome>> {
        let outcome = self
            .storage
            .transition_registration(id, RegistrationStatus::Cancelled, Some(actor.id))
            .await?;
        tracing::info!(
            registration_id = %id,
            previous = %outcome.previous,
            slot_effect = ?outcome.effect,
            "Registration cancelled by holder"
        );

        let effects = transition_effects(
            &outcome,
            actor,
            "registration.cancelled_by_user",
            reason.as_deref(),
        );
        Ok(Committed {
            value: outcome,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<RegistrationDetail> {
        actor.require_admin()?;
        self.storage
            .get_registration(id)
            .await?
            .ok_or_else(RegistrationError::registration_not_found)
    }

    pub async fn list_for_event(
        &self,
        actor: &Actor,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationDetail>> {
        actor.require_admin()?;
        if self.storage.get_event(event_id).await?.is_none() {
            return Err(RegistrationError::not_found("Event not found"));
        }
        self.storage.list_event_registrations(event_id).await
    }

    /// Archive then delete one registration. Slots are not released.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<Committed<RegistrationDetail>> {
        actor.require_admin()?;

        let deleted = self
            .storage
            .delete_registration(id, actor.recorded_id())
            .await?
            .ok_or_else(RegistrationError::registration_not_found)?;
        tracing::info!(registration_id = %id, status = %deleted.status(), "Registration archived and deleted");

        let effects = deletion_effects(
            std::slice::from_ref(&deleted),
            actor,
            DeletionSource::AdminSingle,
        );
        Ok(Committed {
            value: deleted,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }
}
