// Single-registration transition engine
//
// The storage backends read the registration and its event under lock, call
// `plan_transition` to validate and mutate the in-memory ledger copy, then
// persist the ledger and the new status before committing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RegistrationError, Result};
use crate::event::SlotLedger;
use crate::registration::{RegistrationDetail, RegistrationStatus};

/// What a status change does to the event's slot counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotEffect {
    /// Entering `confirmed`: take one slot.
    Consume,
    /// Leaving `confirmed` for anything but `attended`: give one back.
    Release,
    /// No counter change.
    Unchanged,
}

impl SlotEffect {
    /// Change applied to `availableSlots`
    pub fn delta(&self) -> i32 {
        match self {
            SlotEffect::Consume => -1,
            SlotEffect::Release => 1,
            SlotEffect::Unchanged => 0,
        }
    }
}

/// Slot effect of moving from `previous` to `next`.
pub fn slot_effect(previous: RegistrationStatus, next: RegistrationStatus) -> SlotEffect {
    use RegistrationStatus::*;

    if next == Confirmed && previous != Confirmed {
        return SlotEffect::Consume;
    }
    if previous == Confirmed && !matches!(next, Confirmed | Attended) {
        return SlotEffect::Release;
    }
    SlotEffect::Unchanged
}

/// A validated single transition, ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub registration_id: Uuid,
    pub previous: RegistrationStatus,
    pub next: RegistrationStatus,
    pub effect: SlotEffect,
}

/// Validate a transition and apply its slot effect to `ledger`.
///
/// `ledger` must have been read under the event row lock. On error the ledger
/// is left untouched and the caller must roll back. Moving out of `attended`
/// is rejected.
pub fn plan_transition(
    current: &RegistrationDetail,
    next: RegistrationStatus,
    ledger: &mut SlotLedger,
) -> Result<TransitionPlan> {
    let previous = current.status();
    if previous == RegistrationStatus::Attended && next != RegistrationStatus::Attended {
        return Err(RegistrationError::validation(format!(
            "Attendance already recorded; cannot move registration to {next}"
        )));
    }
    let effect = slot_effect(previous, next);

    match effect {
        SlotEffect::Consume => ledger.consume(1, &current.event.title)?,
        SlotEffect::Release => ledger.release(1),
        SlotEffect::Unchanged => {}
    }

    tracing::debug!(
        registration_id = %current.id(),
        %previous,
        %next,
        ?effect,
        available = ledger.available_slots,
        "Planned registration transition"
    );

    Ok(TransitionPlan {
        registration_id: current.id(),
        previous,
        next,
        effect,
    })
}

/// Check that `owner` may withdraw `current` themselves.
///
/// Called under the registration row lock, before `plan_transition`.
pub fn authorize_owner_cancel(current: &RegistrationDetail, owner: Uuid) -> Result<()> {
    if current.registration.user_id != owner {
        return Err(RegistrationError::forbidden(
            "Only the registration holder may cancel it",
        ));
    }
    if current.status().is_terminal() {
        return Err(RegistrationError::validation(format!(
            "Registration is already {}",
            current.status()
        )));
    }
    Ok(())
}

/// Committed result of one status change, carried into the notify phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// Registration as written (status already updated)
    pub detail: RegistrationDetail,
    pub previous: RegistrationStatus,
    pub effect: SlotEffect,
}

impl TransitionOutcome {
    pub fn status(&self) -> RegistrationStatus {
        self.detail.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{EventSummary, Registration, UserSummary};
    use chrono::{NaiveDate, Utc};
    use RegistrationStatus::*;

    fn detail(status: RegistrationStatus) -> RegistrationDetail {
        RegistrationDetail {
            registration: Registration {
                id: Uuid::now_v7(),
                event_id: Uuid::now_v7(),
                user_id: Uuid::now_v7(),
                status,
                registered_at: Utc::now(),
            },
            user: UserSummary {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            event: EventSummary {
                title: "Pitch Night".to_string(),
                event_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
                event_time: None,
                location: None,
            },
        }
    }

    #[test]
    fn test_slot_effect_table() {
        assert_eq!(slot_effect(Pending, Confirmed), SlotEffect::Consume);
        assert_eq!(slot_effect(Waitlisted, Confirmed), SlotEffect::Consume);
        assert_eq!(slot_effect(Confirmed, Confirmed), SlotEffect::Unchanged);
        assert_eq!(slot_effect(Confirmed, Attended), SlotEffect::Unchanged);
        assert_eq!(slot_effect(Confirmed, Cancelled), SlotEffect::Release);
        assert_eq!(slot_effect(Confirmed, NoShow), SlotEffect::Release);
        assert_eq!(slot_effect(Confirmed, Rejected), SlotEffect::Release);
        assert_eq!(slot_effect(Confirmed, Pending), SlotEffect::Release);
        assert_eq!(slot_effect(Pending, Rejected), SlotEffect::Unchanged);
        assert_eq!(slot_effect(Attended, Cancelled), SlotEffect::Unchanged);
    }

    #[test]
    fn test_approve_consumes_a_slot() {
        let current = detail(Pending);
        let mut ledger = SlotLedger::new(current.event_id(), 2, 1);
        let plan = plan_transition(&current, Confirmed, &mut ledger).unwrap();
        assert_eq!(plan.effect, SlotEffect::Consume);
        assert_eq!(ledger.available_slots, 0);
    }

    #[test]
    fn test_approve_without_slots_fails() {
        let current = detail(Waitlisted);
        let mut ledger = SlotLedger::new(current.event_id(), 1, 0);
        let err = plan_transition(&current, Confirmed, &mut ledger).unwrap_err();
        assert!(matches!(err, RegistrationError::CapacityExceeded { .. }));
        assert_eq!(ledger.available_slots, 0);
    }

    #[test]
    fn test_cancel_confirmed_releases_slot() {
        let current = detail(Confirmed);
        let mut ledger = SlotLedger::new(current.event_id(), 2, 0);
        let plan = plan_transition(&current, Cancelled, &mut ledger).unwrap();
        assert_eq!(plan.effect, SlotEffect::Release);
        assert_eq!(ledger.available_slots, 1);
    }

    #[test]
    fn test_attended_keeps_slot() {
        let current = detail(Confirmed);
        let mut ledger = SlotLedger::new(current.event_id(), 2, 1);
        plan_transition(&current, Attended, &mut ledger).unwrap();
        assert_eq!(ledger.available_slots, 1);
    }

    #[test]
    fn test_attended_registration_is_final() {
        let current = detail(Attended);
        let mut ledger = SlotLedger::new(current.event_id(), 2, 1);

        for next in [Confirmed, Cancelled, NoShow, Pending] {
            let err = plan_transition(&current, next, &mut ledger).unwrap_err();
            assert!(matches!(err, RegistrationError::Validation(_)));
        }
        assert_eq!(ledger.available_slots, 1);

        let plan = plan_transition(&current, Attended, &mut ledger).unwrap();
        assert_eq!(plan.effect, SlotEffect::Unchanged);
    }

    #[test]
    fn test_owner_cancel_rules() {
        let current = detail(Confirmed);
        assert!(authorize_owner_cancel(&current, current.registration.user_id).is_ok());

        let err = authorize_owner_cancel(&current, Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, RegistrationError::Forbidden(_)));

        let attended = detail(Attended);
        let err = authorize_owner_cancel(&attended, attended.registration.user_id).unwrap_err();
        assert!(matches!(err, RegistrationError::Validation(_)));
    }

    #[test]
    fn test_reconfirming_confirmed_is_noop_for_slots() {
        let current = detail(Confirmed);
        let mut ledger = SlotLedger::new(current.event_id(), 1, 0);
        let plan = plan_transition(&current, Confirmed, &mut ledger).unwrap();
        assert_eq!(plan.effect, SlotEffect::Unchanged);
        assert_eq!(ledger.available_slots, 0);
    }
}
