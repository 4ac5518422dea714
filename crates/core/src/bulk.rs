// Bulk orchestration planning
//
// The eligibility map below is the single source of truth for which
// registrations a bulk action may touch. Slot deltas are derived from the
// same `slot_effect` table the single-registration path uses, aggregated per
// event, and checked for every event before any ledger is mutated.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{RegistrationError, Result};
use crate::event::SlotLedger;
use crate::registration::{RegistrationDetail, RegistrationStatus};
use crate::transition::{slot_effect, SlotEffect, TransitionOutcome};

/// Maximum number of ids accepted by one bulk request.
pub const MAX_BULK_IDS: usize = 50;

/// Admin bulk action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Reject,
    Attend,
    #[serde(rename = "noshow")]
    NoShow,
    Delete,
}

impl BulkAction {
    /// Current statuses a registration must be in to be processed.
    pub fn eligible_statuses(&self) -> &'static [RegistrationStatus] {
        use RegistrationStatus::*;
        match self {
            BulkAction::Approve | BulkAction::Reject => &[Pending, Waitlisted],
            BulkAction::Attend | BulkAction::NoShow => &[Confirmed],
            BulkAction::Delete => &RegistrationStatus::ALL,
        }
    }

    /// Status written to eligible rows; `None` for delete.
    pub fn target_status(&self) -> Option<RegistrationStatus> {
        match self {
            BulkAction::Approve => Some(RegistrationStatus::Confirmed),
            BulkAction::Reject => Some(RegistrationStatus::Rejected),
            BulkAction::Attend => Some(RegistrationStatus::Attended),
            BulkAction::NoShow => Some(RegistrationStatus::NoShow),
            BulkAction::Delete => None,
        }
    }

    pub fn is_eligible(&self, status: RegistrationStatus) -> bool {
        self.eligible_statuses().contains(&status)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Approve => "approve",
            BulkAction::Reject => "reject",
            BulkAction::Attend => "attend",
            BulkAction::NoShow => "noshow",
            BulkAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for BulkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkAction {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(BulkAction::Approve),
            "reject" => Ok(BulkAction::Reject),
            "attend" => Ok(BulkAction::Attend),
            "noshow" => Ok(BulkAction::NoShow),
            "delete" => Ok(BulkAction::Delete),
            other => Err(RegistrationError::validation(format!("Invalid action: {other}"))),
        }
    }
}

/// Reject empty or oversized id lists and drop duplicates, keeping first-seen order.
pub fn normalize_ids(ids: &[Uuid]) -> Result<Vec<Uuid>> {
    if ids.is_empty() {
        return Err(RegistrationError::validation("At least one id is required"));
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(RegistrationError::validation(format!(
            "At most {MAX_BULK_IDS} ids may be processed at once"
        )));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

/// One eligible row with the status it held when it was locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub detail: RegistrationDetail,
    pub next: Option<RegistrationStatus>,
    pub effect: SlotEffect,
}

impl BulkItem {
    /// Transition outcome as it will look after the status write
    pub fn to_outcome(&self) -> Option<TransitionOutcome> {
        let next = self.next?;
        let mut detail = self.detail.clone();
        detail.registration.status = next;
        Some(TransitionOutcome {
            detail,
            previous: self.detail.status(),
            effect: self.effect,
        })
    }
}

/// Partitioned and capacity-checked bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkPlan {
    pub action: BulkAction,
    pub eligible: Vec<BulkItem>,
    /// Ids whose status did not match the eligibility map, or that do not exist.
    pub skipped: Vec<Uuid>,
    /// Net change to `availableSlots` per event; zero entries are omitted.
    pub slot_deltas: BTreeMap<Uuid, i32>,
}

impl BulkPlan {
    pub fn eligible_ids(&self) -> Vec<Uuid> {
        self.eligible.iter().map(|item| item.detail.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// Partition locked rows, aggregate slot deltas per event and apply them to
/// `ledgers` (which must hold every event referenced by an eligible row, read
/// under lock).
///
/// All-or-nothing: when any event lacks the slots its approvals need, no
/// ledger is modified and the whole batch fails.
pub fn plan_bulk(
    action: BulkAction,
    requested: &[Uuid],
    locked: Vec<RegistrationDetail>,
    ledgers: &mut HashMap<Uuid, SlotLedger>,
) -> Result<BulkPlan> {
    let mut by_id: HashMap<Uuid, RegistrationDetail> =
        locked.into_iter().map(|d| (d.id(), d)).collect();

    let mut eligible = Vec::new();
    let mut skipped = Vec::new();
    for id in requested {
        match by_id.remove(id) {
            Some(detail) if action.is_eligible(detail.status()) => {
                let next = action.target_status();
                let effect = next
                    .map(|next| slot_effect(detail.status(), next))
                    .unwrap_or(SlotEffect::Unchanged);
                eligible.push(BulkItem {
                    detail,
                    next,
                    effect,
                });
            }
            _ => skipped.push(*id),
        }
    }

    let mut slot_deltas: BTreeMap<Uuid, i32> = BTreeMap::new();
    let mut titles: HashMap<Uuid, &str> = HashMap::new();
    for item in &eligible {
        let delta = item.effect.delta();
        if delta != 0 {
            *slot_deltas.entry(item.detail.event_id()).or_default() += delta;
            titles.insert(item.detail.event_id(), &item.detail.event.title);
        }
    }

    // Check every event first so a shortfall leaves all ledgers untouched.
    for (event_id, delta) in &slot_deltas {
        let ledger = ledgers
            .get(event_id)
            .ok_or_else(|| RegistrationError::not_found(format!("Event {event_id} not found")))?;
        let needed = -delta;
        if needed > ledger.available_slots {
            let title = titles.get(event_id).copied().unwrap_or_default();
            return Err(RegistrationError::capacity(
                *event_id,
                title,
                needed,
                ledger.available_slots,
            ));
        }
    }

    for (event_id, delta) in &slot_deltas {
        if let Some(ledger) = ledgers.get_mut(event_id) {
            if *delta < 0 {
                ledger.consume(-delta, titles.get(event_id).copied().unwrap_or_default())?;
            } else {
                ledger.release(*delta);
            }
        }
    }

    slot_deltas.retain(|_, delta| *delta != 0);

    tracing::debug!(
        %action,
        eligible = eligible.len(),
        skipped = skipped.len(),
        events = slot_deltas.len(),
        "Planned bulk registration action"
    );

    Ok(BulkPlan {
        action,
        eligible,
        skipped,
        slot_deltas,
    })
}

/// Response of a bulk request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BulkOutcome {
    pub processed: usize,
    pub skipped: usize,
}

/// Committed bulk result, carried into the notify phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResult {
    pub outcome: BulkOutcome,
    /// Status changes, one per eligible row (empty for delete)
    pub transitions: Vec<TransitionOutcome>,
    /// Rows archived and removed (delete only)
    pub deleted: Vec<RegistrationDetail>,
}

impl BulkResult {
    pub fn empty(skipped: usize) -> Self {
        Self {
            outcome: BulkOutcome {
                processed: 0,
                skipped,
            },
            transitions: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Build the committed result from an applied plan
    pub fn from_plan(plan: &BulkPlan) -> Self {
        let outcome = BulkOutcome {
            processed: plan.eligible.len(),
            skipped: plan.skipped.len(),
        };
        if plan.action == BulkAction::Delete {
            return Self {
                outcome,
                transitions: Vec::new(),
                deleted: plan.eligible.iter().map(|i| i.detail.clone()).collect(),
            };
        }
        Self {
            outcome,
            transitions: plan.eligible.iter().filter_map(BulkItem::to_outcome).collect(),
            deleted: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{EventSummary, Registration, UserSummary};
    use chrono::{NaiveDate, Utc};
    use RegistrationStatus::*;

    fn row(event_id: Uuid, status: RegistrationStatus) -> RegistrationDetail {
        RegistrationDetail {
            registration: Registration {
                id: Uuid::now_v7(),
                event_id,
                user_id: Uuid::now_v7(),
                status,
                registered_at: Utc::now(),
            },
            user: UserSummary {
                name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
            },
            event: EventSummary {
                title: "Investor Mixer".to_string(),
                event_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                event_time: None,
                location: Some("Hub".to_string()),
            },
        }
    }

    fn ids(rows: &[RegistrationDetail]) -> Vec<Uuid> {
        rows.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_eligibility_map() {
        assert!(BulkAction::Approve.is_eligible(Pending));
        assert!(BulkAction::Approve.is_eligible(Waitlisted));
        assert!(!BulkAction::Approve.is_eligible(Confirmed));
        assert!(BulkAction::Reject.is_eligible(Waitlisted));
        assert!(!BulkAction::Reject.is_eligible(Confirmed));
        assert!(BulkAction::Attend.is_eligible(Confirmed));
        assert!(!BulkAction::NoShow.is_eligible(Pending));
        for status in RegistrationStatus::ALL {
            assert!(BulkAction::Delete.is_eligible(status));
        }
    }

    #[test]
    fn test_action_wire_names() {
        let action: BulkAction = serde_json::from_str("\"noshow\"").unwrap();
        assert_eq!(action, BulkAction::NoShow);
        assert_eq!(BulkAction::Approve.to_string(), "approve");
        assert_eq!("noshow".parse::<BulkAction>().unwrap(), BulkAction::NoShow);
        assert!("no-show".parse::<BulkAction>().is_err());
    }

    #[test]
    fn test_normalize_ids_dedups_and_bounds() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(normalize_ids(&[a, b, a]).unwrap(), vec![a, b]);
        assert!(normalize_ids(&[]).is_err());
        let many: Vec<Uuid> = (0..=MAX_BULK_IDS).map(|_| Uuid::now_v7()).collect();
        assert!(normalize_ids(&many).is_err());
        assert!(normalize_ids(&many[..MAX_BULK_IDS]).is_ok());
    }

    #[test]
    fn test_approve_shortfall_aborts_whole_batch() {
        let short_event = Uuid::now_v7();
        let roomy_event = Uuid::now_v7();
        let rows = vec![
            row(short_event, Pending),
            row(short_event, Pending),
            row(roomy_event, Waitlisted),
        ];
        let requested = ids(&rows);
        let mut ledgers = HashMap::from([
            (short_event, SlotLedger::new(short_event, 2, 1)),
            (roomy_event, SlotLedger::new(roomy_event, 5, 5)),
        ]);

        let err = plan_bulk(BulkAction::Approve, &requested, rows, &mut ledgers).unwrap_err();
        match err {
            RegistrationError::CapacityExceeded {
                event_id,
                needed,
                available,
                ..
            } => {
                assert_eq!(event_id, short_event);
                assert_eq!((needed, available), (2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledgers[&short_event].available_slots, 1);
        assert_eq!(ledgers[&roomy_event].available_slots, 5);
    }

    #[test]
    fn test_approve_skips_ineligible_and_decrements_per_event() {
        let event_id = Uuid::now_v7();
        let rows = vec![
            row(event_id, Pending),
            row(event_id, Confirmed),
            row(event_id, Waitlisted),
        ];
        let mut requested = ids(&rows);
        let missing = Uuid::now_v7();
        requested.push(missing);
        let mut ledgers = HashMap::from([(event_id, SlotLedger::new(event_id, 5, 3))]);

        let plan = plan_bulk(BulkAction::Approve, &requested, rows, &mut ledgers).unwrap();
        assert_eq!(plan.eligible.len(), 2);
        assert_eq!(plan.skipped.len(), 2);
        assert!(plan.skipped.contains(&missing));
        assert_eq!(plan.slot_deltas.get(&event_id), Some(&-2));
        assert_eq!(ledgers[&event_id].available_slots, 1);
    }

    #[test]
    fn test_noshow_releases_confirmed_slots() {
        let event_id = Uuid::now_v7();
        let rows = vec![row(event_id, Confirmed), row(event_id, Confirmed)];
        let requested = ids(&rows);
        let mut ledgers = HashMap::from([(event_id, SlotLedger::new(event_id, 4, 0))]);

        let plan = plan_bulk(BulkAction::NoShow, &requested, rows, &mut ledgers).unwrap();
        assert_eq!(plan.slot_deltas.get(&event_id), Some(&2));
        assert_eq!(ledgers[&event_id].available_slots, 2);
    }

    #[test]
    fn test_attend_and_delete_leave_counters_alone() {
        let event_id = Uuid::now_v7();
        let rows = vec![row(event_id, Confirmed), row(event_id, Pending)];
        let requested = ids(&rows);
        let mut ledgers = HashMap::from([(event_id, SlotLedger::new(event_id, 2, 1))]);

        let plan = plan_bulk(BulkAction::Attend, &requested, rows.clone(), &mut ledgers).unwrap();
        assert_eq!(plan.eligible.len(), 1);
        assert!(plan.slot_deltas.is_empty());

        let plan = plan_bulk(BulkAction::Delete, &requested, rows, &mut ledgers).unwrap();
        assert_eq!(plan.eligible.len(), 2);
        assert!(plan.slot_deltas.is_empty());
        assert_eq!(ledgers[&event_id].available_slots, 1);

        let result = BulkResult::from_plan(&plan);
        assert_eq!(result.deleted.len(), 2);
        assert!(result.transitions.is_empty());
    }

    #[test]
    fn test_nothing_eligible_is_not_an_error() {
        let event_id = Uuid::now_v7();
        let rows = vec![row(event_id, Attended)];
        let requested = ids(&rows);
        let mut ledgers = HashMap::new();

        let plan = plan_bulk(BulkAction::Approve, &requested, rows, &mut ledgers).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.skipped, requested);
    }

    #[test]
    fn test_result_carries_previous_status() {
        let event_id = Uuid::now_v7();
        let rows = vec![row(event_id, Waitlisted)];
        let requested = ids(&rows);
        let mut ledgers = HashMap::from([(event_id, SlotLedger::new(event_id, 1, 1))]);

        let plan = plan_bulk(BulkAction::Approve, &requested, rows, &mut ledgers).unwrap();
        let result = BulkResult::from_plan(&plan);
        assert_eq!(result.outcome, BulkOutcome { processed: 1, skipped: 0 });
        assert_eq!(result.transitions[0].previous, Waitlisted);
        assert_eq!(result.transitions[0].status(), Confirmed);
    }
}
