// Event domain types and the per-event slot ledger
//
// The slot ledger is the only mutable state shared between concurrent admin
// actions. It is mutated exclusively by the transition planners and by admin
// capacity edits, always while the owning event row is locked.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{RegistrationError, Result};
use crate::registration::EventSummary;

/// Event publication status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Being prepared, not visible to attendees.
    #[default]
    Draft,
    /// Open for registration.
    Published,
    /// Took place.
    Completed,
    /// Called off.
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<&str> for EventStatus {
    fn from(s: &str) -> Self {
        match s {
            "published" => EventStatus::Published,
            "completed" => EventStatus::Completed,
            "cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Draft,
        }
    }
}

/// Event - a community event with limited admission capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Admission capacity.
    pub total_slots: i32,
    /// Remaining capacity; `0 <= availableSlots <= totalSlots`.
    pub available_slots: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the event has been soft-deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Whether attendees may register right now
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Published && self.archived_at.is_none()
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            title: self.title.clone(),
            event_date: self.event_date,
            event_time: self.event_time,
            location: self.location.clone(),
        }
    }

    pub fn ledger(&self) -> SlotLedger {
        SlotLedger {
            event_id: self.id,
            total_slots: self.total_slots,
            available_slots: self.available_slots,
        }
    }
}

/// Per-event slot counters as read under the event row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLedger {
    pub event_id: Uuid,
    pub total_slots: i32,
    pub available_slots: i32,
}

impl SlotLedger {
    pub fn new(event_id: Uuid, total_slots: i32, available_slots: i32) -> Self {
        Self {
            event_id,
            total_slots,
            available_slots,
        }
    }

    /// Seats currently held by confirmed/attended registrations
    pub fn held(&self) -> i32 {
        self.total_slots - self.available_slots
    }

    /// Whether `0 <= available <= total` holds
    pub fn is_consistent(&self) -> bool {
        self.available_slots >= 0 && self.available_slots <= self.total_slots
    }

    /// Take `count` slots. Fails without mutating when fewer are available.
    pub fn consume(&mut self, count: i32, event_title: &str) -> Result<()> {
        if count > self.available_slots {
            return Err(RegistrationError::capacity(
                self.event_id,
                event_title,
                count,
                self.available_slots,
            ));
        }
        self.available_slots -= count;
        Ok(())
    }

    /// Give back `count` slots, never exceeding the total.
    pub fn release(&mut self, count: i32) {
        let released = (self.available_slots + count).min(self.total_slots);
        if released != self.available_slots + count {
            tracing::warn!(
                event_id = %self.event_id,
                count,
                available = self.available_slots,
                total = self.total_slots,
                "Slot release clamped at total capacity"
            );
        }
        self.available_slots = released;
    }

    /// Apply an admin capacity edit, shifting availability by the same delta.
    pub fn resize(&mut self, new_total: i32) -> Result<()> {
        if new_total < 0 {
            return Err(RegistrationError::validation(
                "totalSlots must not be negative",
            ));
        }
        let new_available = self.available_slots + (new_total - self.total_slots);
        if new_available < 0 {
            return Err(RegistrationError::validation(format!(
                "totalSlots cannot be lower than the {} seats already confirmed",
                self.held()
            )));
        }
        self.total_slots = new_total;
        self.available_slots = new_available;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(total: i32, available: i32) -> SlotLedger {
        SlotLedger::new(Uuid::now_v7(), total, available)
    }

    #[test]
    fn test_consume_requires_availability() {
        let mut l = ledger(2, 1);
        l.consume(1, "Demo Day").unwrap();
        assert_eq!(l.available_slots, 0);

        let err = l.consume(1, "Demo Day").unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::CapacityExceeded {
                needed: 1,
                available: 0,
                ..
            }
        ));
        assert_eq!(l.available_slots, 0);
    }

    #[test]
    fn test_release_is_clamped_to_total() {
        let mut l = ledger(2, 1);
        l.release(1);
        assert_eq!(l.available_slots, 2);
        l.release(1);
        assert_eq!(l.available_slots, 2);
        assert!(l.is_consistent());
    }

    #[test]
    fn test_resize_shifts_availability() {
        let mut l = ledger(10, 4);
        l.resize(12).unwrap();
        assert_eq!((l.total_slots, l.available_slots), (12, 6));
        l.resize(6).unwrap();
        assert_eq!((l.total_slots, l.available_slots), (6, 0));
    }

    #[test]
    fn test_resize_below_held_seats_fails() {
        let mut l = ledger(10, 4);
        assert!(l.resize(5).is_err());
        assert_eq!((l.total_slots, l.available_slots), (10, 4));
        assert!(l.resize(-1).is_err());
    }

    #[test]
    fn test_event_status_parsing() {
        assert_eq!(EventStatus::from("published"), EventStatus::Published);
        assert_eq!(EventStatus::from("unknown"), EventStatus::Draft);
        assert_eq!(EventStatus::Cancelled.to_string(), "cancelled");
    }
}
