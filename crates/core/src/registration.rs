// Registration domain types
//
// These types represent the Registration entity, its status, and the
// denormalized view (registration + joined user/event display fields)
// that transitions, notifications and the archive all work from.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::RegistrationError;

/// Registration status.
/// - `pending`: awaiting admin approval, not holding a slot
/// - `waitlisted`: created while the event had no available slots
/// - `confirmed`: approved, holding one slot
/// - `attended`: confirmed holder showed up; the slot stays used
/// - `cancelled`: withdrawn; may be reconfirmed by registering again
/// - `no-show`: confirmed holder did not show up
/// - `rejected`: declined by an admin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationStatus {
    Pending,
    Waitlisted,
    Confirmed,
    Attended,
    Cancelled,
    NoShow,
    Rejected,
}

impl RegistrationStatus {
    /// Every status, in declaration order
    pub const ALL: [RegistrationStatus; 7] = [
        RegistrationStatus::Pending,
        RegistrationStatus::Waitlisted,
        RegistrationStatus::Confirmed,
        RegistrationStatus::Attended,
        RegistrationStatus::Cancelled,
        RegistrationStatus::NoShow,
        RegistrationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::NoShow => "no-show",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    /// Whether a registration in this status holds one of the event's slots
    pub fn holds_slot(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Confirmed | RegistrationStatus::Attended
        )
    }

    /// Statuses with no outgoing transitions in ordinary flow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Attended
                | RegistrationStatus::Cancelled
                | RegistrationStatus::NoShow
                | RegistrationStatus::Rejected
        )
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegistrationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| RegistrationError::validation(format!("Invalid status: {s}")))
    }
}

/// Initial status for a new (or reconfirmed) registration.
///
/// Creation never consumes a slot; only an admin approval does.
pub fn initial_status(available_slots: i32) -> RegistrationStatus {
    if available_slots > 0 {
        RegistrationStatus::Pending
    } else {
        RegistrationStatus::Waitlisted
    }
}

/// Registration - one user's seat request for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Unique identifier for the registration.
    pub id: Uuid,
    /// Event the registration is bound to.
    pub event_id: Uuid,
    /// User holding the registration.
    pub user_id: Uuid,
    /// Current status.
    pub status: RegistrationStatus,
    /// When the user registered (reset on reconfirm).
    pub registered_at: DateTime<Utc>,
}

/// Display fields joined from the users table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub name: String,
    pub email: String,
}

/// Display fields joined from the events table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A registration together with the joined user and event display fields,
/// as read under lock by the transition engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: Registration,
    pub user: UserSummary,
    pub event: EventSummary,
}

impl RegistrationDetail {
    pub fn id(&self) -> Uuid {
        self.registration.id
    }

    pub fn event_id(&self) -> Uuid {
        self.registration.event_id
    }

    pub fn status(&self) -> RegistrationStatus {
        self.registration.status
    }
}
