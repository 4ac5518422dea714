// Registration Core
//
// This crate provides the DB-agnostic heart of event registration management:
// the registration status state machine, per-event slot accounting, bulk
// orchestration, archive snapshots and post-commit side effects.
//
// Key design decisions:
// - Planners (`plan_transition`, `plan_bulk`) validate and mutate a ledger copy;
//   storage backends call them while holding their own row locks
// - Side effects go through the `Notifier` trait and run only after commit
// - Domain entity types (Event, Registration, ArchivedRegistration) are defined here

pub mod archive;
pub mod audit;
pub mod bulk;
pub mod error;
pub mod event;
pub mod notify;
pub mod registration;
pub mod telemetry;
pub mod transition;

// Re-exports for convenience
pub use archive::{ArchiveScope, ArchivedRegistration, DeletionSource, PurgeOutcome, RestoreOutcome};
pub use audit::{Actor, AuditEntry, AuditLogEntry, Role};
pub use bulk::{
    normalize_ids, plan_bulk, BulkAction, BulkItem, BulkOutcome, BulkPlan, BulkResult,
    MAX_BULK_IDS,
};
pub use error::{RegistrationError, Result};
pub use event::{Event, EventStatus, SlotLedger};
pub use notify::{
    creation_effects, deletion_effects, dispatch, status_message, transition_effects, AdminEmail,
    NewNotification, Notifier, SideEffect, StatusEmail, StatusMessage,
};
pub use registration::{
    initial_status, EventSummary, Registration, RegistrationDetail, RegistrationStatus,
    UserSummary,
};
pub use transition::{
    authorize_owner_cancel, plan_transition, slot_effect, SlotEffect, TransitionOutcome, TransitionPlan,
};
