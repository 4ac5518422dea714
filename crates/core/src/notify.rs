// Post-commit side effects
//
// Emails, in-app notifications and audit entries are produced only after the
// state change has committed. `dispatch` runs them concurrently on a spawned
// task; a failing collaborator is logged and never reaches the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::archive::DeletionSource;
use crate::audit::{Actor, AuditEntry};
use crate::registration::{RegistrationDetail, RegistrationStatus};
use crate::transition::TransitionOutcome;

/// Status email sent to the registration holder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEmail {
    pub to_email: String,
    pub to_name: String,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub status: RegistrationStatus,
    pub subject: String,
    pub body: String,
}

/// Email sent to the admin mailbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminEmail {
    pub subject: String,
    pub body: String,
    pub registration_id: Uuid,
}

/// In-app notification row to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient; `None` for admin fan-out (one row per admin)
    pub user_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Side-effect collaborators. Implementations may fail; `dispatch` swallows it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_status_email(&self, email: &StatusEmail) -> anyhow::Result<()>;

    async fn send_admin_email(&self, email: &AdminEmail) -> anyhow::Result<()>;

    async fn create_notification(&self, notification: &NewNotification) -> anyhow::Result<()>;

    async fn create_admin_notification(&self, notification: &NewNotification)
        -> anyhow::Result<()>;

    async fn log_action(&self, entry: &AuditEntry) -> anyhow::Result<()>;
}

/// One queued side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    StatusEmail(StatusEmail),
    AdminEmail(AdminEmail),
    Notify(NewNotification),
    NotifyAdmins(NewNotification),
    Audit(AuditEntry),
}

impl SideEffect {
    pub fn kind(&self) -> &'static str {
        match self {
            SideEffect::StatusEmail(_) => "status_email",
            SideEffect::AdminEmail(_) => "admin_email",
            SideEffect::Notify(_) => "notification",
            SideEffect::NotifyAdmins(_) => "admin_notification",
            SideEffect::Audit(_) => "audit_log",
        }
    }

    async fn run(&self, notifier: &dyn Notifier) -> anyhow::Result<()> {
        match self {
            SideEffect::StatusEmail(email) => notifier.send_status_email(email).await,
            SideEffect::AdminEmail(email) => notifier.send_admin_email(email).await,
            SideEffect::Notify(n) => notifier.create_notification(n).await,
            SideEffect::NotifyAdmins(n) => notifier.create_admin_notification(n).await,
            SideEffect::Audit(entry) => notifier.log_action(entry).await,
        }
    }
}

/// Run `effects` concurrently on a background task.
///
/// Request handlers drop the returned handle; tests await it.
pub fn dispatch(notifier: Arc<dyn Notifier>, effects: Vec<SideEffect>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let results = join_all(effects.iter().map(|e| e.run(notifier.as_ref()))).await;
        let mut failed = 0usize;
        for (effect, result) in effects.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                tracing::warn!(kind = effect.kind(), error = %e, "Side effect failed");
            }
        }
        tracing::debug!(total = effects.len(), failed, "Side effects dispatched");
    })
}

/// User- and admin-facing wording for a resulting status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub title: String,
    pub user_message: String,
    pub admin_message: String,
}

/// Message text for a registration that just reached its current status.
pub fn status_message(detail: &RegistrationDetail, reason: Option<&str>) -> StatusMessage {
    let event = &detail.event.title;
    let date = detail.event.event_date.format("%B %-d, %Y");
    let name = &detail.user.name;

    let ended = |title: &str, verb: &str| {
        let mut user_message = format!("Your registration for {event} was {verb}.");
        let mut admin_message = format!("{name}'s registration for {event} was {verb}.");
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            user_message.push_str(&format!(" Reason: {reason}"));
            admin_message.push_str(&format!(" Reason: {reason}"));
        }
        StatusMessage {
            title: title.to_string(),
            user_message,
            admin_message,
        }
    };

    match detail.status() {
        RegistrationStatus::Confirmed => StatusMessage {
            title: "Registration approved".to_string(),
            user_message: format!("Your registration for {event} on {date} has been approved."),
            admin_message: format!("{name} ({}) was approved for {event}.", detail.user.email),
        },
        RegistrationStatus::Attended => StatusMessage {
            title: "Attendance recorded".to_string(),
            user_message: format!("Your attendance at {event} has been recorded. Thanks for joining!"),
            admin_message: format!("{name} attended {event}."),
        },
        RegistrationStatus::Cancelled => ended("Registration cancelled", "cancelled"),
        RegistrationStatus::NoShow => ended("Marked as no-show", "marked as a no-show"),
        RegistrationStatus::Rejected => ended("Registration rejected", "rejected"),
        RegistrationStatus::Pending => StatusMessage {
            title: "Registration received".to_string(),
            user_message: format!("Your registration for {event} on {date} is pending approval."),
            admin_message: format!("{name} registered for {event} and is awaiting approval."),
        },
        RegistrationStatus::Waitlisted => StatusMessage {
            title: "Added to waitlist".to_string(),
            user_message: format!("{event} is currently full; you have been added to the waitlist."),
            admin_message: format!("{name} joined the waitlist for {event}."),
        },
    }
}

fn message_effects(detail: &RegistrationDetail, reason: Option<&str>) -> Vec<SideEffect> {
    let message = status_message(detail, reason);
    let link = Some(format!("/events/{}", detail.event_id()));
    vec![
        SideEffect::StatusEmail(StatusEmail {
            to_email: detail.user.email.clone(),
            to_name: detail.user.name.clone(),
            event_title: detail.event.title.clone(),
            event_date: detail.event.event_date,
            status: detail.status(),
            subject: format!("{}: {}", message.title, detail.event.title),
            body: message.user_message.clone(),
        }),
        SideEffect::AdminEmail(AdminEmail {
            subject: format!("{}: {}", message.title, detail.event.title),
            body: message.admin_message.clone(),
            registration_id: detail.id(),
        }),
        SideEffect::Notify(NewNotification {
            user_id: Some(detail.registration.user_id),
            title: message.title.clone(),
            message: message.user_message,
            link: link.clone(),
        }),
        SideEffect::NotifyAdmins(NewNotification {
            user_id: None,
            title: message.title,
            message: message.admin_message,
            link,
        }),
    ]
}

/// Effects of a committed status change (single or one row of a bulk batch).
pub fn transition_effects(
    outcome: &TransitionOutcome,
    actor: &Actor,
    action: &str,
    reason: Option<&str>,
) -> Vec<SideEffect> {
    let detail = &outcome.detail;
    let mut effects = vec![SideEffect::Audit(
        AuditEntry::new(actor, action, "registration")
            .entity(detail.id())
            .details(json!({
                "eventId": detail.event_id(),
                "userId": detail.registration.user_id,
                "previousStatus": outcome.previous,
                "newStatus": detail.status(),
                "slotEffect": outcome.effect,
                "reason": reason,
            })),
    )];
    effects.extend(message_effects(detail, reason));
    effects
}

/// Effects of a new or reconfirmed registration.
pub fn creation_effects(detail: &RegistrationDetail, actor: &Actor, reconfirmed: bool) -> Vec<SideEffect> {
    let action = if reconfirmed {
        "registration.reconfirmed"
    } else {
        "registration.created"
    };
    let mut effects = vec![SideEffect::Audit(
        AuditEntry::new(actor, action, "registration")
            .entity(detail.id())
            .details(json!({
                "eventId": detail.event_id(),
                "status": detail.status(),
            })),
    )];
    effects.extend(message_effects(detail, None));
    effects
}

/// Audit entries for archived-and-deleted registrations.
pub fn deletion_effects(
    deleted: &[RegistrationDetail],
    actor: &Actor,
    source: DeletionSource,
) -> Vec<SideEffect> {
    deleted
        .iter()
        .map(|detail| {
            SideEffect::Audit(
                AuditEntry::new(actor, "registration.deleted", "registration")
                    .entity(detail.id())
                    .details(json!({
                        "eventId": detail.event_id(),
                        "userId": detail.registration.user_id,
                        "status": detail.status(),
                        "deletionSource": source,
                    })),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{EventSummary, Registration, UserSummary};
    use crate::transition::SlotEffect;
    use chrono::Utc;
    use parking_lot::Mutex;

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
                name: "Margaret".to_string(),
                email: "margaret@example.com".to_string(),
            },
            event: EventSummary {
                title: "Founder Breakfast".to_string(),
                event_date: NaiveDate::from_ymd_opt(2026, 11, 12).unwrap(),
                event_time: None,
                location: None,
            },
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail_emails: bool,
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_status_email(&self, _email: &StatusEmail) -> anyhow::Result<()> {
            self.seen.lock().push("status_email");
            if self.fail_emails {
                anyhow::bail!("smtp unavailable");
            }
            Ok(())
        }

        async fn send_admin_email(&self, _email: &AdminEmail) -> anyhow::Result<()> {
            self.seen.lock().push("admin_email");
            if self.fail_emails {
                anyhow::bail!("smtp unavailable");
            }
            Ok(())
        }

        async fn create_notification(&self, _n: &NewNotification) -> anyhow::Result<()> {
            self.seen.lock().push("notification");
            Ok(())
        }

        async fn create_admin_notification(&self, _n: &NewNotification) -> anyhow::Result<()> {
            self.seen.lock().push("admin_notification");
            Ok(())
        }

        async fn log_action(&self, _entry: &AuditEntry) -> anyhow::Result<()> {
            self.seen.lock().push("audit_log");
            Ok(())
        }
    }

    #[test]
    fn test_rejection_message_appends_reason() {
        let msg = status_message(&detail(RegistrationStatus::Rejected), Some("Event is for members"));
        assert_eq!(msg.title, "Registration rejected");
        assert!(msg.user_message.ends_with("Reason: Event is for members"));

        let msg = status_message(&detail(RegistrationStatus::NoShow), Some("   "));
        assert!(!msg.user_message.contains("Reason"));
    }

    #[test]
    fn test_approved_and_attended_wording() {
        let msg = status_message(&detail(RegistrationStatus::Confirmed), Some("ignored"));
        assert!(msg.user_message.contains("has been approved"));
        assert!(msg.user_message.contains("November 12, 2026"));
        assert!(!msg.user_message.contains("Reason"));

        let msg = status_message(&detail(RegistrationStatus::Attended), None);
        assert_eq!(msg.title, "Attendance recorded");
    }

    #[test]
    fn test_transition_effects_cover_every_collaborator() {
        let outcome = TransitionOutcome {
            detail: detail(RegistrationStatus::Confirmed),
            previous: RegistrationStatus::Pending,
            effect: SlotEffect::Consume,
        };
        let effects = transition_effects(
            &outcome,
            &Actor::admin(Uuid::now_v7()),
            "registration.status_changed",
            None,
        );
        let kinds: Vec<_> = effects.iter().map(SideEffect::kind).collect();
        assert_eq!(
            kinds,
            vec!["audit_log", "status_email", "admin_email", "notification", "admin_notification"]
        );
        match &effects[0] {
            SideEffect::Audit(entry) => {
                assert_eq!(entry.details["previousStatus"], "pending");
                assert_eq!(entry.details["newStatus"], "confirmed");
            }
            other => panic!("expected audit entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let notifier = Arc::new(RecordingNotifier {
            fail_emails: true,
            ..Default::default()
        });
        let d = detail(RegistrationStatus::Waitlisted);
        let effects = creation_effects(&d, &Actor::user(d.registration.user_id), false);

        dispatch(notifier.clone(), effects).await.unwrap();

        let seen = notifier.seen.lock();
        assert_eq!(seen.len(), 5);
        assert!(seen.contains(&"audit_log"));
        assert!(seen.contains(&"notification"));
    }

    #[test]
    fn test_deletion_effects_are_audit_only() {
        let rows = vec![detail(RegistrationStatus::Confirmed), detail(RegistrationStatus::Pending)];
        let effects = deletion_effects(&rows, &Actor::admin(Uuid::now_v7()), DeletionSource::AdminBulk);
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(|e| e.kind() == "audit_log"));
    }
}
