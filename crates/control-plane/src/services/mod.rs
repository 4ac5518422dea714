// Services layer for business logic
// Services own authorization and validation, call storage for the
// transactional phase, then hand side effects to the notifier.

pub mod activity;
pub mod archive;
pub mod event;
pub mod notifier;
pub mod registration;
pub mod user;

use tokio::task::JoinHandle;

pub use activity::ActivityService;
pub use archive::{ArchiveKind, ArchiveService};
pub use event::{CreateEventInput, EventService};
pub use notifier::{HttpMailer, LogMailer, MailError, Mailer, OutgoingMail, StorageNotifier};
pub use registration::RegistrationService;
pub use user::UserService;

/// A committed state change plus its in-flight side effects.
///
/// HTTP handlers use `value` and drop `side_effects`; tests await it.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub side_effects: JoinHandle<()>,
}

impl<T> Committed<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    /// Wait for every side effect to finish (tests and tooling)
    pub async fn settled(self) -> T {
        if let Err(e) = self.side_effects.await {
            tracing::warn!(error = %e, "Side effect task did not complete");
        }
        self.value
    }
}
