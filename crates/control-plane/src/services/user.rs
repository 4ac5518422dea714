// User service: user administration

use std::sync::Arc;

use eventdesk_core::{
    deletion_effects, dispatch, Actor, AuditEntry, DeletionSource, Notifier, RegistrationError,
    Result, Role, SideEffect,
};
use serde_json::json;
use uuid::Uuid;

use super::Committed;
use crate::storage::{CreateUserRow, StorageBackend, UserRow};

pub struct UserService {
    storage: Arc<StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl UserService {
    pub fn new(storage: Arc<StorageBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        name: &str,
        email: &str,
        role: Role,
    ) -> Result<Committed<UserRow>> {
        actor.require_admin()?;
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() {
            return Err(RegistrationError::validation("Name is required"));
        }
        if !is_plausible_email(email) {
            return Err(RegistrationError::validation("Invalid email address"));
        }

        let user = self
            .storage
            .create_user(CreateUserRow {
                name: name.to_string(),
                email: email.to_string(),
                role,
            })
            .await?;
        tracing::info!(user_id = %user.id, %role, "User created");

        let effects = vec![SideEffect::Audit(
            AuditEntry::new(actor, "user.created", "user")
                .entity(user.id)
                .details(json!({ "email": user.email, "role": role })),
        )];
        Ok(Committed {
            value: user,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<UserRow>> {
        actor.require_admin()?;
        self.storage.list_users().await
    }

    /// Archive and delete the user's registrations, then soft-delete the user.
    /// Returns the number of registrations archived.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<Committed<usize>> {
        actor.require_admin()?;

        let archived = self
            .storage
            .delete_user(id, actor.recorded_id())
            .await?
            .ok_or_else(|| RegistrationError::not_found("User not found"))?;
        tracing::info!(user_id = %id, registrations = archived.len(), "User archived");

        let mut effects = vec![SideEffect::Audit(
            AuditEntry::new(actor, "user.deleted", "user")
                .entity(id)
                .details(json!({ "archivedRegistrations": archived.len() })),
        )];
        effects.extend(deletion_effects(&archived, actor, DeletionSource::UserDeleted));
        Ok(Committed {
            value: archived.len(),
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }
}

/// One '@' with something on both sides and a dot in the domain
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("ada@example.com"));
        assert!(!is_plausible_email("ada.example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("ada@example"));
        assert!(!is_plausible_email("ada@@example.com"));
    }
}
