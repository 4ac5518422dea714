// Actors and audit log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{RegistrationError, Result};

/// Role attached to a verified identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// The verified identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: Uuid) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn user(id: Uuid) -> Self {
        Self {
            id,
            role: Role::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with Forbidden unless the actor is an admin
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(RegistrationError::forbidden("Admin access required"))
        }
    }

    /// Anonymous admin identities (no-auth mode) carry the nil id and are not
    /// recorded as `deletedBy`.
    pub fn recorded_id(&self) -> Option<Uuid> {
        (!self.id.is_nil()).then_some(self.id)
    }
}

/// An audit log entry to be written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub actor_id: Option<Uuid>,
    pub actor_role: Role,
    /// Dotted action name, e.g. `registration.status_changed`
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub fn new(actor: &Actor, action: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            actor_id: actor.recorded_id(),
            actor_role: actor.role,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn entity(mut self, id: Uuid) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// A stored audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    pub actor_role: Role,
    pub action: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(Actor::admin(Uuid::now_v7()).require_admin().is_ok());
        let err = Actor::user(Uuid::now_v7()).require_admin().unwrap_err();
        assert!(matches!(err, RegistrationError::Forbidden(_)));
    }

    #[test]
    fn test_nil_actor_is_not_recorded() {
        assert_eq!(Actor::admin(Uuid::nil()).recorded_id(), None);
        let id = Uuid::now_v7();
        let entry = AuditEntry::new(&Actor::user(id), "registration.created", "registration");
        assert_eq!(entry.actor_id, Some(id));
        assert_eq!(entry.actor_role, Role::User);
    }
}
