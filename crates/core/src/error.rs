// Error types for registration state changes

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for registration operations
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Errors that can occur while changing registration or slot state.
///
/// Every variant raised inside a storage transaction causes a full rollback;
/// nothing here is ever produced by a side-effect collaborator.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Malformed input (bad status, empty or oversized id list, bad slot edit)
    #[error("{0}")]
    Validation(String),

    /// No verified identity
    #[error("Authentication required")]
    Unauthorized,

    /// Verified identity without the required role or ownership
    #[error("{0}")]
    Forbidden(String),

    /// Registration, event or user does not exist
    #[error("{0}")]
    NotFound(String),

    /// Not enough available slots to approve the requested registrations
    #[error(
        "Not enough available slots for event \"{event_title}\" ({event_id}): \
         {needed} needed, {available} available"
    )]
    CapacityExceeded {
        event_id: Uuid,
        event_title: String,
        needed: i32,
        available: i32,
    },

    /// A live registration already exists for the (event, user) pair
    #[error("{0}")]
    Conflict(String),

    /// Event is not accepting registrations (draft, completed, cancelled or archived)
    #[error("Event {0} is not open for registration")]
    EventClosed(Uuid),

    /// Storage layer failure
    #[error("Storage error: {0}")]
    Store(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RegistrationError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        RegistrationError::Validation(msg.into())
    }

    /// Create a forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        RegistrationError::Forbidden(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        RegistrationError::NotFound(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        RegistrationError::Conflict(msg.into())
    }

    /// Create a storage error
    pub fn store(msg: impl Into<String>) -> Self {
        RegistrationError::Store(msg.into())
    }

    /// The "Registration not found" error raised by the transition engine
    pub fn registration_not_found() -> Self {
        RegistrationError::NotFound("Registration not found".to_string())
    }

    /// Create a capacity error for one event
    pub fn capacity(
        event_id: Uuid,
        event_title: impl Into<String>,
        needed: i32,
        available: i32,
    ) -> Self {
        RegistrationError::CapacityExceeded {
            event_id,
            event_title: event_title.into(),
            needed,
            available,
        }
    }

    /// Slot shortfall for capacity errors, zero otherwise
    pub fn shortfall(&self) -> i32 {
        match self {
            RegistrationError::CapacityExceeded {
                needed, available, ..
            } => needed - available,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_message_names_event_and_shortfall() {
        let id = Uuid::nil();
        let err = RegistrationError::capacity(id, "Founder Breakfast", 2, 1);
        let msg = err.to_string();
        assert!(msg.contains("Founder Breakfast"));
        assert!(msg.contains("2 needed"));
        assert!(msg.contains("1 available"));
        assert_eq!(err.shortfall(), 1);
    }

    #[test]
    fn test_not_found_message() {
        let err = RegistrationError::registration_not_found();
        assert_eq!(err.to_string(), "Registration not found");
        assert_eq!(err.shortfall(), 0);
    }
}
