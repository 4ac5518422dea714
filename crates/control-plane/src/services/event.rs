// Event service: event administration and slot capacity edits

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use eventdesk_core::{
    deletion_effects, dispatch, Actor, AuditEntry, DeletionSource, Event, EventStatus, Notifier,
    RegistrationError, Result, SideEffect,
};
use serde_json::json;
use uuid::Uuid;

use super::Committed;
use crate::storage::{CreateEventRow, StorageBackend, UpdateEvent};

/// Maximum length of an event title, in characters
pub const MAX_EVENT_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct CreateEventInput {
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub location: Option<String>,
    pub total_slots: i32,
    pub status: Option<EventStatus>,
}

pub struct EventService {
    storage: Arc<StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl EventService {
    pub fn new(storage: Arc<StorageBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    pub async fn create(&self, actor: &Actor, input: CreateEventInput) -> Result<Committed<Event>> {
        actor.require_admin()?;
        let title = validate_title(&input.title)?;
        validate_total_slots(input.total_slots)?;

        let row = self
            .storage
            .create_event(CreateEventRow {
                title,
                description: input.description,
                event_date: input.event_date,
                event_time: input.event_time,
                location: input.location,
                total_slots: input.total_slots,
                status: input.status.unwrap_or_default(),
            })
            .await?;
        let event = Event::from(row);
        tracing::info!(event_id = %event.id, total_slots = event.total_slots, "Event created");

        let effects = vec![SideEffect::Audit(
            AuditEntry::new(actor, "event.created", "event")
                .entity(event.id)
                .details(json!({ "title": event.title, "totalSlots": event.total_slots })),
        )];
        Ok(Committed {
            value: event,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Event> {
        self.storage
            .get_event(id)
            .await?
            .filter(|row| row.archived_at.is_none())
            .map(Event::from)
            .ok_or_else(|| RegistrationError::not_found("Event not found"))
    }

    pub async fn list(&self) -> Result<Vec<Event>> {
        let rows = self.storage.list_events().await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    /// Edit event fields. A new `total_slots` shifts `available_slots` by the
    /// same delta and fails when fewer seats than are held would remain.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        mut input: UpdateEvent,
    ) -> Result<Committed<Event>> {
        actor.require_admin()?;
        if let Some(title) = &input.title {
            input.title = Some(validate_title(title)?);
        }
        if let Some(total) = input.total_slots {
            validate_total_slots(total)?;
        }
        let resized = input.total_slots;

        let event = self
            .storage
            .update_event(id, input)
            .await?
            .map(Event::from)
            .ok_or_else(|| RegistrationError::not_found("Event not found"))?;
        tracing::info!(
            event_id = %id,
            total_slots = event.total_slots,
            available_slots = event.available_slots,
            "Event updated"
        );

        let effects = vec![SideEffect::Audit(
            AuditEntry::new(actor, "event.updated", "event")
                .entity(id)
                .details(json!({
                    "status": event.status,
                    "totalSlots": resized,
                    "availableSlots": event.available_slots,
                })),
        )];
        Ok(Committed {
            value: event,
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }

    /// Archive and delete the event's registrations, then soft-delete the event.
    /// Returns the number of registrations archived.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<Committed<usize>> {
        actor.require_admin()?;

        let archived = self
            .storage
            .delete_event(id, actor.recorded_id())
            .await?
            .ok_or_else(|| RegistrationError::not_found("Event not found"))?;
        tracing::info!(event_id = %id, registrations = archived.len(), "Event archived");

        let mut effects = vec![SideEffect::Audit(
            AuditEntry::new(actor, "event.deleted", "event")
                .entity(id)
                .details(json!({ "archivedRegistrations": archived.len() })),
        )];
        effects.extend(deletion_effects(
            &archived,
            actor,
            DeletionSource::EventDeleted,
        ));
        Ok(Committed {
            value: archived.len(),
            side_effects: dispatch(self.notifier.clone(), effects),
        })
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RegistrationError::validation("Title is required"));
    }
    if title.chars().count() > MAX_EVENT_TITLE_CHARS {
        return Err(RegistrationError::validation(format!(
            "Title must be at most {MAX_EVENT_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_total_slots(total: i32) -> Result<()> {
    if total < 0 {
        return Err(RegistrationError::validation(
            "totalSlots must not be negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Demo Day ").unwrap(), "Demo Day");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_EVENT_TITLE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_total_slots() {
        assert!(validate_total_slots(0).is_ok());
        assert!(matches!(
            validate_total_slots(-1),
            Err(RegistrationError::Validation(_))
        ));
    }
}
