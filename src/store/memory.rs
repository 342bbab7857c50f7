//! In-memory store.
//!
//! Test double for [`PgStore`](crate::store::PgStore) with the same
//! observable semantics. A single mutex guards all state, so every operation
//! is one atomic unit and the capacity invariant holds under concurrent
//! callers just as it does under the Postgres row lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Event, EventUpdate, NewEvent, Rsvp, RsvpStatus, RsvpStatusView};
use crate::store::EventStore;
use crate::utils::error::AppError;

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    // Keyed by (event_id, user_id); uniqueness per pair falls out of the map.
    rsvps: HashMap<(Uuid, Uuid), Rsvp>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, organizer_id: Uuid, new: NewEvent) -> Result<Event, AppError> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id,
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            location: new.location.trim().to_string(),
            start_time: new.start_time,
            capacity: new.capacity,
            image_url: new.image_url,
            attendees: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.lock().await;
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let inner = self.inner.lock().await;
        let mut events: Vec<Event> = inner.events.values().cloned().collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Event, AppError> {
        let inner = self.inner.lock().await;
        inner
            .events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        caller: Uuid,
        update: EventUpdate,
    ) -> Result<Event, AppError> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if event.organizer_id != caller {
            return Err(AppError::Forbidden(
                "Only the organizer can modify this event".to_string(),
            ));
        }

        if let Some(capacity) = update.capacity {
            let attendee_count = event.attendees.len() as i32;
            if capacity < attendee_count {
                return Err(AppError::ValidationError(format!(
                    "Capacity cannot be less than current attendees ({attendee_count})"
                )));
            }
        }

        if let Some(title) = update.title {
            event.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            event.description = description.trim().to_string();
        }
        if let Some(location) = update.location {
            event.location = location.trim().to_string();
        }
        if let Some(start_time) = update.start_time {
            event.start_time = start_time;
        }
        if let Some(capacity) = update.capacity {
            event.capacity = capacity;
        }
        if let Some(image_url) = update.image_url {
            event.image_url = Some(image_url);
        }
        event.updated_at = Utc::now();

        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: Uuid, caller: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .get(&event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if event.organizer_id != caller {
            return Err(AppError::Forbidden(
                "Only the organizer can delete this event".to_string(),
            ));
        }

        inner.events.remove(&event_id);
        inner.rsvps.retain(|(eid, _), _| *eid != event_id);
        Ok(())
    }

    async fn events_by_organizer(&self, user_id: Uuid) -> Result<Vec<Event>, AppError> {
        let inner = self.inner.lock().await;
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|e| e.organizer_id == user_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn events_attending(&self, user_id: Uuid) -> Result<Vec<Event>, AppError> {
        let inner = self.inner.lock().await;
        let mut events: Vec<Event> = inner
            .rsvps
            .values()
            .filter(|r| r.user_id == user_id && r.status == RsvpStatus::Going)
            .filter_map(|r| inner.events.get(&r.event_id).cloned())
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }

    async fn create_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<Rsvp, AppError> {
        let mut inner = self.inner.lock().await;

        if inner.rsvps.contains_key(&(event_id, user_id)) {
            return Err(AppError::AlreadyRegistered(
                "You have already RSVP'd to this event".to_string(),
            ));
        }

        let event = inner
            .events
            .get(&event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if event.attendees.len() as i32 >= event.capacity {
            return Err(AppError::CapacityExceeded(
                "Event is at full capacity".to_string(),
            ));
        }

        let rsvp = Rsvp {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            status: RsvpStatus::Going,
            created_at: Utc::now(),
        };

        // Same mutex scope as the checks above; both effects land together.
        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        if !event.attendees.contains(&user_id) {
            event.attendees.push(user_id);
        }
        event.version += 1;
        event.updated_at = Utc::now();
        inner.rsvps.insert((event_id, user_id), rsvp.clone());

        Ok(rsvp)
    }

    async fn cancel_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;

        if inner.rsvps.remove(&(event_id, user_id)).is_none() {
            return Err(AppError::NotFound("RSVP not found".to_string()));
        }

        if let Some(event) = inner.events.get_mut(&event_id) {
            event.attendees.retain(|id| *id != user_id);
            event.version += 1;
            event.updated_at = Utc::now();
        }

        Ok(())
    }

    async fn rsvp_status(&self, event_id: Uuid, user_id: Uuid) -> Result<RsvpStatusView, AppError> {
        let inner = self.inner.lock().await;
        Ok(match inner.rsvps.get(&(event_id, user_id)) {
            Some(rsvp) => RsvpStatusView::present(rsvp.status),
            None => RsvpStatusView::absent(),
        })
    }
}
