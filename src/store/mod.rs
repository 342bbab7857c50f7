use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, EventUpdate, NewEvent, Rsvp, RsvpStatusView};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence seam for events and RSVPs.
///
/// The attendee set and capacity of an event are shared mutable state; they
/// are only ever mutated through the operations here, each of which applies
/// its effects as one atomic unit. [`PgStore`] is the production
/// implementation, [`MemoryStore`] a test double with the same semantics.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, organizer_id: Uuid, new: NewEvent) -> Result<Event, AppError>;

    /// All events, soonest first.
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    async fn get_event(&self, event_id: Uuid) -> Result<Event, AppError>;

    /// Organizer-only partial update. A capacity below the current attendee
    /// count is rejected, checked in the same atomic scope as the write.
    async fn update_event(
        &self,
        event_id: Uuid,
        caller: Uuid,
        update: EventUpdate,
    ) -> Result<Event, AppError>;

    /// Organizer-only delete; removes the event and every RSVP that
    /// references it in one transaction.
    async fn delete_event(&self, event_id: Uuid, caller: Uuid) -> Result<(), AppError>;

    /// Events organized by `user_id`, newest first.
    async fn events_by_organizer(&self, user_id: Uuid) -> Result<Vec<Event>, AppError>;

    /// Events `user_id` has a `going` RSVP for, soonest first.
    async fn events_attending(&self, user_id: Uuid) -> Result<Vec<Event>, AppError>;

    /// Admit `user_id` to the event, atomically: duplicate check, capacity
    /// check, RSVP insert, attendee set-add and version bump commit together
    /// or not at all. Two concurrent calls against the last free slot cannot
    /// both succeed.
    async fn create_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<Rsvp, AppError>;

    /// Delete the RSVP and free the slot, atomically.
    async fn cancel_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError>;

    /// Whether an RSVP exists for the pair, and its status. Reads the
    /// primary copy so a client is never told to re-attempt an RSVP that
    /// already exists.
    async fn rsvp_status(&self, event_id: Uuid, user_id: Uuid) -> Result<RsvpStatusView, AppError>;
}
