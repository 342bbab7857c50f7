//! PostgreSQL store.
//!
//! RSVP admission control runs inside explicit transactions. The event row
//! is locked with `SELECT ... FOR UPDATE` before the capacity check, so two
//! concurrent admissions against the same event are serialized and the
//! check-then-insert window is closed rather than narrowed. The unique index
//! on `(user_id, event_id)` backstops the duplicate check across
//! connections. Dropping a transaction without committing rolls it back, so
//! every early-return error path leaves the store untouched.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Event, EventUpdate, NewEvent, Rsvp, RsvpStatus, RsvpStatusView};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// How many times an admission transaction is retried after a concurrent
/// write aborts it (SQLSTATE 40001/40P01) before `TransientConflict` is
/// surfaced to the caller.
const MAX_TX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    async fn try_create_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<Rsvp, AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM rsvps WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(tx_error)?;

        if existing.is_some() {
            return Err(AppError::AlreadyRegistered(
                "You have already RSVP'd to this event".to_string(),
            ));
        }

        // Row lock serializes concurrent admissions for this event.
        let event: Option<(i32, i32)> = sqlx::query_as(
            "SELECT capacity, cardinality(attendees) FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(tx_error)?;

        let (capacity, attendee_count) = match event {
            Some(row) => row,
            None => return Err(AppError::NotFound("Event not found".to_string())),
        };

        if attendee_count >= capacity {
            return Err(AppError::CapacityExceeded(
                "Event is at full capacity".to_string(),
            ));
        }

        let rsvp: Rsvp = sqlx::query_as(
            "INSERT INTO rsvps (user_id, event_id, status) VALUES ($1, $2, $3) \
             RETURNING id, user_id, event_id, status, created_at",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(RsvpStatus::Going)
        .fetch_one(&mut *tx)
        .await
        .map_err(insert_rsvp_error)?;

        // Idempotent set-add; the guard keeps retried statements from
        // producing duplicate entries.
        sqlx::query(
            "UPDATE events \
             SET attendees = array_append(attendees, $2), \
                 version = version + 1, \
                 updated_at = NOW() \
             WHERE id = $1 AND NOT ($2 = ANY(attendees))",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(tx_error)?;

        tx.commit().await.map_err(tx_error)?;

        Ok(rsvp)
    }

    async fn try_cancel_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let deleted: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM rsvps WHERE user_id = $1 AND event_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(tx_error)?;

        if deleted.is_none() {
            return Err(AppError::NotFound("RSVP not found".to_string()));
        }

        sqlx::query(
            "UPDATE events \
             SET attendees = array_remove(attendees, $2), \
                 version = version + 1, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(tx_error)?;

        tx.commit().await.map_err(tx_error)?;

        Ok(())
    }

    async fn lock_event_header(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
    ) -> Result<(Uuid, i32), AppError> {
        let row: Option<(Uuid, i32)> = sqlx::query_as(
            "SELECT organizer_id, cardinality(attendees) FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(tx_error)?;

        row.ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, organizer_id: Uuid, new: NewEvent) -> Result<Event, AppError> {
        let event: Event = sqlx::query_as(
            "INSERT INTO events \
                 (organizer_id, title, description, location, start_time, capacity, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(organizer_id)
        .bind(new.title.trim())
        .bind(new.description.trim())
        .bind(new.location.trim())
        .bind(new.start_time)
        .bind(new.capacity)
        .bind(new.image_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as("SELECT * FROM events ORDER BY start_time ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn get_event(&self, event_id: Uuid) -> Result<Event, AppError> {
        let event: Option<Event> = sqlx::query_as("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        event.ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        caller: Uuid,
        update: EventUpdate,
    ) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let (organizer_id, attendee_count) = Self::lock_event_header(&mut tx, event_id).await?;

        if organizer_id != caller {
            return Err(AppError::Forbidden(
                "Only the organizer can modify this event".to_string(),
            ));
        }

        if let Some(capacity) = update.capacity {
            if capacity < attendee_count {
                return Err(AppError::ValidationError(format!(
                    "Capacity cannot be less than current attendees ({attendee_count})"
                )));
            }
        }

        let event: Event = sqlx::query_as(
            "UPDATE events SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 location = COALESCE($4, location), \
                 start_time = COALESCE($5, start_time), \
                 capacity = COALESCE($6, capacity), \
                 image_url = COALESCE($7, image_url), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(event_id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(update.description.as_deref().map(str::trim))
        .bind(update.location.as_deref().map(str::trim))
        .bind(update.start_time)
        .bind(update.capacity)
        .bind(update.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(tx_error)?;

        tx.commit().await.map_err(tx_error)?;

        Ok(event)
    }

    async fn delete_event(&self, event_id: Uuid, caller: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(tx_error)?;

        let (organizer_id, _) = Self::lock_event_header(&mut tx, event_id).await?;

        if organizer_id != caller {
            return Err(AppError::Forbidden(
                "Only the organizer can delete this event".to_string(),
            ));
        }

        // The FK is ON DELETE CASCADE; the explicit sweep keeps the cascade
        // contract visible and covered even if the constraint changes.
        sqlx::query("DELETE FROM rsvps WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_error)?;

        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(tx_error)?;

        tx.commit().await.map_err(tx_error)?;

        Ok(())
    }

    async fn events_by_organizer(&self, user_id: Uuid) -> Result<Vec<Event>, AppError> {
        let events =
            sqlx::query_as("SELECT * FROM events WHERE organizer_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(events)
    }

    async fn events_attending(&self, user_id: Uuid) -> Result<Vec<Event>, AppError> {
        let events = sqlx::query_as(
            "SELECT e.* FROM events e \
             JOIN rsvps r ON r.event_id = e.id \
             WHERE r.user_id = $1 AND r.status = $2 \
             ORDER BY e.start_time ASC",
        )
        .bind(user_id)
        .bind(RsvpStatus::Going)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn create_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<Rsvp, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_create_rsvp(event_id, user_id).await {
                Err(AppError::TransientConflict(_)) if attempt < MAX_TX_ATTEMPTS => {
                    debug!(%event_id, %user_id, attempt, "RSVP transaction aborted, retrying");
                }
                result => return result,
            }
        }
    }

    async fn cancel_rsvp(&self, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_cancel_rsvp(event_id, user_id).await {
                Err(AppError::TransientConflict(_)) if attempt < MAX_TX_ATTEMPTS => {
                    debug!(%event_id, %user_id, attempt, "Cancel transaction aborted, retrying");
                }
                result => return result,
            }
        }
    }

    async fn rsvp_status(&self, event_id: Uuid, user_id: Uuid) -> Result<RsvpStatusView, AppError> {
        let rsvp: Option<Rsvp> = sqlx::query_as(
            "SELECT id, user_id, event_id, status, created_at \
             FROM rsvps WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match rsvp {
            Some(rsvp) => RsvpStatusView::present(rsvp.status),
            None => RsvpStatusView::absent(),
        })
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    // 40001 serialization_failure, 40P01 deadlock_detected
    matches!(
        err,
        sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
    )
}

fn tx_error(err: sqlx::Error) -> AppError {
    if is_transient(&err) {
        AppError::TransientConflict("Concurrent update aborted the transaction".to_string())
    } else {
        AppError::DatabaseError(err)
    }
}

fn insert_rsvp_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return AppError::AlreadyRegistered(
                "You have already RSVP'd to this event".to_string(),
            );
        }
    }
    tx_error(err)
}
