use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Attendance status for an RSVP.
///
/// `NotGoing` is part of the wire format but no code path currently produces
/// it; `cancel_rsvp` hard-deletes the record instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    NotGoing,
}

/// A user's attendance commitment for one event. At most one record exists
/// per (user, event) pair, enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

/// Result of a status lookup; `status` is present only when `is_rsvped`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpStatusView {
    pub is_rsvped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RsvpStatus>,
}

impl RsvpStatusView {
    pub fn absent() -> Self {
        Self {
            is_rsvped: false,
            status: None,
        }
    }

    pub fn present(status: RsvpStatus) -> Self {
        Self {
            is_rsvped: true,
            status: Some(status),
        }
    }
}
