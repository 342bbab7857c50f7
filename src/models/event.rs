use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 1000;
const LOCATION_MIN: usize = 3;
const LOCATION_MAX: usize = 200;
const CAPACITY_MIN: i32 = 1;
const CAPACITY_MAX: i32 = 10_000;

/// A capacity-bounded event. `attendees` holds the user ids with a `going`
/// RSVP and never exceeds `capacity`. `version` is bumped inside every
/// transaction that mutates the attendee set, so a client holding an Event
/// payload can detect that it has gone stale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub capacity: i32,
    pub image_url: Option<String>,
    pub attendees: Vec<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub capacity: i32,
    pub image_url: Option<String>,
}

/// Partial update payload; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub capacity: Option<i32>,
    pub image_url: Option<String>,
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_capacity(capacity: i32) -> Result<(), AppError> {
    if !(CAPACITY_MIN..=CAPACITY_MAX).contains(&capacity) {
        return Err(AppError::ValidationError(format!(
            "Capacity must be between {CAPACITY_MIN} and {CAPACITY_MAX}"
        )));
    }
    Ok(())
}

impl NewEvent {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        check_length("Title", &self.title, TITLE_MIN, TITLE_MAX)?;
        check_length(
            "Description",
            &self.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
        )?;
        check_length("Location", &self.location, LOCATION_MIN, LOCATION_MAX)?;
        check_capacity(self.capacity)?;
        if self.start_time <= now {
            return Err(AppError::ValidationError(
                "Event start time must be in the future".to_string(),
            ));
        }
        Ok(())
    }
}

impl EventUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(title) = &self.title {
            check_length("Title", title, TITLE_MIN, TITLE_MAX)?;
        }
        if let Some(description) = &self.description {
            check_length("Description", description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
        }
        if let Some(location) = &self.location {
            check_length("Location", location, LOCATION_MIN, LOCATION_MAX)?;
        }
        if let Some(capacity) = self.capacity {
            check_capacity(capacity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> NewEvent {
        NewEvent {
            title: "Rust Meetup".to_string(),
            description: "Monthly Rust user group meetup".to_string(),
            location: "Community Hall".to_string(),
            start_time: Utc::now() + Duration::days(7),
            capacity: 50,
            image_url: None,
        }
    }

    #[test]
    fn test_valid_event_passes() {
        assert!(sample().validate(Utc::now()).is_ok());
    }

    #[test]
    fn test_short_title_rejected() {
        let mut event = sample();
        event.title = "ab".to_string();
        assert!(event.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut event = sample();
        event.capacity = 0;
        assert!(event.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_past_start_time_rejected() {
        let mut event = sample();
        event.start_time = Utc::now() - Duration::hours(1);
        assert!(event.validate(Utc::now()).is_err());
    }

    #[test]
    fn test_update_validates_only_present_fields() {
        let update = EventUpdate {
            capacity: Some(25),
            ..EventUpdate::default()
        };
        assert!(update.validate().is_ok());

        let update = EventUpdate {
            title: Some("x".to_string()),
            ..EventUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
