use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{EventUpdate, NewEvent};
use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewEvent>,
) -> Result<Response, AppError> {
    payload.validate(Utc::now())?;
    let event = state.store.create_event(user_id, payload).await?;
    Ok(created(event, "Event created"))
}

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.store.list_events().await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = state.store.get_event(event_id).await?;
    Ok(success(event, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<EventUpdate>,
) -> Result<Response, AppError> {
    payload.validate()?;
    let event = state.store.update_event(event_id, user_id, payload).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.store.delete_event(event_id, user_id).await?;
    Ok(empty_success("Event removed"))
}

pub async fn my_events(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, AppError> {
    let events = state.store.events_by_organizer(user_id).await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn attending_events(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, AppError> {
    let events = state.store.events_attending(user_id).await?;
    Ok(success(events, "Events retrieved"))
}
