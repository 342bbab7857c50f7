use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

pub async fn create_rsvp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let rsvp = state.store.create_rsvp(event_id, user_id).await?;
    Ok(created(rsvp, "Successfully RSVP'd to event"))
}

pub async fn cancel_rsvp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    state.store.cancel_rsvp(event_id, user_id).await?;
    Ok(empty_success("RSVP cancelled successfully"))
}

pub async fn rsvp_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let status = state.store.rsvp_status(event_id, user_id).await?;
    Ok(success(status, "RSVP status retrieved"))
}
