use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers};
use crate::handlers::{events, health_check, rsvp};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/events", post(events::create_event).get(events::list_events))
        .route("/api/events/my-events", get(events::my_events))
        .route("/api/events/attending", get(events::attending_events))
        .route(
            "/api/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/api/rsvp/:event_id",
            post(rsvp::create_rsvp).delete(rsvp::cancel_rsvp),
        )
        .route("/api/rsvp/:event_id/status", get(rsvp::rsvp_status));

    with_security_headers(router)
        .layer(create_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
