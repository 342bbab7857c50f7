//! Route-level tests: the full router with the in-memory store behind it.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use gatherly_server::routes::create_routes;
use gatherly_server::state::AppState;
use gatherly_server::store::MemoryStore;

fn app() -> Router {
    create_routes(AppState::new(Arc::new(MemoryStore::new())))
}

fn event_body(capacity: i32) -> Value {
    json!({
        "title": "Rust Meetup",
        "description": "Monthly Rust user group meetup",
        "location": "Community Hall",
        "start_time": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "capacity": capacity,
        "image_url": null,
    })
}

fn post_json(uri: &str, user: Option<Uuid>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn request(method: &str, uri: &str, user: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_event(app: &Router, organizer: Uuid, capacity: i32) -> Uuid {
    let response = app
        .clone()
        .oneshot(post_json("/api/events", Some(organizer), event_body(capacity)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn health_check_is_public() {
    let response = app()
        .oneshot(request("GET", "/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("ok"));
}

#[tokio::test]
async fn mutating_routes_require_identity() {
    let app = app();

    let response = app
        .clone()
        .oneshot(post_json("/api/events", None, event_body(10)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("AUTH_ERROR"));

    let response = app
        .oneshot(request("POST", &format!("/api/rsvp/{}", Uuid::new_v4()), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_event_payload_is_rejected() {
    let app = app();
    let mut body = event_body(10);
    body["title"] = json!("ab");

    let response = app
        .oneshot(post_json("/api/events", Some(Uuid::new_v4()), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn rsvp_lifecycle_over_http() {
    let app = app();
    let organizer = Uuid::new_v4();
    let attendee = Uuid::new_v4();
    let event_id = create_event(&app, organizer, 10).await;

    // Create
    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/rsvp/{event_id}"), Some(attendee)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("going"));

    // Status
    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/rsvp/{event_id}/status"),
            Some(attendee),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_rsvped"], json!(true));
    assert_eq!(body["data"]["status"], json!("going"));

    // Duplicate
    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/rsvp/{event_id}"), Some(attendee)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("ALREADY_REGISTERED"));

    // Cancel
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/rsvp/{event_id}"),
            Some(attendee),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Status after cancel
    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/rsvp/{event_id}/status"),
            Some(attendee),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_rsvped"], json!(false));
    assert!(body["data"].get("status").is_none());
}

#[tokio::test]
async fn full_event_returns_capacity_exceeded() {
    let app = app();
    let event_id = create_event(&app, Uuid::new_v4(), 1).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/rsvp/{event_id}"),
            Some(Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/rsvp/{event_id}"),
            Some(Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("CAPACITY_EXCEEDED"));
}

#[tokio::test]
async fn rsvp_on_unknown_event_is_not_found() {
    let response = app()
        .oneshot(request(
            "POST",
            &format!("/api/rsvp/{}", Uuid::new_v4()),
            Some(Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_event_cascades_and_guards_ownership() {
    let app = app();
    let organizer = Uuid::new_v4();
    let attendee = Uuid::new_v4();
    let event_id = create_event(&app, organizer, 5).await;

    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/rsvp/{event_id}"), Some(attendee)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Not the organizer
    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/events/{event_id}"),
            Some(attendee),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/events/{event_id}"),
            Some(organizer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/rsvp/{event_id}/status"),
            Some(attendee),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_rsvped"], json!(false));
}

#[tokio::test]
async fn listing_routes_reflect_rsvps() {
    let app = app();
    let organizer = Uuid::new_v4();
    let attendee = Uuid::new_v4();
    let event_id = create_event(&app, organizer, 5).await;

    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/rsvp/{event_id}"), Some(attendee)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/events/attending", Some(attendee)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(request("GET", "/api/events/my-events", Some(organizer)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
