//! HTTP intake for platform events.
//!
//! The platform forwards each event as one JSON document to
//! `POST /events`; the handler publishes it on the [`EventBus`] and returns
//! immediately. The listener picks it up from there.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use intake_events::{EventBus, PlatformEvent};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct AcceptedResponse {
    topic: String,
    /// Number of subscribers the event was handed to.
    subscribers: usize,
}

/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /events -- publish one event on the bus.
async fn receive_event(
    State(bus): State<Arc<EventBus>>,
    Json(event): Json<PlatformEvent>,
) -> (StatusCode, Json<AcceptedResponse>) {
    let topic = event.topic.to_string();
    let subscribers = bus.publish(event);
    if subscribers == 0 {
        tracing::warn!(topic = %topic, "Event accepted but no listener is subscribed");
    }
    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { topic, subscribers }),
    )
}

/// Build the intake router with its middleware stack.
pub fn router(bus: Arc<EventBus>) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(receive_event))
        // -- Middleware stack (applied bottom-up) --
        .layer(CatchPanicLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(bus)
}
