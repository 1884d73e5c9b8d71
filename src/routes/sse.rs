//! Server-sent event streams.

use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime round events to connected team clients.
///
/// The first event is always `handshake`, carrying the current start flag so
/// late subscribers never miss the start of the round.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    let handshake = sse_service::handshake_event(&state, "public", None).await;
    info!("new public SSE connection");
    sse_service::to_sse_stream(handshake, receiver, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/admin",
    tag = "sse",
    responses(
        (status = 200, description = "Admin SSE stream", content_type = "text/event-stream", body = String),
        (status = 409, description = "Another admin stream is already active")
    )
)]
/// Stream admin-only events, establishing the admin token in the handshake.
pub async fn admin_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, token) = sse_service::subscribe_admin(&state).await?;
    let handshake = sse_service::handshake_event(&state, "admin", Some(token)).await;
    info!("new admin SSE connection");
    Ok(sse_service::to_sse_stream(
        handshake,
        receiver,
        StreamKind::Admin(state),
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/admin", get(admin_stream))
}
