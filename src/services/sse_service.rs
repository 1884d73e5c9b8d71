use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the admin-only SSE stream.
pub async fn subscribe_admin(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_admin_token(state).await?;
    let receiver = state.admin_sse().subscribe();
    Ok((receiver, token))
}

/// Build the handshake event sent first on every new subscription.
///
/// The handshake carries the current start flag, so a client that subscribes
/// after the administrator started the round learns it immediately instead of
/// waiting for a `round_started` event that already fired.
pub async fn handshake_event(
    state: &SharedState,
    stream: &str,
    token: Option<String>,
) -> ServerEvent {
    let payload = Handshake {
        stream: stream.to_string(),
        started: state.signal().is_started(),
        degraded: state.is_degraded().await,
        token,
    };

    ServerEvent::json(Some("handshake".to_string()), &payload).unwrap_or_else(|_| {
        ServerEvent::new(Some("handshake".to_string()), "{}".to_string())
    })
}

/// Identifies the target SSE stream so we can perform stream-specific
/// bookkeeping when the connection is torn down.
#[derive(Clone)]
pub enum StreamKind {
    /// Shared stream every team client listens on.
    Public,
    /// Carries a clone of the shared application state so teardown logic can
    /// reset the admin token after the spawned task completes. Cloning
    /// `SharedState` is cheap because it is just bumping the inner `Arc`.
    Admin(SharedState),
}

/// Convert a broadcast receiver into an SSE response, emitting `handshake`
/// first, then forwarding events and cleaning up once the client disconnects.
pub fn to_sse_stream(
    handshake: ServerEvent,
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            teardown(kind).await;
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        teardown(kind).await;
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

async fn teardown(kind: StreamKind) {
    match kind {
        StreamKind::Public => tracing::info!("public SSE stream disconnected"),
        StreamKind::Admin(state) => {
            // Own the necessary state inside the spawned task so we can
            // clean up even if the request context has already dropped.
            reset_admin_token(state).await;
            tracing::info!("admin SSE stream disconnected")
        }
    }
}

/// Reserve the admin token for a new stream, generating one when none exists
/// and failing if another connection already holds it.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::InvalidState(
            "another admin SSE stream is already active".into(),
        )),
    }
}

/// Clear any stored admin token so the next admin connection negotiates a
/// fresh credential.
async fn reset_admin_token(state: SharedState) {
    let mut guard = state.admin_token().lock().await;
    guard.take();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::models::StartFlagEntity, state::AppState};

    #[tokio::test]
    async fn admin_token_is_exclusive() {
        let state = AppState::new(AppConfig::default());

        let (_receiver, token) = subscribe_admin(&state).await.unwrap();
        assert!(!token.is_empty());

        let err = subscribe_admin(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // Releasing the token lets the next admin connect.
        reset_admin_token(state.clone()).await;
        subscribe_admin(&state).await.unwrap();
    }

    #[tokio::test]
    async fn handshake_reflects_the_start_flag() {
        let state = AppState::new(AppConfig::default());

        let before = handshake_event(&state, "public", None).await;
        assert!(before.data.contains("\"started\":false"));

        state.signal().mark_started(StartFlagEntity::started_now());
        let after = handshake_event(&state, "public", None).await;
        assert!(after.data.contains("\"started\":true"));
    }
}
