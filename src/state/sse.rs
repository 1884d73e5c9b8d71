use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// SSE sub-state: one hub for team clients, one token-guarded hub for the admin.
pub struct SseState {
    public: SseHub,
    admin: AdminSseState,
}

impl SseState {
    /// Build the SSE sub-tree with per-stream channel capacities.
    pub fn new(public_capacity: usize, admin_capacity: usize) -> Self {
        Self {
            public: SseHub::new(public_capacity),
            admin: AdminSseState::new(admin_capacity),
        }
    }

    /// Hub fanning out round events to every connected team client.
    pub fn public(&self) -> &SseHub {
        &self.public
    }

    /// Admin bundle holding the privileged hub and its connection token.
    pub fn admin(&self) -> &AdminSseState {
        &self.admin
    }
}

/// Admin SSE hub plus the token that serializes privileged connections.
///
/// The start flag has exactly one privileged writer; the token makes sure only
/// one admin stream is connected at a time.
pub struct AdminSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl AdminSseState {
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Borrow the broadcast hub used for admin-only events.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Borrow the token mutex that coordinates the single admin connection.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a hub backed by a Tokio broadcast channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
