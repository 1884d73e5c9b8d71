//! Issues the opaque per-session identities clients use for attribution.

use tracing::info;

use crate::{dto::identity::IdentityResponse, state::SharedState};

/// Issue a fresh identity and register its flow in the lobby.
///
/// The identity carries no game semantics and is not tied to a person; it is
/// only stable for the session that requested it.
pub fn issue(state: &SharedState) -> IdentityResponse {
    let identity_id = state.register_identity();
    info!(%identity_id, "issued session identity");
    IdentityResponse { identity_id }
}
