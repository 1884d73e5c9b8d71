//! Session identity payload.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque session identity issued to a device at first load.
#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    /// The issued identity. Stable for the session, not tied to a person.
    pub identity_id: Uuid,
}
