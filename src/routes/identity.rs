//! Session identity issuance.

use axum::{Json, Router, extract::State, routing::post};

use crate::{dto::identity::IdentityResponse, services::identity_service, state::SharedState};

/// Issue a fresh opaque session identity.
#[utoipa::path(
    post,
    path = "/identity",
    tag = "identity",
    responses((status = 200, description = "Identity issued", body = IdentityResponse))
)]
pub async fn issue_identity(State(state): State<SharedState>) -> Json<IdentityResponse> {
    Json(identity_service::issue(&state))
}

/// Configure the identity routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/identity", post(issue_identity))
}
