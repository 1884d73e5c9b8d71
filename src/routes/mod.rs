//! HTTP route trees and their composition.

use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod identity;
pub mod round;
pub mod sse;
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(identity::router())
        .merge(teams::router())
        .merge(round::router())
        .merge(sse::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
