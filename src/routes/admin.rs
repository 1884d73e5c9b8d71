//! Admin endpoints for seeding and starting rounds.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::post,
};
use validator::Validate;

use crate::{
    dto::admin::{SeedRoundRequest, SeedRoundResponse, StartRoundResponse},
    error::AppError,
    services::{round_service, signal_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for seeding and starting rounds.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/round", post(seed_round))
        .route("/admin/round/start", post(start_round))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Replace the quiz sequence with a brand-new round.
#[utoipa::path(
    post,
    path = "/admin/round",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = SeedRoundRequest,
    responses(
        (status = 200, description = "Round seeded", body = SeedRoundResponse),
        (status = 400, description = "Empty sequence or malformed quiz")
    )
)]
pub async fn seed_round(
    State(state): State<SharedState>,
    Json(payload): Json<SeedRoundRequest>,
) -> Result<Json<SeedRoundResponse>, AppError> {
    payload.validate()?;
    Ok(Json(round_service::seed_round(&state, payload).await?))
}

/// Set the shared start flag for the active round.
#[utoipa::path(
    post,
    path = "/admin/round/start",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses(
        (status = 200, description = "Round started (or already started)", body = StartRoundResponse),
        (status = 404, description = "No round has been seeded")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
) -> Result<Json<StartRoundResponse>, AppError> {
    Ok(Json(signal_service::start_round(&state).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
