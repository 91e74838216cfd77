use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::probe::Runner;
use crate::AppState;

/// Builds the Axum `Router` with both endpoints and the global middleware.
pub fn create_router<R: Runner>(state: Arc<AppState<R>>) -> Router {
    Router::new()
        // ── Landing page ────────────────────────────────────────
        .route("/", get(handlers::index::index))
        // ── Probe endpoint ──────────────────────────────────────
        .route("/probe", get(handlers::probe::probe::<R>))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CatchPanicLayer::new())
}
