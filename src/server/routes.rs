// src/server/routes.rs

//! Axum router configuration for the lookup endpoint

use crate::server::handlers;
use crate::server::AppState;
use axum::{routing::get, Router};

/// Build the lookup router. Anything that is not a single-segment package
/// name falls through to the 404 default.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/:package", get(handlers::lookup_package))
        .with_state(state)
}
