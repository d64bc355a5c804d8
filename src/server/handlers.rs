// src/server/handlers.rs

//! Package lookup handler

use crate::db;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

/// GET /:package
///
/// Returns the JSON array of every stored publication of the package.
/// Unknown names and path-shaped requests are 404; store failures are 500.
pub async fn lookup_package(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Response {
    info!("lookup for {}", package);

    if package.contains('/') {
        return StatusCode::NOT_FOUND.into_response();
    }

    let conn = match db::open_read_only(&state.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("failed to open database for lookup: {}", err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match db::models::find_by_name(&conn, &package) {
        Ok(packages) if packages.is_empty() => StatusCode::NOT_FOUND.into_response(),
        Ok(packages) => Json(packages).into_response(),
        Err(err) => {
            error!("lookup failed for {}: {}", package, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
