pub mod auth;
pub mod reports;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Reports
        .route("/api/reports/sales.csv", get(reports::export_csv))
}
