pub mod pass;
pub mod print;
pub mod qr;

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};

use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        // Public pass
        .route("/t/{token}", get(pass::show))
        // Thermal printouts
        .route("/print/tickets/{id}", get(print::ticket))
        .route("/print/reports", get(print::report))
}

pub fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M UTC").to_string()
}
