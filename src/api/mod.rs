pub mod errors;
pub mod oos;
pub mod pages;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use duckdb::Connection;
use parking_lot::Mutex;
use std::sync::Arc;

/// MIME type for xlsx workbook downloads.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared application state: the warehouse connection behind a mutex.
/// Each request acquires the lock once for its whole query set.
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
}

/// OPTIONS preflight response: 204 with the permissive CORS headers, short-
/// circuiting before any validation.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "3600"),
        ],
    )
}

/// Reduce a user-supplied filename segment to header-safe characters.
pub fn sanitize_filename_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
