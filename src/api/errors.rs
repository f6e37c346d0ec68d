use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_xlsxwriter::XlsxError;

use crate::query::filters::FilterError;

/// Export error type with HTTP status code mapping.
///
/// Validation failures map to 400 with a structured body; everything after
/// validation (warehouse queries, workbook assembly) maps to 500. The
/// `example` carried by the 400 variants is the endpoint's sample URL.
#[derive(Debug)]
pub enum ApiError {
    MissingParams {
        missing: Vec<String>,
        example: &'static str,
    },
    InvalidDate {
        detail: String,
        example: &'static str,
    },
    InvertedRange {
        example: &'static str,
    },
    Query(duckdb::Error),
    Render(XlsxError),
    Internal(String),
}

impl ApiError {
    /// Attach the endpoint's example URL to a filter-validation failure.
    pub fn from_filter(err: FilterError, example: &'static str) -> Self {
        match err {
            FilterError::MissingParams(missing) => Self::MissingParams { missing, example },
            FilterError::InvalidDate(detail) => Self::InvalidDate { detail, example },
            FilterError::InvertedRange => Self::InvertedRange { example },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParams { missing, .. } => {
                write!(f, "Missing required parameters: {}", missing.join(", "))
            }
            Self::InvalidDate { detail, .. } => write!(f, "Invalid date format: {detail}"),
            Self::InvertedRange { .. } => write!(f, "start_date cannot be after end_date"),
            Self::Query(e) => write!(f, "Query failed: {e}"),
            Self::Render(e) => write!(f, "Workbook rendering failed: {e}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::MissingParams { missing, example } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "Missing required parameters",
                    "missing": missing,
                    "example": example,
                }),
            ),
            Self::InvalidDate { detail, example } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "Invalid date format",
                    "detail": detail,
                    "example": example,
                }),
            ),
            Self::InvertedRange { example } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "start_date cannot be after end_date",
                    "example": example,
                }),
            ),
            Self::Query(e) => {
                tracing::error!(error = %e, "Warehouse query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": format!("Query failed: {e}") }),
                )
            }
            Self::Render(e) => {
                tracing::error!(error = %e, "Workbook rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": format!("Workbook rendering failed: {e}") }),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<duckdb::Error> for ApiError {
    fn from(e: duckdb::Error) -> Self {
        Self::Query(e)
    }
}

impl From<XlsxError> for ApiError {
    fn from(e: XlsxError) -> Self {
        Self::Render(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_params_status() {
        let err = ApiError::MissingParams {
            missing: vec!["end_date".to_string()],
            example: "/export?start_date=2025-01-01",
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_inverted_range_status() {
        let err = ApiError::InvertedRange { example: "/export" };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_status() {
        let err = ApiError::Internal("something broke".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_filter_attaches_example() {
        let err = ApiError::from_filter(
            FilterError::MissingParams(vec!["end_date".to_string()]),
            "/example",
        );
        match err {
            ApiError::MissingParams { missing, example } => {
                assert_eq!(missing, vec!["end_date".to_string()]);
                assert_eq!(example, "/example");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let err = ApiError::MissingParams {
            missing: vec!["start_date".to_string(), "end_date".to_string()],
            example: "/example",
        };
        assert_eq!(
            format!("{err}"),
            "Missing required parameters: start_date, end_date"
        );
    }
}
