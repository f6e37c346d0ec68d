use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::api::{sanitize_filename_segment, AppState, XLSX_MIME};
use crate::query::filters::OosCriteria;
use crate::query::oos;
use crate::render;

const EXAMPLE: &str =
    "/export/out-of-stock?start_date=2025-05-01&end_date=2025-05-31&project_id=your-project-id";

/// Raw query parameters for the out-of-stock export. All fields optional so
/// the 400 body can list exactly what is missing.
#[derive(Debug, Deserialize)]
pub struct OosExportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<String>,
    pub link_name: Option<String>,
    pub slug: Option<String>,
}

/// GET /export/out-of-stock — out-of-stock analytics workbook download.
pub async fn export_out_of_stock(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OosExportParams>,
) -> Result<Response, ApiError> {
    let criteria = OosCriteria::from_params(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.project_id.as_deref(),
        params.link_name.as_deref(),
        params.slug.as_deref(),
    )
    .map_err(|e| ApiError::from_filter(e, EXAMPLE))?;

    // Run the whole query set on a blocking thread so the DuckDB mutex is
    // acquired once and no Tokio worker is blocked.
    let filters = criteria.filter_set();
    let state2 = Arc::clone(&state);
    let (summary, daily, states, substitutions) = tokio::task::spawn_blocking(move || {
        let conn = state2.conn.lock();
        let summary = oos::query_summary(&conn, &filters)?;
        let daily = oos::query_daily(&conn, &filters)?;
        let states = oos::query_by_state(&conn, &filters)?;
        let substitutions = oos::query_substitutions(&conn, &filters)?;
        Ok::<_, duckdb::Error>((summary, daily, states, substitutions))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;

    let report = render::oos::build_report(&criteria, &summary, &daily, &states, &substitutions);
    let buffer = render::workbook::render(&report)?;

    let filename = format!(
        "out_of_stock_analytics_{}_{}_to_{}.xlsx",
        sanitize_filename_segment(&criteria.project_id),
        criteria.range.start_str(),
        criteria.range.end_str()
    );

    tracing::info!(
        project_id = %criteria.project_id,
        rows = daily.len(),
        bytes = buffer.len(),
        "Out-of-stock export rendered"
    );

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        buffer,
    )
        .into_response())
}
