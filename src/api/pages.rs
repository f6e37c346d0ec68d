use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::api::{sanitize_filename_segment, AppState, XLSX_MIME};
use crate::query::filters::PageCriteria;
use crate::query::pages;
use crate::render;

const EXAMPLE: &str = "/export/pages?start_date=2025-01-01&end_date=2025-12-31&project_id=my-project";

/// Raw query parameters for the page-analytics export.
#[derive(Debug, Deserialize)]
pub struct PageExportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub project_id: Option<String>,
    pub page_slug: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
}

/// GET /export/pages — page analytics workbook download.
pub async fn export_page_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageExportParams>,
) -> Result<Response, ApiError> {
    let criteria = PageCriteria::from_params(
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        params.project_id.as_deref(),
        params.page_slug.as_deref(),
        params.source.as_deref(),
        params.medium.as_deref(),
    )
    .map_err(|e| ApiError::from_filter(e, EXAMPLE))?;

    // One blocking task, one lock acquisition, all seven queries.
    let filters = criteria.filter_set();
    let state2 = Arc::clone(&state);
    let (summary, daily, page_rows, traffic, geography, devices, clicks) =
        tokio::task::spawn_blocking(move || {
            let conn = state2.conn.lock();
            let summary = pages::query_summary(&conn, &filters)?;
            let daily = pages::query_daily(&conn, &filters)?;
            let page_rows = pages::query_page_performance(&conn, &filters)?;
            let traffic = pages::query_traffic_sources(&conn, &filters)?;
            let geography = pages::query_geography(&conn, &filters)?;
            let devices = pages::query_devices(&conn, &filters)?;
            let clicks = pages::query_clicks(&conn, &filters)?;
            Ok::<_, duckdb::Error>((summary, daily, page_rows, traffic, geography, devices, clicks))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Query task panicked: {e}")))??;

    let report = render::pages::build_report(
        &criteria, &summary, &daily, &page_rows, &traffic, &geography, &devices, &clicks,
    );
    let buffer = render::workbook::render(&report)?;

    let filename = match &criteria.project_id {
        Some(project_id) => format!(
            "page_analytics_{}_{}_to_{}.xlsx",
            sanitize_filename_segment(project_id),
            criteria.range.start_str(),
            criteria.range.end_str()
        ),
        None => format!(
            "page_analytics_{}_to_{}.xlsx",
            criteria.range.start_str(),
            criteria.range.end_str()
        ),
    };

    tracing::info!(
        project_id = criteria.project_id.as_deref().unwrap_or("(all)"),
        sheets = report.tables.len() + 1,
        bytes = buffer.len(),
        "Page analytics export rendered"
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
