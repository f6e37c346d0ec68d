use duckdb::{params_from_iter, Connection};

use crate::query::filters::FilterSet;

const TRAFFIC_TABLE: &str = "page_traffic_daily";
const GEO_TABLE: &str = "page_geo_daily";
const DEVICE_TABLE: &str = "page_device_daily";
const CLICK_TABLE: &str = "page_click_details";

/// Geographic rows with this city value are synthetic placeholders from the
/// collection pipeline and are excluded from the geography sheet.
const UNSET_CITY: &str = "(not set)";

/// Overall page-analytics metrics for the filtered range.
#[derive(Debug, Clone)]
pub struct PageSummary {
    pub total_pages: i64,
    pub total_projects: i64,
    pub total_page_views: i64,
    pub total_users: i64,
    pub total_sessions: i64,
    pub total_clicks: i64,
    pub avg_session_duration: f64,
    pub avg_bounce_rate: f64,
    pub overall_ctr: f64,
}

/// One day of aggregated page metrics.
#[derive(Debug, Clone)]
pub struct DailyBreakdown {
    pub date: String,
    pub page_views: i64,
    pub users: i64,
    pub sessions: i64,
    pub clicks: i64,
    pub ctr_pct: f64,
    pub active_pages: i64,
}

/// Aggregated metrics for one page within one project.
#[derive(Debug, Clone)]
pub struct PagePerformance {
    pub page_slug: String,
    pub project_name: Option<String>,
    pub total_views: i64,
    pub total_users: i64,
    pub total_sessions: i64,
    pub total_clicks: i64,
    pub ctr_pct: f64,
    pub avg_session_duration: f64,
    pub avg_bounce_rate: f64,
    pub days_active: i64,
}

/// Traffic grouped by acquisition source and medium.
#[derive(Debug, Clone)]
pub struct TrafficSource {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub page_views: i64,
    pub users: i64,
    pub sessions: i64,
    pub unique_pages: i64,
}

/// Traffic grouped by country, state and city.
#[derive(Debug, Clone)]
pub struct GeoRow {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub page_views: i64,
    pub users: i64,
    pub unique_pages: i64,
}

/// Traffic grouped by device category.
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub device_category: Option<String>,
    pub page_views: i64,
    pub users: i64,
    pub sessions: i64,
    pub avg_session_duration: f64,
    pub avg_bounce_rate: f64,
}

/// Click-through detail for one page/destination/event combination.
#[derive(Debug, Clone)]
pub struct ClickRow {
    pub page_slug: String,
    pub destination_url: Option<String>,
    pub event_name: Option<String>,
    pub clicks: i64,
    pub page_views: i64,
    pub avg_ctr: f64,
}

// DuckDB widens integer SUMs to HUGEINT and returns NULL over an empty
// group, hence the CAST + COALESCE on every summed column below. The CTR
// expressions use NULLIF so a zero-view range divides to NULL and coalesces
// to 0 instead of erroring.

/// Query the overall summary metrics. Always returns exactly one row.
pub fn query_summary(conn: &Connection, filters: &FilterSet) -> Result<PageSummary, duckdb::Error> {
    let sql = format!(
        "SELECT COUNT(DISTINCT page_slug) AS total_pages,
                COUNT(DISTINCT project_id) AS total_projects,
                CAST(COALESCE(SUM(total_page_views), 0) AS BIGINT) AS total_page_views,
                CAST(COALESCE(SUM(total_users), 0) AS BIGINT) AS total_users,
                CAST(COALESCE(SUM(total_sessions), 0) AS BIGINT) AS total_sessions,
                CAST(COALESCE(SUM(total_clicks), 0) AS BIGINT) AS total_clicks,
                ROUND(COALESCE(AVG(avg_session_duration_seconds), 0), 2) AS avg_session_duration,
                ROUND(COALESCE(AVG(bounce_rate_pct), 0), 2) AS avg_bounce_rate,
                ROUND(COALESCE(CAST(SUM(total_clicks) AS DOUBLE)
                      / NULLIF(CAST(SUM(total_page_views) AS DOUBLE), 0) * 100, 0), 2) AS overall_ctr
         FROM {TRAFFIC_TABLE}
         WHERE {}",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row(params_from_iter(filters.params()), |row| {
        Ok(PageSummary {
            total_pages: row.get(0)?,
            total_projects: row.get(1)?,
            total_page_views: row.get(2)?,
            total_users: row.get(3)?,
            total_sessions: row.get(4)?,
            total_clicks: row.get(5)?,
            avg_session_duration: row.get(6)?,
            avg_bounce_rate: row.get(7)?,
            overall_ctr: row.get(8)?,
        })
    })
}

/// Query per-day aggregates, ascending by day.
pub fn query_daily(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<DailyBreakdown>, duckdb::Error> {
    let sql = format!(
        "SELECT strftime(date, '%Y-%m-%d') AS day,
                CAST(COALESCE(SUM(total_page_views), 0) AS BIGINT) AS page_views,
                CAST(COALESCE(SUM(total_users), 0) AS BIGINT) AS users,
                CAST(COALESCE(SUM(total_sessions), 0) AS BIGINT) AS sessions,
                CAST(COALESCE(SUM(total_clicks), 0) AS BIGINT) AS clicks,
                ROUND(COALESCE(CAST(SUM(total_clicks) AS DOUBLE)
                      / NULLIF(CAST(SUM(total_page_views) AS DOUBLE), 0) * 100, 0), 2) AS ctr_pct,
                COUNT(DISTINCT page_slug) AS active_pages
         FROM {TRAFFIC_TABLE}
         WHERE {}
         GROUP BY day
         ORDER BY day ASC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(DailyBreakdown {
                date: row.get(0)?,
                page_views: row.get(1)?,
                users: row.get(2)?,
                sessions: row.get(3)?,
                clicks: row.get(4)?,
                ctr_pct: row.get(5)?,
                active_pages: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query per-page performance, most-viewed first.
pub fn query_page_performance(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<PagePerformance>, duckdb::Error> {
    let sql = format!(
        "SELECT page_slug,
                project_name,
                CAST(COALESCE(SUM(total_page_views), 0) AS BIGINT) AS total_views,
                CAST(COALESCE(SUM(total_users), 0) AS BIGINT) AS total_users,
                CAST(COALESCE(SUM(total_sessions), 0) AS BIGINT) AS total_sessions,
                CAST(COALESCE(SUM(total_clicks), 0) AS BIGINT) AS total_clicks,
                ROUND(COALESCE(CAST(SUM(total_clicks) AS DOUBLE)
                      / NULLIF(CAST(SUM(total_page_views) AS DOUBLE), 0) * 100, 0), 2) AS ctr_pct,
                ROUND(COALESCE(AVG(avg_session_duration_seconds), 0), 2) AS avg_session_duration,
                ROUND(COALESCE(AVG(bounce_rate_pct), 0), 2) AS avg_bounce_rate,
                COUNT(DISTINCT date) AS days_active
         FROM {TRAFFIC_TABLE}
         WHERE {}
         GROUP BY page_slug, project_name
         ORDER BY total_views DESC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(PagePerformance {
                page_slug: row.get(0)?,
                project_name: row.get(1)?,
                total_views: row.get(2)?,
                total_users: row.get(3)?,
                total_sessions: row.get(4)?,
                total_clicks: row.get(5)?,
                ctr_pct: row.get(6)?,
                avg_session_duration: row.get(7)?,
                avg_bounce_rate: row.get(8)?,
                days_active: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query traffic grouped by source and medium, most-viewed first.
pub fn query_traffic_sources(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<TrafficSource>, duckdb::Error> {
    let sql = format!(
        "SELECT source,
                medium,
                CAST(COALESCE(SUM(total_page_views), 0) AS BIGINT) AS page_views,
                CAST(COALESCE(SUM(total_users), 0) AS BIGINT) AS users,
                CAST(COALESCE(SUM(total_sessions), 0) AS BIGINT) AS sessions,
                COUNT(DISTINCT page_slug) AS unique_pages
         FROM {TRAFFIC_TABLE}
         WHERE {}
         GROUP BY source, medium
         ORDER BY page_views DESC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(TrafficSource {
                source: row.get(0)?,
                medium: row.get(1)?,
                page_views: row.get(2)?,
                users: row.get(3)?,
                sessions: row.get(4)?,
                unique_pages: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query geographic distribution, most-viewed first, capped at 100 rows.
/// Rows carrying the unset-city sentinel are excluded.
pub fn query_geography(conn: &Connection, filters: &FilterSet) -> Result<Vec<GeoRow>, duckdb::Error> {
    let sql = format!(
        "SELECT country,
                state,
                city,
                CAST(COALESCE(SUM(page_views), 0) AS BIGINT) AS total_page_views,
                CAST(COALESCE(SUM(users), 0) AS BIGINT) AS total_users,
                COUNT(DISTINCT page_slug) AS unique_pages
         FROM {GEO_TABLE}
         WHERE {}
           AND city != '{UNSET_CITY}'
         GROUP BY country, state, city
         ORDER BY total_page_views DESC
         LIMIT 100",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(GeoRow {
                country: row.get(0)?,
                state: row.get(1)?,
                city: row.get(2)?,
                page_views: row.get(3)?,
                users: row.get(4)?,
                unique_pages: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query the device-category breakdown, most-viewed first.
pub fn query_devices(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<DeviceRow>, duckdb::Error> {
    let sql = format!(
        "SELECT device_category,
                CAST(COALESCE(SUM(page_views), 0) AS BIGINT) AS total_page_views,
                CAST(COALESCE(SUM(users), 0) AS BIGINT) AS total_users,
                CAST(COALESCE(SUM(sessions), 0) AS BIGINT) AS total_sessions,
                ROUND(COALESCE(AVG(avg_session_duration_seconds), 0), 2) AS avg_session_duration,
                ROUND(COALESCE(AVG(bounce_rate_pct), 0), 2) AS avg_bounce_rate
         FROM {DEVICE_TABLE}
         WHERE {}
         GROUP BY device_category
         ORDER BY total_page_views DESC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(DeviceRow {
                device_category: row.get(0)?,
                page_views: row.get(1)?,
                users: row.get(2)?,
                sessions: row.get(3)?,
                avg_session_duration: row.get(4)?,
                avg_bounce_rate: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query click-through detail, most-clicked first, capped at 500 rows.
pub fn query_clicks(conn: &Connection, filters: &FilterSet) -> Result<Vec<ClickRow>, duckdb::Error> {
    let sql = format!(
        "SELECT page_slug,
                destination_url,
                event_name,
                CAST(COALESCE(SUM(total_clicks), 0) AS BIGINT) AS clicks,
                CAST(COALESCE(MAX(page_views_that_day), 0) AS BIGINT) AS page_views,
                ROUND(COALESCE(AVG(link_ctr_pct), 0), 2) AS avg_ctr
         FROM {CLICK_TABLE}
         WHERE {}
         GROUP BY page_slug, destination_url, event_name
         ORDER BY clicks DESC
         LIMIT 500",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(ClickRow {
                page_slug: row.get(0)?,
                destination_url: row.get(1)?,
                event_name: row.get(2)?,
                clicks: row.get(3)?,
                page_views: row.get(4)?,
                avg_ctr: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
