use duckdb::Connection;

/// Out-of-stock event facts. One row per reported out-of-stock occurrence.
pub const CREATE_OUT_OF_STOCK_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS out_of_stock_events (
    date                     DATE NOT NULL,
    project_id               VARCHAR NOT NULL,
    project_name             VARCHAR,
    link_name                VARCHAR,
    short_id                 VARCHAR,
    state                    VARCHAR,
    city                     VARCHAR,
    zip_code                 VARCHAR,
    primary_product_name     VARCHAR,
    replacement_product_name VARCHAR,
    substitution_reason      VARCHAR
)
";

/// Daily page/traffic rollup. One row per page, source and medium per day.
pub const CREATE_PAGE_TRAFFIC_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS page_traffic_daily (
    date                         DATE NOT NULL,
    project_id                   VARCHAR,
    project_name                 VARCHAR,
    page_slug                    VARCHAR NOT NULL,
    source                       VARCHAR,
    medium                       VARCHAR,
    total_page_views             BIGINT NOT NULL DEFAULT 0,
    total_users                  BIGINT NOT NULL DEFAULT 0,
    total_sessions               BIGINT NOT NULL DEFAULT 0,
    total_clicks                 BIGINT NOT NULL DEFAULT 0,
    avg_session_duration_seconds DOUBLE,
    bounce_rate_pct              DOUBLE
)
";

/// Daily geographic rollup for pages.
pub const CREATE_PAGE_GEO_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS page_geo_daily (
    date       DATE NOT NULL,
    project_id VARCHAR,
    page_slug  VARCHAR NOT NULL,
    source     VARCHAR,
    medium     VARCHAR,
    country    VARCHAR,
    state      VARCHAR,
    city       VARCHAR,
    page_views BIGINT NOT NULL DEFAULT 0,
    users      BIGINT NOT NULL DEFAULT 0
)
";

/// Daily device-category rollup for pages.
pub const CREATE_PAGE_DEVICE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS page_device_daily (
    date                         DATE NOT NULL,
    project_id                   VARCHAR,
    page_slug                    VARCHAR NOT NULL,
    source                       VARCHAR,
    medium                       VARCHAR,
    device_category              VARCHAR,
    page_views                   BIGINT NOT NULL DEFAULT 0,
    users                        BIGINT NOT NULL DEFAULT 0,
    sessions                     BIGINT NOT NULL DEFAULT 0,
    avg_session_duration_seconds DOUBLE,
    bounce_rate_pct              DOUBLE
)
";

/// Daily click-through detail for pages. One row per page, destination and
/// event per day.
pub const CREATE_PAGE_CLICK_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS page_click_details (
    date                DATE NOT NULL,
    project_id          VARCHAR,
    page_slug           VARCHAR NOT NULL,
    source              VARCHAR,
    medium              VARCHAR,
    destination_url     VARCHAR,
    event_name          VARCHAR,
    total_clicks        BIGINT NOT NULL DEFAULT 0,
    page_views_that_day BIGINT NOT NULL DEFAULT 0,
    link_ctr_pct        DOUBLE
)
";

/// Initialize the warehouse schema. Idempotent.
///
/// Every page table carries the shared filter columns (date, project_id,
/// page_slug, source, medium) so one predicate applies identically across
/// the whole query set.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_OUT_OF_STOCK_TABLE)?;
    conn.execute_batch(CREATE_PAGE_TRAFFIC_TABLE)?;
    conn.execute_batch(CREATE_PAGE_GEO_TABLE)?;
    conn.execute_batch(CREATE_PAGE_DEVICE_TABLE)?;
    conn.execute_batch(CREATE_PAGE_CLICK_TABLE)?;
    Ok(())
}
