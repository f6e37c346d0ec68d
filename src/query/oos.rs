use duckdb::{params_from_iter, Connection};

use crate::query::filters::FilterSet;

const TABLE: &str = "out_of_stock_events";

/// Headline out-of-stock counts and distinct geography impact.
#[derive(Debug, Clone)]
pub struct OosSummary {
    pub out_of_stock_count: i64,
    pub states_affected: i64,
    pub zip_codes_affected: i64,
    /// Representative tenant label, when any row matched.
    pub project_name: Option<String>,
}

/// One day of out-of-stock events.
#[derive(Debug, Clone)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

/// Out-of-stock events grouped by geography.
#[derive(Debug, Clone)]
pub struct StateCount {
    pub state: Option<String>,
    pub city: Option<String>,
    pub count: i64,
}

/// A substituted-product combination and how often it occurred.
#[derive(Debug, Clone)]
pub struct SubstitutionDetail {
    pub date: String,
    pub primary_product: Option<String>,
    pub replacement_product: Option<String>,
    pub reason: Option<String>,
    pub count: i64,
}

/// Query the summary metrics. Aggregates always return exactly one row.
pub fn query_summary(conn: &Connection, filters: &FilterSet) -> Result<OosSummary, duckdb::Error> {
    // Predicate text is a fixed placeholder template from FilterSet; user
    // values only travel through the bindings.
    let sql = format!(
        "SELECT COUNT(*) AS out_of_stock_count,
                COUNT(DISTINCT state) AS states_affected,
                COUNT(DISTINCT zip_code) AS zip_codes_affected,
                any_value(project_name) AS project_name
         FROM {TABLE}
         WHERE {}",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row(params_from_iter(filters.params()), |row| {
        Ok(OosSummary {
            out_of_stock_count: row.get(0)?,
            states_affected: row.get(1)?,
            zip_codes_affected: row.get(2)?,
            project_name: row.get(3)?,
        })
    })
}

/// Query daily out-of-stock counts, ascending by day.
pub fn query_daily(conn: &Connection, filters: &FilterSet) -> Result<Vec<DailyCount>, duckdb::Error> {
    let sql = format!(
        "SELECT strftime(date, '%Y-%m-%d') AS day,
                COUNT(*) AS count
         FROM {TABLE}
         WHERE {}
         GROUP BY day
         ORDER BY day ASC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(DailyCount {
                date: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query out-of-stock counts by state and city, busiest first.
pub fn query_by_state(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<StateCount>, duckdb::Error> {
    let sql = format!(
        "SELECT state, city, COUNT(*) AS count
         FROM {TABLE}
         WHERE {}
         GROUP BY state, city
         ORDER BY count DESC, state ASC, city ASC",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(StateCount {
                state: row.get(0)?,
                city: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Query the top substitution combinations, capped at 25 rows.
pub fn query_substitutions(
    conn: &Connection,
    filters: &FilterSet,
) -> Result<Vec<SubstitutionDetail>, duckdb::Error> {
    let sql = format!(
        "SELECT strftime(date, '%Y-%m-%d') AS day,
                primary_product_name,
                replacement_product_name,
                substitution_reason,
                COUNT(*) AS count
         FROM {TABLE}
         WHERE {}
         GROUP BY day, primary_product_name, replacement_product_name, substitution_reason
         ORDER BY count DESC, day ASC,
                  primary_product_name ASC, replacement_product_name ASC,
                  substitution_reason ASC
         LIMIT 25",
        filters.predicate()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(filters.params()), |row| {
            Ok(SubstitutionDetail {
                date: row.get(0)?,
                primary_product: row.get(1)?,
                replacement_product: row.get(2)?,
                reason: row.get(3)?,
                count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
