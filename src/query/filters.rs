use chrono::NaiveDate;
use duckdb::types::{ToSqlOutput, Value, ValueRef};
use duckdb::ToSql;

/// Date format accepted by the export endpoints and used in rendered cells.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while turning raw request parameters into filter criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Required parameters that were absent or empty, in declaration order.
    MissingParams(Vec<String>),
    /// A date parameter that failed to parse as `YYYY-MM-DD`.
    InvalidDate(String),
    /// `start_date` was after `end_date`.
    InvertedRange,
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParams(missing) => {
                write!(f, "missing required parameters: {}", missing.join(", "))
            }
            Self::InvalidDate(detail) => write!(f, "invalid date format: {detail}"),
            Self::InvertedRange => write!(f, "start_date cannot be after end_date"),
        }
    }
}

impl std::error::Error for FilterError {}

/// Inclusive date range shared by every query in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse both endpoints and reject an inverted range.
    pub fn parse(start: &str, end: &str) -> Result<Self, FilterError> {
        let start_date = parse_date("start_date", start)?;
        let end_date = parse_date("end_date", end)?;
        if start_date > end_date {
            return Err(FilterError::InvertedRange);
        }
        Ok(Self {
            start: start_date,
            end: end_date,
        })
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| FilterError::InvalidDate(format!("{field} {value:?}: {e}")))
}

/// A typed scalar binding for one predicate placeholder.
///
/// Dates bind as ISO strings and are cast back to DATE at the placeholder
/// (`CAST(? AS DATE)`), so the SQL text never carries a user-supplied value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarParam {
    Date(NaiveDate),
    Text(String),
}

impl ToSql for ScalarParam {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        match self {
            Self::Date(d) => Ok(ToSqlOutput::Owned(Value::Text(
                d.format(DATE_FORMAT).to_string(),
            ))),
            Self::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
        }
    }
}

/// A shared WHERE predicate plus its ordered parameter bindings.
///
/// The predicate text is a deterministic template: it depends only on which
/// filters are present, never on their values. Column names at the call sites
/// are `&'static str` constants, so nothing user-controlled reaches the SQL.
#[derive(Debug, Clone)]
pub struct FilterSet {
    conditions: Vec<String>,
    params: Vec<ScalarParam>,
}

impl FilterSet {
    /// Seed the predicate with the inclusive date-range condition.
    pub fn new(range: DateRange) -> Self {
        Self {
            conditions: vec!["date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)".to_string()],
            params: vec![ScalarParam::Date(range.start), ScalarParam::Date(range.end)],
        }
    }

    /// Append an equality condition on a fixed column.
    pub fn and_text(mut self, column: &'static str, value: &str) -> Self {
        self.conditions.push(format!("{column} = ?"));
        self.params.push(ScalarParam::Text(value.to_string()));
        self
    }

    /// Append an equality condition only when the value is present and
    /// non-empty. Absent filters contribute nothing to the predicate.
    pub fn and_text_opt(self, column: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.and_text(column, v),
            _ => self,
        }
    }

    /// The combined predicate, suitable for `WHERE {predicate}`.
    pub fn predicate(&self) -> String {
        self.conditions.join(" AND ")
    }

    /// Ordered bindings matching the predicate's placeholders.
    pub fn params(&self) -> &[ScalarParam] {
        &self.params
    }
}

/// Collect required parameters that are absent or empty.
fn missing_params(required: &[(&str, Option<&str>)]) -> Vec<String> {
    required
        .iter()
        .filter(|(_, value)| value.is_none_or(str::is_empty))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToString::to_string)
}

/// Validated filter criteria for an out-of-stock export.
#[derive(Debug, Clone)]
pub struct OosCriteria {
    pub range: DateRange,
    pub project_id: String,
    pub link_name: Option<String>,
    pub slug: Option<String>,
}

impl OosCriteria {
    /// Validate raw query parameters. `start_date`, `end_date` and
    /// `project_id` are required; `link_name` and `slug` are optional.
    pub fn from_params(
        start_date: Option<&str>,
        end_date: Option<&str>,
        project_id: Option<&str>,
        link_name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<Self, FilterError> {
        let missing = missing_params(&[
            ("start_date", start_date),
            ("end_date", end_date),
            ("project_id", project_id),
        ]);
        if !missing.is_empty() {
            return Err(FilterError::MissingParams(missing));
        }

        let range = DateRange::parse(start_date.unwrap_or(""), end_date.unwrap_or(""))?;
        Ok(Self {
            range,
            project_id: project_id.unwrap_or("").to_string(),
            link_name: non_empty(link_name),
            slug: non_empty(slug),
        })
    }

    /// The shared predicate for every out-of-stock query in one request.
    /// `slug` filters the warehouse `short_id` column.
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new(self.range)
            .and_text("project_id", &self.project_id)
            .and_text_opt("link_name", self.link_name.as_deref())
            .and_text_opt("short_id", self.slug.as_deref())
    }
}

/// Validated filter criteria for a page-analytics export.
#[derive(Debug, Clone)]
pub struct PageCriteria {
    pub range: DateRange,
    pub project_id: Option<String>,
    pub page_slug: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
}

impl PageCriteria {
    /// Validate raw query parameters. Only the date range is required; all
    /// dimension filters are optional.
    pub fn from_params(
        start_date: Option<&str>,
        end_date: Option<&str>,
        project_id: Option<&str>,
        page_slug: Option<&str>,
        source: Option<&str>,
        medium: Option<&str>,
    ) -> Result<Self, FilterError> {
        let missing = missing_params(&[("start_date", start_date), ("end_date", end_date)]);
        if !missing.is_empty() {
            return Err(FilterError::MissingParams(missing));
        }

        let range = DateRange::parse(start_date.unwrap_or(""), end_date.unwrap_or(""))?;
        Ok(Self {
            range,
            project_id: non_empty(project_id),
            page_slug: non_empty(page_slug),
            source: non_empty(source),
            medium: non_empty(medium),
        })
    }

    /// The shared predicate for every page-analytics query in one request.
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new(self.range)
            .and_text_opt("project_id", self.project_id.as_deref())
            .and_text_opt("page_slug", self.page_slug.as_deref())
            .and_text_opt("source", self.source.as_deref())
            .and_text_opt("medium", self.medium.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RANGE_CLAUSE: &str = "date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)";

    fn range() -> DateRange {
        DateRange::parse("2025-05-01", "2025-05-31").unwrap()
    }

    #[test]
    fn test_date_range_parse() {
        let r = range();
        assert_eq!(r.start_str(), "2025-05-01");
        assert_eq!(r.end_str(), "2025-05-31");
    }

    #[test]
    fn test_date_range_single_day() {
        assert!(DateRange::parse("2025-01-01", "2025-01-01").is_ok());
    }

    #[test]
    fn test_date_range_inverted() {
        let err = DateRange::parse("2025-05-31", "2025-05-01").unwrap_err();
        assert_eq!(err, FilterError::InvertedRange);
    }

    #[test]
    fn test_date_range_bad_month() {
        let err = DateRange::parse("2025-13-01", "2025-12-31").unwrap_err();
        match err {
            FilterError::InvalidDate(detail) => {
                assert!(detail.contains("start_date"), "detail: {detail}");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn test_date_range_garbage() {
        assert!(matches!(
            DateRange::parse("not-a-date", "2025-12-31"),
            Err(FilterError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_filter_set_required_only() {
        let filters = FilterSet::new(range()).and_text("project_id", "p1");
        assert_eq!(filters.predicate(), format!("{RANGE_CLAUSE} AND project_id = ?"));
        assert_eq!(filters.params().len(), 3);
        assert_eq!(filters.params()[2], ScalarParam::Text("p1".to_string()));
    }

    #[test]
    fn test_filter_set_optional_absent() {
        let filters = FilterSet::new(range())
            .and_text_opt("link_name", None)
            .and_text_opt("short_id", Some(""));
        assert_eq!(filters.predicate(), RANGE_CLAUSE);
        assert_eq!(filters.params().len(), 2);
    }

    #[test]
    fn test_filter_set_optional_present() {
        let filters = FilterSet::new(range()).and_text_opt("link_name", Some("spring-promo"));
        assert_eq!(filters.predicate(), format!("{RANGE_CLAUSE} AND link_name = ?"));
        assert_eq!(
            filters.params()[2],
            ScalarParam::Text("spring-promo".to_string())
        );
    }

    #[test]
    fn test_oos_criteria_missing_all() {
        let err = OosCriteria::from_params(None, None, None, None, None).unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingParams(vec![
                "start_date".to_string(),
                "end_date".to_string(),
                "project_id".to_string()
            ])
        );
    }

    #[test]
    fn test_oos_criteria_missing_end_date_only() {
        let err =
            OosCriteria::from_params(Some("2025-05-01"), None, Some("p1"), None, None).unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingParams(vec!["end_date".to_string()])
        );
    }

    #[test]
    fn test_oos_criteria_empty_counts_as_missing() {
        let err = OosCriteria::from_params(Some("2025-05-01"), Some("2025-05-31"), Some(""), None, None)
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingParams(vec!["project_id".to_string()])
        );
    }

    #[test]
    fn test_oos_criteria_full_filter_set() {
        let criteria = OosCriteria::from_params(
            Some("2025-05-01"),
            Some("2025-05-31"),
            Some("p1"),
            Some("promo"),
            Some("abc123"),
        )
        .unwrap();
        let filters = criteria.filter_set();
        assert_eq!(
            filters.predicate(),
            format!("{RANGE_CLAUSE} AND project_id = ? AND link_name = ? AND short_id = ?")
        );
        assert_eq!(filters.params().len(), 5);
    }

    #[test]
    fn test_page_criteria_dates_only() {
        let criteria =
            PageCriteria::from_params(Some("2025-01-01"), Some("2025-01-31"), None, None, None, None)
                .unwrap();
        let filters = criteria.filter_set();
        assert_eq!(filters.predicate(), RANGE_CLAUSE);
        assert_eq!(filters.params().len(), 2);
    }

    #[test]
    fn test_page_criteria_missing_dates() {
        let err =
            PageCriteria::from_params(None, None, Some("p1"), None, None, None).unwrap_err();
        assert_eq!(
            err,
            FilterError::MissingParams(vec![
                "start_date".to_string(),
                "end_date".to_string()
            ])
        );
    }

    #[test]
    fn test_scalar_param_date_binds_iso_text() {
        let param = ScalarParam::Date(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
        match param.to_sql().unwrap() {
            ToSqlOutput::Owned(Value::Text(s)) => assert_eq!(s, "2025-05-01"),
            other => panic!("expected owned text binding, got {other:?}"),
        }
    }

    proptest! {
        /// The predicate is a fixed template: no filter value ever changes
        /// the SQL text, only the bindings.
        #[test]
        fn prop_predicate_ignores_filter_values(
            project in ".*",
            link in ".*",
            slug in ".*",
        ) {
            let filters = FilterSet::new(range())
                .and_text("project_id", &project)
                .and_text_opt("link_name", Some(link.as_str()))
                .and_text_opt("short_id", Some(slug.as_str()));

            let mut expected = format!("{RANGE_CLAUSE} AND project_id = ?");
            if !link.is_empty() {
                expected.push_str(" AND link_name = ?");
            }
            if !slug.is_empty() {
                expected.push_str(" AND short_id = ?");
            }
            prop_assert_eq!(filters.predicate(), expected);
        }
    }
}
