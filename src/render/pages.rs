use crate::query::filters::PageCriteria;
use crate::query::pages::{
    ClickRow, DailyBreakdown, DeviceRow, GeoRow, PagePerformance, PageSummary, TrafficSource,
};
use crate::render::workbook::{Cell, Report, SummarySheet, Table};

pub const SHEET_DAILY: &str = "Daily Breakdown";
pub const SHEET_PAGES: &str = "Page Performance";
pub const SHEET_TRAFFIC: &str = "Traffic Sources";
pub const SHEET_GEO: &str = "Geographic Distribution";
pub const SHEET_DEVICES: &str = "Device Breakdown";
pub const SHEET_CLICKS: &str = "Click Details";

/// Assemble the page-analytics report. All sheets are mandatory except the
/// click-detail sheet, which is emitted only when its query returned rows.
pub fn build_report(
    criteria: &PageCriteria,
    summary: &PageSummary,
    daily: &[DailyBreakdown],
    pages: &[PagePerformance],
    traffic: &[TrafficSource],
    geography: &[GeoRow],
    devices: &[DeviceRow],
    clicks: &[ClickRow],
) -> Report {
    let mut context = Vec::new();
    if let Some(project_id) = &criteria.project_id {
        context.push(format!("Project: {project_id}"));
    }
    context.push(format!(
        "Period: {} to {}",
        criteria.range.start_str(),
        criteria.range.end_str()
    ));
    if let Some(page_slug) = &criteria.page_slug {
        context.push(format!("Page Slug: {page_slug}"));
    }
    if let Some(source) = &criteria.source {
        context.push(format!("Source: {source}"));
    }
    if let Some(medium) = &criteria.medium {
        context.push(format!("Medium: {medium}"));
    }

    let summary_sheet = SummarySheet {
        title: "Page Analytics Summary Report".to_string(),
        context,
        metrics: vec![
            ("Total Pages".to_string(), Cell::Int(summary.total_pages)),
            (
                "Total Projects".to_string(),
                Cell::Int(summary.total_projects),
            ),
            (
                "Total Page Views".to_string(),
                Cell::Int(summary.total_page_views),
            ),
            ("Total Users".to_string(), Cell::Int(summary.total_users)),
            (
                "Total Sessions".to_string(),
                Cell::Int(summary.total_sessions),
            ),
            ("Total Clicks".to_string(), Cell::Int(summary.total_clicks)),
            (
                "Average Session Duration (seconds)".to_string(),
                Cell::Float(summary.avg_session_duration),
            ),
            (
                "Average Bounce Rate (%)".to_string(),
                Cell::Float(summary.avg_bounce_rate),
            ),
            ("Overall CTR (%)".to_string(), Cell::Float(summary.overall_ctr)),
        ],
    };

    let daily_table = Table::build(
        SHEET_DAILY,
        vec![
            "Date",
            "Page Views",
            "Users",
            "Sessions",
            "Clicks",
            "CTR (%)",
            "Active Pages",
        ],
        vec![15.0; 7],
        daily,
        |row| {
            vec![
                Cell::from(row.date.clone()),
                Cell::from(row.page_views),
                Cell::from(row.users),
                Cell::from(row.sessions),
                Cell::from(row.clicks),
                Cell::from(row.ctr_pct),
                Cell::from(row.active_pages),
            ]
        },
    );

    let pages_table = Table::build(
        SHEET_PAGES,
        vec![
            "Page Slug",
            "Project",
            "Views",
            "Users",
            "Sessions",
            "Clicks",
            "CTR (%)",
            "Avg Duration (s)",
            "Bounce Rate (%)",
            "Days Active",
        ],
        vec![18.0; 10],
        pages,
        |row| {
            vec![
                Cell::from(row.page_slug.clone()),
                Cell::from(row.project_name.clone()),
                Cell::from(row.total_views),
                Cell::from(row.total_users),
                Cell::from(row.total_sessions),
                Cell::from(row.total_clicks),
                Cell::from(row.ctr_pct),
                Cell::from(row.avg_session_duration),
                Cell::from(row.avg_bounce_rate),
                Cell::from(row.days_active),
            ]
        },
    );

    let traffic_table = Table::build(
        SHEET_TRAFFIC,
        vec![
            "Source",
            "Medium",
            "Page Views",
            "Users",
            "Sessions",
            "Unique Pages",
        ],
        vec![20.0; 6],
        traffic,
        |row| {
            vec![
                Cell::from(row.source.clone()),
                Cell::from(row.medium.clone()),
                Cell::from(row.page_views),
                Cell::from(row.users),
                Cell::from(row.sessions),
                Cell::from(row.unique_pages),
            ]
        },
    );

    let geo_table = Table::build(
        SHEET_GEO,
        vec![
            "Country",
            "State",
            "City",
            "Page Views",
            "Users",
            "Unique Pages",
        ],
        vec![20.0; 6],
        geography,
        |row| {
            vec![
                Cell::from(row.country.clone()),
                Cell::from(row.state.clone()),
                Cell::from(row.city.clone()),
                Cell::from(row.page_views),
                Cell::from(row.users),
                Cell::from(row.unique_pages),
            ]
        },
    );

    let device_table = Table::build(
        SHEET_DEVICES,
        vec![
            "Device Category",
            "Page Views",
            "Users",
            "Sessions",
            "Avg Duration (s)",
            "Bounce Rate (%)",
        ],
        vec![20.0; 6],
        devices,
        |row| {
            vec![
                Cell::from(row.device_category.clone()),
                Cell::from(row.page_views),
                Cell::from(row.users),
                Cell::from(row.sessions),
                Cell::from(row.avg_session_duration),
                Cell::from(row.avg_bounce_rate),
            ]
        },
    );

    let mut tables = vec![
        daily_table,
        pages_table,
        traffic_table,
        geo_table,
        device_table,
    ];

    if !clicks.is_empty() {
        tables.push(Table::build(
            SHEET_CLICKS,
            vec![
                "Page Slug",
                "Destination URL",
                "Event Name",
                "Total Clicks",
                "Page Views",
                "CTR (%)",
            ],
            vec![30.0, 50.0, 15.0, 15.0, 15.0, 15.0],
            clicks,
            |row| {
                vec![
                    Cell::from(row.page_slug.clone()),
                    Cell::from(row.destination_url.clone()),
                    Cell::from(row.event_name.clone()),
                    Cell::from(row.clicks),
                    Cell::from(row.page_views),
                    Cell::from(row.avg_ctr),
                ]
            },
        ));
    }

    Report {
        summary: summary_sheet,
        tables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> PageCriteria {
        PageCriteria::from_params(
            Some("2025-01-01"),
            Some("2025-01-31"),
            None,
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn empty_summary() -> PageSummary {
        PageSummary {
            total_pages: 0,
            total_projects: 0,
            total_page_views: 0,
            total_users: 0,
            total_sessions: 0,
            total_clicks: 0,
            avg_session_duration: 0.0,
            avg_bounce_rate: 0.0,
            overall_ctr: 0.0,
        }
    }

    fn click_row() -> ClickRow {
        ClickRow {
            page_slug: "/landing".to_string(),
            destination_url: Some("https://example.com".to_string()),
            event_name: Some("click".to_string()),
            clicks: 7,
            page_views: 100,
            avg_ctr: 7.0,
        }
    }

    #[test]
    fn test_click_sheet_omitted_when_empty() {
        let report = build_report(
            &criteria(),
            &empty_summary(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &[],
        );
        let names: Vec<&str> = report.tables.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![SHEET_DAILY, SHEET_PAGES, SHEET_TRAFFIC, SHEET_GEO, SHEET_DEVICES]
        );
    }

    #[test]
    fn test_click_sheet_present_with_rows() {
        let clicks = vec![click_row()];
        let report = build_report(
            &criteria(),
            &empty_summary(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &clicks,
        );
        assert_eq!(report.tables.last().map(|t| t.name), Some(SHEET_CLICKS));
        assert_eq!(report.tables.len(), 6);
    }

    #[test]
    fn test_summary_metric_order() {
        let report = build_report(
            &criteria(),
            &empty_summary(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &[],
        );
        let labels: Vec<&str> = report
            .summary
            .metrics
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Total Pages",
                "Total Projects",
                "Total Page Views",
                "Total Users",
                "Total Sessions",
                "Total Clicks",
                "Average Session Duration (seconds)",
                "Average Bounce Rate (%)",
                "Overall CTR (%)",
            ]
        );
    }

    #[test]
    fn test_context_lists_active_filters_one_per_line() {
        let criteria = PageCriteria::from_params(
            Some("2025-01-01"),
            Some("2025-01-31"),
            Some("p1"),
            Some("/landing"),
            Some("google"),
            Some("cpc"),
        )
        .unwrap();
        let report = build_report(
            &criteria,
            &empty_summary(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(
            report.summary.context,
            vec![
                "Project: p1".to_string(),
                "Period: 2025-01-01 to 2025-01-31".to_string(),
                "Page Slug: /landing".to_string(),
                "Source: google".to_string(),
                "Medium: cpc".to_string(),
            ]
        );
    }

    #[test]
    fn test_context_without_filters_is_period_only() {
        let report = build_report(
            &criteria(),
            &empty_summary(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(
            report.summary.context,
            vec!["Period: 2025-01-01 to 2025-01-31".to_string()]
        );
    }
}
