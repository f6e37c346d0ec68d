use crate::query::filters::OosCriteria;
use crate::query::oos::{DailyCount, OosSummary, StateCount, SubstitutionDetail};
use crate::render::workbook::{Cell, Report, SummarySheet, Table};

pub const SHEET_DAILY: &str = "Out of Stock by Date";
pub const SHEET_STATE: &str = "Out of Stock by State";
pub const SHEET_SUBSTITUTIONS: &str = "Substitution Details";

const COLUMN_WIDTH: f64 = 25.0;

/// Assemble the out-of-stock report. Every sheet is mandatory and is emitted
/// even when its query returned no rows.
pub fn build_report(
    criteria: &OosCriteria,
    summary: &OosSummary,
    daily: &[DailyCount],
    states: &[StateCount],
    substitutions: &[SubstitutionDetail],
) -> Report {
    let project_label = summary
        .project_name
        .clone()
        .unwrap_or_else(|| criteria.project_id.clone());

    let mut context = vec![
        format!("Project: {project_label}"),
        format!(
            "Period: {} to {}",
            criteria.range.start_str(),
            criteria.range.end_str()
        ),
    ];
    if let Some(link_name) = &criteria.link_name {
        context.push(format!("Link Name: {link_name}"));
    }
    if let Some(slug) = &criteria.slug {
        context.push(format!("Slug: {slug}"));
    }

    let summary_sheet = SummarySheet {
        title: "Out of Stock Analytics Summary".to_string(),
        context,
        metrics: vec![
            (
                "Out of Stock Count".to_string(),
                Cell::Int(summary.out_of_stock_count),
            ),
            (
                "States Affected".to_string(),
                Cell::Int(summary.states_affected),
            ),
            (
                "Zip Codes Affected".to_string(),
                Cell::Int(summary.zip_codes_affected),
            ),
        ],
    };

    let daily_table = Table::build(
        SHEET_DAILY,
        vec!["Date", "Count"],
        vec![COLUMN_WIDTH; 2],
        daily,
        |row| vec![Cell::from(row.date.clone()), Cell::from(row.count)],
    );

    let state_table = Table::build(
        SHEET_STATE,
        vec!["State", "City", "Count"],
        vec![COLUMN_WIDTH; 3],
        states,
        |row| {
            vec![
                Cell::from(row.state.clone()),
                Cell::from(row.city.clone()),
                Cell::from(row.count),
            ]
        },
    );

    let substitution_table = Table::build(
        SHEET_SUBSTITUTIONS,
        vec![
            "Date",
            "Primary Product",
            "Replacement Product",
            "Substitution Reason",
            "Count",
        ],
        vec![COLUMN_WIDTH; 5],
        substitutions,
        |row| {
            vec![
                Cell::from(row.date.clone()),
                Cell::from(row.primary_product.clone()),
                Cell::from(row.replacement_product.clone()),
                Cell::from(row.reason.clone()),
                Cell::from(row.count),
            ]
        },
    );

    Report {
        summary: summary_sheet,
        tables: vec![daily_table, state_table, substitution_table],
    }
}
