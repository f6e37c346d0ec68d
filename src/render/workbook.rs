use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};

/// Fill color for table header rows.
const HEADER_FILL: u32 = 0x4472_C4;
/// Font color for table header rows.
const HEADER_FONT: u32 = 0xFFFF_FF;
/// Font color for the summary title line.
const TITLE_FONT: u32 = 0x1F4E_78;
/// Fill color for alternating summary metric rows.
const METRIC_SHADE: u32 = 0xD9E1_F2;

const SUMMARY_LABEL_WIDTH: f64 = 40.0;
const SUMMARY_VALUE_WIDTH: f64 = 20.0;

/// One spreadsheet cell value. Dates arrive pre-formatted as `YYYY-MM-DD`
/// text from the query layer; `Empty` leaves the cell blank.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Empty,
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Empty, Self::Text)
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// A tabular sheet: header labels, fixed column widths and data rows.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table by mapping each result row to its cells in header
    /// order. This is the one shared render-table path; per-sheet code only
    /// supplies labels, widths and the mapper.
    pub fn build<T>(
        name: &'static str,
        headers: Vec<&'static str>,
        widths: Vec<f64>,
        rows: &[T],
        mapper: impl Fn(&T) -> Vec<Cell>,
    ) -> Self {
        debug_assert_eq!(headers.len(), widths.len());
        Self {
            name,
            headers,
            widths,
            rows: rows.iter().map(mapper).collect(),
        }
    }
}

/// The summary sheet: a title, an italic context block and a two-column
/// metric table.
#[derive(Debug, Clone)]
pub struct SummarySheet {
    pub title: String,
    /// Project label, period line and one line per active optional filter.
    pub context: Vec<String>,
    pub metrics: Vec<(String, Cell)>,
}

/// An ordered workbook: summary first, then one sheet per table.
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: SummarySheet,
    pub tables: Vec<Table>,
}

struct Styles {
    header: Format,
    title: Format,
    context: Format,
    shade: Format,
}

fn styles() -> Styles {
    Styles {
        header: Format::new()
            .set_bold()
            .set_font_color(HEADER_FONT)
            .set_background_color(HEADER_FILL)
            .set_align(FormatAlign::Center),
        title: Format::new()
            .set_bold()
            .set_font_size(16)
            .set_font_color(TITLE_FONT),
        context: Format::new().set_italic().set_font_size(11),
        shade: Format::new().set_background_color(METRIC_SHADE),
    }
}

/// Serialize a report into an in-memory xlsx buffer.
pub fn render(report: &Report) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let styles = styles();

    write_summary(&mut workbook, &report.summary, &styles)?;
    for table in &report.tables {
        write_table(&mut workbook, table, &styles)?;
    }

    workbook.save_to_buffer()
}

fn write_summary(
    workbook: &mut Workbook,
    summary: &SummarySheet,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;

    sheet.write_string_with_format(0, 0, &summary.title, &styles.title)?;

    let mut row = 1u32;
    for line in &summary.context {
        sheet.write_string_with_format(row, 0, line, &styles.context)?;
        row += 1;
    }

    // Blank spacer, then the metric table header
    row += 1;
    sheet.write_string_with_format(row, 0, "Metric", &styles.header)?;
    sheet.write_string_with_format(row, 1, "Value", &styles.header)?;
    row += 1;

    for (offset, (metric, value)) in summary.metrics.iter().enumerate() {
        let shaded = offset % 2 == 1;
        if shaded {
            sheet.write_string_with_format(row, 0, metric, &styles.shade)?;
            write_cell(sheet, row, 1, value, Some(&styles.shade))?;
        } else {
            sheet.write_string(row, 0, metric)?;
            write_cell(sheet, row, 1, value, None)?;
        }
        row += 1;
    }

    sheet.set_column_width(0, SUMMARY_LABEL_WIDTH)?;
    sheet.set_column_width(1, SUMMARY_VALUE_WIDTH)?;
    Ok(())
}

fn write_table(
    workbook: &mut Workbook,
    table: &Table,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.name)?;

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, cast_col(col), *header, &styles.header)?;
    }

    for (row_idx, cells) in table.rows.iter().enumerate() {
        let row = u32::try_from(row_idx + 1).unwrap_or(u32::MAX);
        for (col, cell) in cells.iter().enumerate() {
            write_cell(sheet, row, cast_col(col), cell, None)?;
        }
    }

    for (col, width) in table.widths.iter().enumerate() {
        sheet.set_column_width(cast_col(col), *width)?;
    }
    Ok(())
}

fn write_cell(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    #[allow(clippy::cast_precision_loss)]
    match (cell, format) {
        (Cell::Text(s), Some(f)) => {
            sheet.write_string_with_format(row, col, s, f)?;
        }
        (Cell::Text(s), None) => {
            sheet.write_string(row, col, s)?;
        }
        (Cell::Int(v), Some(f)) => {
            sheet.write_number_with_format(row, col, *v as f64, f)?;
        }
        (Cell::Int(v), None) => {
            sheet.write_number(row, col, *v as f64)?;
        }
        (Cell::Float(v), Some(f)) => {
            sheet.write_number_with_format(row, col, *v, f)?;
        }
        (Cell::Float(v), None) => {
            sheet.write_number(row, col, *v)?;
        }
        (Cell::Empty, Some(f)) => {
            sheet.write_blank(row, col, f)?;
        }
        (Cell::Empty, None) => {}
    }
    Ok(())
}

fn cast_col(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}
