// Export sink and console previews.
//
// Detail tables are exported as the final filtered and sorted rows of a
// `TableView`; summary tables as their rollup rows. Both go through
// `ExportTable`, which the CSV/XLSX writers and the markdown preview share.
use crate::error::Result;
use crate::metrics::RatioBand;
use crate::reports::SummaryColumn;
use crate::rollup::{RowKind, SummaryRow};
use crate::table::{band, render, CellFormat, TableView, Value};
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

/// Headers plus resolved cell values, ready to be written. `formats` holds
/// one cell format per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportTable {
    pub headers: Vec<String>,
    #[serde(skip)]
    pub formats: Vec<CellFormat>,
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Non-finite numbers have no spreadsheet representation; they are carried
/// as their display text ("New ▲", "N/A").
fn export_value(value: Value, format: CellFormat) -> Value {
    match value {
        Value::Number(n) if !n.is_finite() => Value::Text(render(&value, format)),
        v => v,
    }
}

/// The filtered and sorted detail rows of `view`, with grouped export
/// headers such as "Recharge FM-1".
pub fn export_rows<R>(view: &TableView<R>, records: &[R]) -> ExportTable {
    let headers = view.columns().iter().map(|c| c.export_header()).collect();
    let formats = view.columns().iter().map(|c| c.format).collect();
    let rows = view
        .apply_all(records)
        .into_iter()
        .map(|r| {
            view.columns()
                .iter()
                .map(|c| export_value(c.value(r), c.format))
                .collect()
        })
        .collect();
    ExportTable { headers, formats, rows }
}

/// Summary rows as a table: the row label first, then one cell per column.
pub fn summary_table(rows: &[SummaryRow], label_header: &str, columns: &[SummaryColumn]) -> ExportTable {
    let headers = std::iter::once(label_header.to_string())
        .chain(columns.iter().map(SummaryColumn::export_header))
        .collect();
    let formats = std::iter::once(CellFormat::Plain)
        .chain(columns.iter().map(|c| c.format))
        .collect();
    let rows = rows
        .iter()
        .map(|row| {
            std::iter::once(Value::text(row.label.clone()))
                .chain(columns.iter().map(|c| {
                    let v = row.value(&c.key).map_or(Value::Empty, Value::Number);
                    export_value(v, c.format)
                }))
                .collect()
        })
        .collect();
    ExportTable { headers, formats, rows }
}

/// One summary row for JSON export. Values are keyed by field name; a
/// non-finite value is written as its display marker, never as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub kind: RowKind,
    pub keys: Vec<String>,
    pub label: String,
    pub record_count: usize,
    pub values: BTreeMap<String, Value>,
}

pub fn summary_records(rows: &[SummaryRow], columns: &[SummaryColumn]) -> Vec<SummaryRecord> {
    let format_of = |key: &str| {
        columns
            .iter()
            .find(|c| c.key == key)
            .map_or(CellFormat::Plain, |c| c.format)
    };
    rows.iter()
        .map(|row| SummaryRecord {
            kind: row.kind,
            keys: row.keys.clone(),
            label: row.label.clone(),
            record_count: row.record_count,
            values: row
                .values
                .iter()
                .map(|(k, v)| (k.clone(), export_value(Value::Number(*v), format_of(k))))
                .collect(),
        })
        .collect()
}

/// `detail_omzet_outlet` + 2024-05-31 → `detail_omzet_outlet_2024-05-31.xlsx`.
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.xlsx", prefix, date.format("%Y-%m-%d"))
}

pub fn write_csv(path: &Path, table: &ExportTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Value::as_plain_string))?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = table.len(), "csv export written");
    Ok(())
}

fn band_fill(band: RatioBand) -> Format {
    let rgb = match band {
        RatioBand::Excellent => 0x22C55E,
        RatioBand::Good => 0xBBF7D0,
        RatioBand::Fair => 0xFEF9C3,
        RatioBand::Poor => 0xFEE2E2,
    };
    Format::new().set_background_color(Color::RGB(rgb))
}

/// Ratio cells (rates, achievement) are filled with their band colour.
pub fn write_xlsx(path: &Path, sheet_name: &str, table: &ExportTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let r = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Value::Empty => {}
                Value::Number(n) => {
                    let format = table.formats.get(col).copied().unwrap_or_default();
                    match band(cell, format) {
                        Some(b) => {
                            worksheet.write_number_with_format(r, col as u16, *n, &band_fill(b))?;
                        }
                        None => {
                            worksheet.write_number(r, col as u16, *n)?;
                        }
                    }
                }
                Value::Text(s) => {
                    worksheet.write_string(r, col as u16, s)?;
                }
            }
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), sheet = sheet_name, rows = table.len(), "xlsx export written");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows, each cell formatted for
/// humans with the table's column formats.
pub fn preview_rows(table: &ExportTable, max_rows: usize) -> String {
    if table.is_empty() || max_rows == 0 {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(
            row.iter()
                .enumerate()
                .map(|(i, v)| render(v, table.formats.get(i).copied().unwrap_or_default())),
        );
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table(title: &str, note: Option<&str>, table: &ExportTable, max_rows: usize) {
    println!("\n{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    println!("{}\n", preview_rows(table, max_rows));
}
