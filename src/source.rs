//! Worksheet reading and column selection.
//!
//! [`read_sheet`] loads one named worksheet into a [`Table`] of header names
//! and [`Cell`]s; [`Table::select`] resolves the configured headers and turns
//! every data row into a [`SourceRow`]. All workbook formats `calamine`
//! understands (xlsx, xlsm, xlsb, xls, ods) are accepted.
//!
//! A missing file, sheet, or required header is a configuration error and is
//! reported before anything touches the store.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::config::ColumnNames;
use crate::models::SourceRow;

/// A worksheet cell after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Numeric value, or `None` for anything that is not a finite number.
    ///
    /// Text that parses as a number (`" 12.5 "`) counts; dataset markers such
    /// as `N` (not determined) and `Tr` (trace) do not.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Empty | Cell::Bool(_) => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Display string of the cell, or `None` if it is empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

/// Header names plus the data rows beneath them.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Required headers from `columns` that this table does not have.
    pub fn missing_columns<'a>(&self, columns: &'a ColumnNames) -> Vec<&'a str> {
        columns
            .required()
            .into_iter()
            .filter(|wanted| !self.headers.iter().any(|h| h == wanted))
            .collect()
    }

    /// Keep only the configured columns, one [`SourceRow`] per data row.
    ///
    /// Headers are matched exactly; the first of several identically named
    /// headers wins.
    ///
    /// # Errors
    ///
    /// Fails, naming every absent header, when any required column is missing.
    pub fn select(&self, columns: &ColumnNames) -> Result<Vec<SourceRow>> {
        let position = |wanted: &str| self.headers.iter().position(|h| h == wanted);

        let (
            Some(name_col),
            Some(energy_col),
            Some(protein_col),
            Some(fat_col),
            Some(carbs_col),
            Some(fibre_col),
        ) = (
            position(&columns.name),
            position(&columns.energy),
            position(&columns.protein),
            position(&columns.fat),
            position(&columns.carbs),
            position(&columns.fibre),
        )
        else {
            bail!(
                "Missing required column(s): {}. Found headers: {}",
                quote_list(&self.missing_columns(columns)),
                quote_list(&self.headers)
            );
        };

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let cell = |i: usize| row.get(i).unwrap_or(&Cell::Empty);
                SourceRow {
                    name: cell(name_col).as_text(),
                    energy_kcal: cell(energy_col).as_number(),
                    protein_g: cell(protein_col).as_number(),
                    fat_g: cell(fat_col).as_number(),
                    carbohydrate_g: cell(carbs_col).as_number(),
                    fibre_g: cell(fibre_col).as_number(),
                }
            })
            .collect();

        Ok(rows)
    }
}

fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Names of all worksheets in the workbook at `path`.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    Ok(workbook.sheet_names())
}

/// Read worksheet `sheet` from the workbook at `path`.
///
/// `header_row` is the zero-based sheet row holding the column headers;
/// rows above it are ignored and every row below it is data.
pub fn read_sheet(path: &Path, sheet: &str, header_row: usize) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        bail!(
            "Sheet '{}' not found in {}. Available sheets: {}",
            sheet,
            path.display(),
            quote_list(&names)
        );
    }

    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read sheet: {}", sheet))?;

    // The range starts at the first used cell, not necessarily at A1.
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let Some(skip) = header_row.checked_sub(first_row) else {
        bail!(
            "Header row {} of sheet '{}' is empty (data starts at row {})",
            header_row,
            sheet,
            first_row
        );
    };

    let mut rows = range.rows().skip(skip);
    let Some(header_cells) = rows.next() else {
        bail!("Sheet '{}' has no header row at index {}", sheet, header_row);
    };

    let headers: Vec<String> = header_cells
        .iter()
        .map(|c| Cell::from(c).as_text().unwrap_or_default())
        .collect();

    let rows: Vec<Vec<Cell>> = rows
        .map(|r| r.iter().map(Cell::from).collect())
        .collect();

    log::debug!(
        "read sheet '{}': {} columns, {} data rows",
        sheet,
        headers.len(),
        rows.len()
    );

    Ok(Table::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        ColumnNames::default()
            .required()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn number_coercion() {
        assert_eq!(Cell::Number(4.5).as_number(), Some(4.5));
        assert_eq!(Cell::Number(0.0).as_number(), Some(0.0));
        assert_eq!(text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(text("Tr").as_number(), None);
        assert_eq!(text("N").as_number(), None);
        assert_eq!(text("NaN").as_number(), None);
        assert_eq!(Cell::Number(f64::NAN).as_number(), None);
        assert_eq!(Cell::Empty.as_number(), None);
    }

    #[test]
    fn text_coercion() {
        assert_eq!(text("Tofu").as_text().as_deref(), Some("Tofu"));
        assert_eq!(Cell::Number(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(Cell::Number(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn calamine_cells_convert() {
        assert_eq!(Cell::from(&Data::String(String::new())), Cell::Empty);
        assert_eq!(Cell::from(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(
            Cell::from(&Data::Error(calamine::CellErrorType::NA)),
            Cell::Empty
        );
    }

    #[test]
    fn select_maps_columns_by_header() {
        // Columns deliberately out of order, plus an unrelated one.
        let table = Table::new(
            vec![
                "Food Code".into(),
                "Fat (g)".into(),
                "Food Name".into(),
                "AOAC fibre (g)".into(),
                "Protein (g)".into(),
                "Carbohydrate (g)".into(),
                "Energy (kcal) (kcal)".into(),
            ],
            vec![vec![
                text("11-001"),
                Cell::Number(3.1),
                text("Tofu"),
                text("N"),
                Cell::Number(8.1),
                Cell::Number(0.7),
                Cell::Number(73.0),
            ]],
        );
        let rows = table.select(&ColumnNames::default()).unwrap();
        assert_eq!(
            rows,
            vec![SourceRow {
                name: Some("Tofu".into()),
                energy_kcal: Some(73.0),
                protein_g: Some(8.1),
                fat_g: Some(3.1),
                carbohydrate_g: Some(0.7),
                fibre_g: None,
            }]
        );
    }

    #[test]
    fn short_rows_pad_with_missing() {
        let table = Table::new(headers(), vec![vec![text("Rice"), Cell::Number(130.0)]]);
        let rows = table.select(&ColumnNames::default()).unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Rice"));
        assert_eq!(rows[0].energy_kcal, Some(130.0));
        assert_eq!(rows[0].fibre_g, None);
    }

    #[test]
    fn missing_column_is_fatal() {
        let mut h = headers();
        h.retain(|c| c != "Fat (g)");
        let table = Table::new(h, vec![]);
        let err = table.select(&ColumnNames::default()).unwrap_err();
        assert!(err.to_string().contains("'Fat (g)'"));
    }

    #[test]
    fn header_match_is_exact() {
        let mut h = headers();
        h[0] = "food name".into();
        let table = Table::new(h, vec![]);
        assert_eq!(
            table.missing_columns(&ColumnNames::default()),
            vec!["Food Name"]
        );
    }
}
