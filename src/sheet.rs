use crate::error::{KbmAccrualError, Result};
use chrono::NaiveDateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Rows with fewer non-empty cells than this are separator or title noise.
pub const MIN_NON_EMPTY_CELLS: usize = 5;

static EMPTY_CELL: Cell = Cell::Empty;

/// A single spreadsheet value as read from the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Textual rendering used for matching and concatenation.
    /// Whole numbers render without a fractional part so numeric ids match their text form.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(format_number(*n)),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// Trimmed text, with whitespace-only text treated as missing.
    pub fn trimmed(&self) -> Option<String> {
        self.as_text()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Empty cell or the `-` placeholder the source system writes for "no value".
    pub fn is_placeholder(&self) -> bool {
        match self.trimmed() {
            None => true,
            Some(s) => s == "-",
        }
    }

    /// Lenient numeric coercion: anything that is not a finite number becomes `None`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => Decimal::from_f64(*n),
            Cell::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s).ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .and_then(Decimal::from_f64)
                })
            }
            Cell::Empty | Cell::DateTime(_) => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A sheet exactly as it was read: no header detection, no cleaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// One data row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Cell>,
}

impl Row {
    pub fn get(&self, column: &str) -> &Cell {
        self.values.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Cell) {
        self.values.insert(column.into(), value);
    }
}

/// A sheet after noise rows were dropped and the first surviving row became the header.
#[derive(Debug, Clone)]
pub struct Table {
    pub sheet: String,
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Drops rows with fewer than `min_cells` non-empty cells, then promotes the
    /// first remaining row to column names. Duplicate column names keep the first column.
    pub fn from_raw(sheet: &RawSheet, min_cells: usize) -> Result<Self> {
        let mut kept = sheet
            .rows
            .iter()
            .filter(|row| row.iter().filter(|c| !c.is_empty()).count() >= min_cells);

        let header_row = kept.next().ok_or_else(|| KbmAccrualError::MissingHeader {
            sheet: sheet.name.clone(),
            min_cells,
        })?;

        let header: Vec<String> = header_row
            .iter()
            .map(|c| c.trimmed().unwrap_or_default())
            .collect();

        let rows = kept.map(|cells| build_row(&header, cells)).collect();

        Ok(Self {
            sheet: sheet.name.clone(),
            header,
            rows,
        })
    }

    /// Header is the first row as-is; used for the small reference tables.
    pub fn with_first_row_header(sheet: &RawSheet) -> Result<Self> {
        Self::from_raw(sheet, 1)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header.iter().any(|h| h == column)
    }

    pub fn require_columns(&self, columns: &[&str]) -> Result<()> {
        for column in columns {
            if !self.has_column(column) {
                return Err(KbmAccrualError::MissingColumn {
                    sheet: self.sheet.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn build_row(header: &[String], cells: &[Cell]) -> Row {
    let mut row = Row::default();
    for (name, cell) in header.iter().zip(cells.iter()) {
        if name.is_empty() || row.values.contains_key(name) {
            continue;
        }
        row.values.insert(name.clone(), cell.clone());
    }
    row
}
