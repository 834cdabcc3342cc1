// src/sheet/mod.rs
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, instrument};

use crate::error::LoadError;

/// One cell of the raw grid, reduced to what the normalizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text form of the cell, `None` when empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// The first worksheet as a dense grid in absolute sheet coordinates.
///
/// Row 0 is the first physical row of the sheet even when the used range
/// starts further down, so a fixed header-skip offset means the same thing
/// it does in the published file.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

const EMPTY: Cell = Cell::Empty;

impl RawSheet {
    /// Build from ragged rows; short rows are padded with `Cell::Empty`.
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Cell::Empty);
        }
        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse workbook bytes (xlsx, xls, xlsb or ods) and densify the first sheet.
#[instrument(level = "debug", skip(bytes), fields(bytes = bytes.len()))]
pub fn read_first_sheet(bytes: Vec<u8>) -> Result<RawSheet, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptyWorkbook)??;

    let Some((end_row, end_col)) = range.end() else {
        debug!("first worksheet is empty");
        return Ok(RawSheet::default());
    };

    let mut rows = Vec::with_capacity(end_row as usize + 1);
    for r in 0..=end_row {
        let row: Vec<Cell> = (0..=end_col)
            .map(|c| range.get_value((r, c)).map(Cell::from).unwrap_or(Cell::Empty))
            .collect();
        rows.push(row);
    }

    let sheet = RawSheet::from_rows(rows);
    debug!(rows = sheet.height(), cols = sheet.width(), "read first worksheet");
    Ok(sheet)
}
