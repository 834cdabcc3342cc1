// src/schema/mod.rs

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, instrument};

use crate::error::SchemaMismatch;
use crate::normalize::clean_label;
use crate::sheet::RawSheet;

/// Declarative description of the published workbook's layout.
///
/// Everything the normalizer assumes about the sheet lives here and is checked
/// by [`SheetLayout::locate`] before any reshaping happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Physical rows above the header row.
    pub header_skip: usize,
    /// Header of column 0, which holds tax descriptions.
    pub label_column: String,
    /// Header of the classification-code column, discarded.
    pub code_column: String,
    /// Data rows below the header, period row included. Anything after is footnotes.
    pub data_rows: usize,
    /// Header cells starting with this prefix count as unlabelled.
    pub placeholder_prefix: String,
    /// Cell values meaning "suppressed / not applicable".
    pub suppression_markers: Vec<String>,
    /// Source values are multiplied by this to get billions.
    pub value_scale: f64,
    /// State label of the national aggregate.
    pub national_total: String,
    /// Category label of the all-taxes aggregate.
    pub total_category: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            header_skip: 5,
            label_column: "Tax Description".into(),
            code_column: "Code".into(),
            data_rows: 32,
            placeholder_prefix: "Unnamed".into(),
            suppression_markers: vec!["X".into()],
            value_scale: 1e3 / 1e9,
            national_total: "U.S. Total (excludes Washington, D.C.)".into(),
            total_category: "Total Taxes".into(),
        }
    }
}

/// Where the pieces of a validated sheet are.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFrame {
    pub header_row: usize,
    pub period_row: usize,
    pub category_rows: Range<usize>,
    pub code_col: usize,
    pub value_cols: Vec<usize>,
}

impl SheetLayout {
    /// True when a header cell carries no label of its own.
    pub fn is_placeholder(&self, header: Option<&str>) -> bool {
        match header.map(str::trim) {
            None | Some("") => true,
            Some(h) => h.starts_with(&self.placeholder_prefix),
        }
    }

    pub fn is_suppressed(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.suppression_markers.iter().any(|m| m == raw)
    }

    /// Validate the structural assumptions and return the located frame.
    #[instrument(level = "debug", skip_all, fields(rows = sheet.height(), cols = sheet.width()))]
    pub fn locate(&self, sheet: &RawSheet) -> Result<SheetFrame, SchemaMismatch> {
        let header_row = self.header_skip;
        let needed = header_row + 1 + self.data_rows;
        if sheet.height() < needed {
            return Err(SchemaMismatch::TooFewRows {
                needed,
                found: sheet.height(),
            });
        }

        let label = sheet
            .get(header_row, 0)
            .as_text()
            .map(|s| clean_label(&s))
            .unwrap_or_default();
        if label != self.label_column {
            return Err(SchemaMismatch::MissingLabelColumn {
                row: header_row,
                expected: self.label_column.clone(),
                found: label,
            });
        }

        let code_col = (1..sheet.width())
            .find(|&c| {
                sheet
                    .get(header_row, c)
                    .as_text()
                    .is_some_and(|h| h.trim() == self.code_column)
            })
            .ok_or_else(|| SchemaMismatch::MissingCodeColumn {
                row: header_row,
                expected: self.code_column.clone(),
            })?;

        // columns blank from the header through the last data row carry nothing;
        // notes below the data extent must not widen the frame
        let frame_rows = header_row..needed;
        let value_cols: Vec<usize> = (1..sheet.width())
            .filter(|&c| c != code_col)
            .filter(|&c| frame_rows.clone().any(|r| !sheet.get(r, c).is_empty()))
            .collect();
        let Some(&first) = value_cols.first() else {
            return Err(SchemaMismatch::NoValueColumns { row: header_row });
        };
        if self.is_placeholder(sheet.get(header_row, first).as_text().as_deref()) {
            return Err(SchemaMismatch::LeadingUnlabelledColumn {
                row: header_row,
                col: first,
            });
        }

        let period_row = header_row + 1;
        let frame = SheetFrame {
            header_row,
            period_row,
            category_rows: period_row + 1..header_row + 1 + self.data_rows,
            code_col,
            value_cols,
        };
        debug!(
            code_col = frame.code_col,
            value_cols = frame.value_cols.len(),
            category_rows = frame.category_rows.len(),
            "layout located"
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn t(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    fn layout() -> SheetLayout {
        SheetLayout {
            header_skip: 1,
            data_rows: 2,
            ..SheetLayout::default()
        }
    }

    fn sheet(header: Vec<Cell>) -> RawSheet {
        RawSheet::from_rows(vec![
            vec![t("Table 3")],
            header,
            vec![Cell::Empty, Cell::Empty, t("Q1"), t("Q1")],
            vec![t("Total Taxes"), t("T00"), Cell::Number(1.0), Cell::Number(2.0)],
        ])
    }

    #[test]
    fn test_locate_finds_frame() {
        let s = sheet(vec![t("Tax Description"), t("Code"), t("Ohio"), Cell::Empty]);
        let frame = layout().locate(&s).unwrap();
        assert_eq!(frame.header_row, 1);
        assert_eq!(frame.period_row, 2);
        assert_eq!(frame.category_rows, 3..4);
        assert_eq!(frame.code_col, 1);
        assert_eq!(frame.value_cols, vec![2, 3]);
    }

    #[test]
    fn test_locate_ignores_columns_outside_frame_rows() {
        let s = sheet(vec![t("Tax Description"), t("Code"), t("Ohio"), Cell::Empty]);
        let mut rows: Vec<Vec<Cell>> = (0..s.height()).map(|r| s.row(r).to_vec()).collect();
        rows.push(vec![t("Note"), Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, t("wide")]);
        let s = RawSheet::from_rows(rows);
        assert_eq!(s.width(), 6);

        let frame = layout().locate(&s).unwrap();
        assert_eq!(frame.value_cols, vec![2, 3]);
    }

    #[test]
    fn test_locate_reports_drift() {
        let l = layout();

        let s = sheet(vec![t("Description"), t("Code"), t("Ohio")]);
        assert!(matches!(
            l.locate(&s),
            Err(SchemaMismatch::MissingLabelColumn { row: 1, .. })
        ));

        let s = sheet(vec![t("Tax Description"), t("Item"), t("Ohio")]);
        assert!(matches!(
            l.locate(&s),
            Err(SchemaMismatch::MissingCodeColumn { .. })
        ));

        let s = sheet(vec![t("Tax Description"), t("Code"), t("Unnamed: 2"), t("Ohio")]);
        assert_eq!(
            l.locate(&s),
            Err(SchemaMismatch::LeadingUnlabelledColumn { row: 1, col: 2 })
        );

        let deep = SheetLayout {
            data_rows: 10,
            ..l
        };
        let s = sheet(vec![t("Tax Description"), t("Code"), t("Ohio")]);
        assert_eq!(
            deep.locate(&s),
            Err(SchemaMismatch::TooFewRows {
                needed: 12,
                found: 4
            })
        );
    }

    #[test]
    fn test_markers() {
        let l = SheetLayout::default();
        assert!(l.is_placeholder(None));
        assert!(l.is_placeholder(Some("Unnamed: 7")));
        assert!(!l.is_placeholder(Some("Alabama")));
        assert!(l.is_suppressed(" X "));
        assert!(!l.is_suppressed("0"));
    }
}
