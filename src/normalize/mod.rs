// src/normalize/mod.rs
//! Reshape the wide, hierarchically labelled sheet into the long-form table.

pub mod categories;
pub mod headers;
pub mod values;

use tracing::{debug, info, instrument, warn};

use crate::error::SchemaMismatch;
use crate::schema::SheetLayout;
use crate::sheet::RawSheet;
use crate::table::{RevenueRecord, TaxTable};

pub use categories::{clean_label, resolve_categories, Categories, CATEGORY_SEPARATOR};
pub use headers::{clean_state, forward_fill};
pub use values::{parse_revenue, Revenue};

/// Run every stage: locate, forward-fill, resolve categories, truncate, pivot
/// and unpivot. Records come out value column by value column (left to
/// right), then category row by category row (top to bottom).
#[instrument(level = "info", skip_all, fields(rows = sheet.height(), cols = sheet.width()))]
pub fn normalize(sheet: &RawSheet, layout: &SheetLayout) -> Result<TaxTable, SchemaMismatch> {
    let frame = layout.locate(sheet)?;

    // 1) column labels → state per value column
    let header_cells: Vec<Option<String>> = frame
        .value_cols
        .iter()
        .map(|&c| sheet.get(frame.header_row, c).as_text())
        .collect();
    let filled = forward_fill(header_cells.iter().map(|h| h.as_deref()), layout);

    let mut columns = Vec::with_capacity(frame.value_cols.len());
    for (&col, state) in frame.value_cols.iter().zip(filled) {
        let state = state.map(|s| clean_state(&s)).ok_or(
            SchemaMismatch::LeadingUnlabelledColumn {
                row: frame.header_row,
                col,
            },
        )?;
        let period = sheet
            .get(frame.period_row, col)
            .as_text()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SchemaMismatch::MissingPeriod {
                row: frame.period_row,
                col,
                state: state.clone(),
            })?;
        columns.push((col, state, period));
    }
    debug!(columns = columns.len(), "header forward-fill done");

    // 2) row labels → category keys, within the truncated extent
    let categories = resolve_categories(sheet, frame.category_rows.clone())?;
    debug!(
        categories = categories.rows.len(),
        sections = categories.sections.len(),
        "category hierarchy resolved"
    );

    // 3) unpivot
    let mut records = Vec::with_capacity(columns.len() * categories.rows.len());
    let mut suppressed = 0usize;
    for (col, state, period) in &columns {
        for cat in &categories.rows {
            let revenue = parse_revenue(sheet.get(cat.row, *col), layout, cat.row, *col)?;
            if revenue == Revenue::Suppressed {
                suppressed += 1;
            }
            if let Some(amount) = revenue.amount() {
                records.push(RevenueRecord {
                    state: state.clone(),
                    fiscal_quarter: period.clone(),
                    tax_category: cat.key.clone(),
                    revenue: amount,
                });
            }
        }
    }

    if suppressed > 0 {
        warn!(
            suppressed,
            "suppressed cells coerced to zero; they are indistinguishable from zero revenue"
        );
    }

    let table = TaxTable::from_records(records, categories.sections)?;
    info!(
        records = table.len(),
        states = table.states().len(),
        quarters = table.fiscal_quarters().len(),
        categories = table.tax_categories().len(),
        "normalized"
    );
    Ok(table)
}
