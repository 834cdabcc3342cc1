use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use tracing::trace;

use crate::error::SchemaMismatch;
use crate::sheet::RawSheet;

/// Separator between a section label and its child in a composite key.
pub const CATEGORY_SEPARATOR: char = '|';

static NBSP_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x{a0}{2,}").expect("valid regex"));

/// Drop indentation runs of non-breaking spaces and trim.
pub fn clean_label(raw: &str) -> String {
    NBSP_RUN
        .replace_all(raw, "")
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// A category row that carries data, with its resolved key.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub row: usize,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categories {
    pub rows: Vec<CategoryRow>,
    /// Section headers in the order they were seen.
    pub sections: Vec<String>,
}

/// Walk category rows top to bottom and rebuild the two-level hierarchy.
///
/// A row whose only non-empty cell is the label is a section header: it is
/// remembered and emits nothing. Data rows under an active section become
/// `section|label`. Fully blank rows are skipped without ending the section.
pub fn resolve_categories(
    sheet: &RawSheet,
    rows: Range<usize>,
) -> Result<Categories, SchemaMismatch> {
    let mut out = Categories::default();
    let mut section: Option<String> = None;

    for r in rows {
        let cells = sheet.row(r);
        let label = cells
            .first()
            .and_then(|c| c.as_text())
            .map(|s| clean_label(&s))
            .unwrap_or_default();
        let has_data = cells.iter().skip(1).any(|c| !c.is_empty());

        if label.contains(CATEGORY_SEPARATOR) {
            return Err(SchemaMismatch::NestedSection { row: r, label });
        }

        match (label.is_empty(), has_data) {
            (true, false) => {
                trace!(row = r, "blank row");
            }
            (true, true) => return Err(SchemaMismatch::MissingCategoryLabel { row: r }),
            (false, false) => {
                trace!(row = r, section = %label, "section header");
                if !out.sections.contains(&label) {
                    out.sections.push(label.clone());
                }
                section = Some(label);
            }
            (false, true) => {
                let key = match &section {
                    Some(parent) => format!("{parent}{CATEGORY_SEPARATOR}{label}"),
                    None => label,
                };
                out.rows.push(CategoryRow { row: r, key });
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn t(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("\u{a0}\u{a0}\u{a0}\u{a0}Motor fuels "), "Motor fuels");
        assert_eq!(clean_label("Other\u{a0}taxes"), "Other taxes");
        assert_eq!(clean_label("  Total Taxes"), "Total Taxes");
    }

    #[test]
    fn test_resolve_categories_builds_composites() {
        let sheet = RawSheet::from_rows(vec![
            vec![t("Total Taxes"), t("T00"), Cell::Number(10.0)],
            vec![t("License taxes"), Cell::Empty, Cell::Empty],
            vec![t("\u{a0}\u{a0}\u{a0}\u{a0}Motor vehicles"), t("T24"), Cell::Number(3.0)],
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
            vec![t("\u{a0}\u{a0}\u{a0}\u{a0}Hunting and fishing"), t("T26"), t("X")],
        ]);
        let cats = resolve_categories(&sheet, 0..5).unwrap();
        assert_eq!(cats.sections, vec!["License taxes".to_string()]);
        let keys: Vec<_> = cats.rows.iter().map(|c| (c.row, c.key.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (0, "Total Taxes"),
                (2, "License taxes|Motor vehicles"),
                (4, "License taxes|Hunting and fishing"),
            ]
        );
        // every composite parent was seen as a section header
        for row in &cats.rows {
            if let Some((parent, _)) = row.key.split_once(CATEGORY_SEPARATOR) {
                assert!(cats.sections.iter().any(|s| s == parent));
            }
        }
    }

    #[test]
    fn test_resolve_categories_rejects_bad_rows() {
        let sheet = RawSheet::from_rows(vec![vec![Cell::Empty, Cell::Number(1.0)]]);
        assert_eq!(
            resolve_categories(&sheet, 0..1),
            Err(SchemaMismatch::MissingCategoryLabel { row: 0 })
        );

        let sheet = RawSheet::from_rows(vec![vec![t("a|b"), Cell::Number(1.0)]]);
        assert!(matches!(
            resolve_categories(&sheet, 0..1),
            Err(SchemaMismatch::NestedSection { row: 0, .. })
        ));
    }
}
