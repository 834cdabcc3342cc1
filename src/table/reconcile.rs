use serde::Serialize;
use std::collections::HashMap;

use super::TaxTable;
use crate::normalize::CATEGORY_SEPARATOR;

/// A `(state, quarter)` whose total row disagrees with its top-level parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub state: String,
    pub fiscal_quarter: String,
    pub total: f64,
    pub components: f64,
}

impl Discrepancy {
    pub fn difference(&self) -> f64 {
        self.total - self.components
    }
}

/// Which rows add up to a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Components {
    /// Plain categories only; `parent|child` rows are left out.
    TopLevel,
    /// Every non-total row. Section headers carry no values, so this is the
    /// top-level rows plus the composite children.
    Leaves,
}

impl Components {
    fn includes(self, tax_category: &str) -> bool {
        match self {
            Components::TopLevel => !tax_category.contains(CATEGORY_SEPARATOR),
            Components::Leaves => true,
        }
    }
}

/// Compare every total row against the sum of the other top-level categories.
///
/// Composite (`parent|child`) categories are excluded from the sum, and totals
/// with no top-level parts are skipped. Only differences larger than
/// `tolerance` billions are reported, in table order.
pub fn reconcile(table: &TaxTable, total_category: &str, tolerance: f64) -> Vec<Discrepancy> {
    reconcile_with(table, total_category, tolerance, Components::TopLevel)
}

/// Like [`reconcile`], summing every non-total row including sectioned ones.
pub fn reconcile_leaves(table: &TaxTable, total_category: &str, tolerance: f64) -> Vec<Discrepancy> {
    reconcile_with(table, total_category, tolerance, Components::Leaves)
}

pub fn reconcile_with(
    table: &TaxTable,
    total_category: &str,
    tolerance: f64,
    components: Components,
) -> Vec<Discrepancy> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut totals: HashMap<(String, String), f64> = HashMap::new();
    let mut parts: HashMap<(String, String), f64> = HashMap::new();

    for r in table.records() {
        let key = (r.state, r.fiscal_quarter);
        if r.tax_category == total_category {
            order.push(key.clone());
            totals.insert(key, r.revenue);
        } else if components.includes(&r.tax_category) {
            *parts.entry(key).or_insert(0.0) += r.revenue;
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let total = totals[&key];
            let components = *parts.get(&key)?;
            ((total - components).abs() > tolerance).then(|| Discrepancy {
                state: key.0,
                fiscal_quarter: key.1,
                total,
                components,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{rec, sample_table};

    #[test]
    fn test_sample_reconciles() {
        assert!(reconcile(&sample_table(), "Total Taxes", 1e-9).is_empty());
    }

    #[test]
    fn test_reports_mismatch_and_ignores_composites() {
        let table = TaxTable::from_records(
            vec![
                rec("Ohio", "Q3", "Total Taxes", 2.0),
                rec("Ohio", "Q3", "Property taxes", 0.5),
                rec("Ohio", "Q3", "License taxes|Motor vehicles", 0.7),
                rec("Utah", "Q3", "Total Taxes", 1.0),
                rec("Utah", "Q3", "Property taxes", 1.0),
            ],
            vec!["License taxes".into()],
        )
        .unwrap();

        let found = reconcile(&table, "Total Taxes", 0.01);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].state, "Ohio");
        assert!((found[0].difference() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_leaves_include_sectioned_categories() {
        let table = TaxTable::from_records(
            vec![
                rec("Ohio", "Q3", "Total Taxes", 1.2),
                rec("Ohio", "Q3", "Property taxes", 0.5),
                rec("Ohio", "Q3", "License taxes|Motor vehicles", 0.7),
                // sectioned only: no top-level part at all
                rec("Utah", "Q3", "Total Taxes", 0.4),
                rec("Utah", "Q3", "Sales taxes|Motor fuels", 0.4),
            ],
            vec!["License taxes".into(), "Sales taxes".into()],
        )
        .unwrap();

        assert!(reconcile_leaves(&table, "Total Taxes", 1e-9).is_empty());

        let top = reconcile(&table, "Total Taxes", 1e-9);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].state, "Ohio");
        assert!((top[0].difference() - 0.7).abs() < 1e-12);
    }
}
