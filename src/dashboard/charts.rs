use serde::{Deserialize, Serialize};

use crate::labels::Locale;
use crate::schema::SheetLayout;
use crate::table::{RevenueQuery, RevenueRow, TaxTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Source label, as stored in the table.
    pub key: String,
    /// Localized label shown on the axis.
    pub label: String,
    pub value: f64,
}

/// Everything the client needs to draw one bar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub bars: Vec<Bar>,
}

fn sorted_desc(mut rows: Vec<RevenueRow>) -> Vec<RevenueRow> {
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    rows
}

/// Tab 1: one chart per selected category, states on the x axis, national
/// total excluded, highest revenue first.
pub fn charts_by_category(
    table: &TaxTable,
    layout: &SheetLayout,
    quarter: &str,
    categories: &[String],
    locale: Locale,
) -> Vec<BarChart> {
    let text = locale.text();
    categories
        .iter()
        .map(|category| {
            let rows = table.query(&RevenueQuery::quarter(quarter).with_category(category.as_str()));
            let bars = sorted_desc(rows)
                .into_iter()
                .filter(|r| r.state != layout.national_total)
                .map(|r| Bar {
                    label: locale.state(&r.state),
                    key: r.state,
                    value: r.revenue,
                })
                .collect();
            BarChart {
                title: format!("{}{}", text.chart_by_category, locale.tax_category(category)),
                x_title: text.state_axis.to_string(),
                y_title: text.revenue_axis.to_string(),
                bars,
            }
        })
        .collect()
}

/// Tab 2: one chart per selected state, tax categories on the x axis, the
/// all-taxes total excluded, highest revenue first.
pub fn charts_by_state(
    table: &TaxTable,
    layout: &SheetLayout,
    quarter: &str,
    states: &[String],
    locale: Locale,
) -> Vec<BarChart> {
    let text = locale.text();
    states
        .iter()
        .map(|state| {
            let rows = table.query(&RevenueQuery::quarter(quarter).with_state(state.as_str()));
            let bars = sorted_desc(rows)
                .into_iter()
                .filter(|r| r.tax_category != layout.total_category)
                .map(|r| Bar {
                    label: locale.tax_category(&r.tax_category),
                    key: r.tax_category,
                    value: r.revenue,
                })
                .collect();
            BarChart {
                title: format!("{}{}", text.chart_by_state, locale.state(state)),
                x_title: text.category_axis.to_string(),
                y_title: text.revenue_axis.to_string(),
                bars,
            }
        })
        .collect()
}
