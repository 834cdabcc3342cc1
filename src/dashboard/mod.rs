//! Two-tab bilingual revenue dashboard served over warp.

pub mod charts;
pub mod page;
pub mod server;

pub use charts::{charts_by_category, charts_by_state, Bar, BarChart};
pub use page::{render_error, render_page};
pub use server::routes;

use serde::{Deserialize, Serialize};

use crate::labels::Locale;
use crate::schema::SheetLayout;
use crate::table::TaxTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// One chart per tax category, states along the axis.
    #[default]
    Category,
    /// One chart per state, tax categories along the axis.
    State,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Category => "category",
            Tab::State => "state",
        }
    }
}

/// What the user picked, parsed from a raw query string.
///
/// Parameters may repeat (`category=a&category=b`). Unknown or malformed
/// values fall back to defaults rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub tab: Tab,
    pub quarter: Option<String>,
    pub categories: Vec<String>,
    pub states: Vec<String>,
    pub locale: Locale,
}

impl Selection {
    pub fn from_query(raw: &str) -> Self {
        let mut sel = Selection::default();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "tab" => {
                    if value.eq_ignore_ascii_case("state") {
                        sel.tab = Tab::State;
                    }
                }
                "quarter" => sel.quarter = Some(value.to_string()),
                "category" => push_unique(&mut sel.categories, value),
                "state" => push_unique(&mut sel.states, value),
                "lang" => sel.locale = Locale::from_param(value).unwrap_or_default(),
                _ => {}
            }
        }
        sel
    }

    /// The selected quarter, or the table's first one.
    pub fn quarter_or_first<'a>(&'a self, table: &'a TaxTable) -> Option<&'a str> {
        self.quarter
            .as_deref()
            .or_else(|| table.fiscal_quarters().first().map(String::as_str))
    }

    /// Charts for the active tab.
    pub fn charts(&self, table: &TaxTable, layout: &SheetLayout) -> Vec<BarChart> {
        let Some(quarter) = self.quarter_or_first(table) else {
            return Vec::new();
        };
        match self.tab {
            Tab::Category => {
                charts_by_category(table, layout, quarter, &self.categories, self.locale)
            }
            Tab::State => charts_by_state(table, layout, quarter, &self.states, self.locale),
        }
    }
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
