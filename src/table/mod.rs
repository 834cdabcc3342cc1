// src/table/mod.rs
//! The normalized long-form table and its read-only query interface.

pub mod reconcile;

use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    sync::Arc,
};

use crate::error::SchemaMismatch;

pub use reconcile::{reconcile, reconcile_leaves, reconcile_with, Components, Discrepancy};

/// One normalized observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub state: String,
    pub fiscal_quarter: String,
    pub tax_category: String,
    /// Billions of dollars.
    pub revenue: f64,
}

/// A query result row; the quarter is implied by the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub state: String,
    pub tax_category: String,
    pub revenue: f64,
}

/// Typed exact-match filter over the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueQuery {
    pub fiscal_quarter: String,
    pub state: Option<String>,
    pub tax_category: Option<String>,
}

impl RevenueQuery {
    pub fn quarter(fiscal_quarter: impl Into<String>) -> Self {
        Self {
            fiscal_quarter: fiscal_quarter.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_category(mut self, tax_category: impl Into<String>) -> Self {
        self.tax_category = Some(tax_category.into());
        self
    }
}

/// Immutable columnar table of `(state, fiscal_quarter, tax_category, revenue)`.
#[derive(Debug, Clone)]
pub struct TaxTable {
    state: StringArray,
    fiscal_quarter: StringArray,
    tax_category: StringArray,
    revenue: Float64Array,
    states: Vec<String>,
    fiscal_quarters: Vec<String>,
    tax_categories: Vec<String>,
    sections: Vec<String>,
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

impl TaxTable {
    /// Build the table, rejecting duplicate `(state, quarter, category)` triples.
    pub fn from_records(
        records: Vec<RevenueRecord>,
        sections: Vec<String>,
    ) -> Result<Self, SchemaMismatch> {
        let mut keys = HashSet::with_capacity(records.len());
        for r in &records {
            if !keys.insert((&r.state, &r.fiscal_quarter, &r.tax_category)) {
                return Err(SchemaMismatch::DuplicateRecord {
                    state: r.state.clone(),
                    fiscal_quarter: r.fiscal_quarter.clone(),
                    tax_category: r.tax_category.clone(),
                });
            }
        }

        let states = first_seen(records.iter().map(|r| r.state.as_str()));
        let fiscal_quarters = first_seen(records.iter().map(|r| r.fiscal_quarter.as_str()));
        let tax_categories = first_seen(records.iter().map(|r| r.tax_category.as_str()));

        Ok(Self {
            state: records.iter().map(|r| Some(r.state.as_str())).collect(),
            fiscal_quarter: records
                .iter()
                .map(|r| Some(r.fiscal_quarter.as_str()))
                .collect(),
            tax_category: records
                .iter()
                .map(|r| Some(r.tax_category.as_str()))
                .collect(),
            revenue: records.iter().map(|r| Some(r.revenue)).collect(),
            states,
            fiscal_quarters,
            tax_categories,
            sections,
        })
    }

    pub fn schema() -> Schema {
        Schema::new(vec![
            Field::new("state", DataType::Utf8, false),
            Field::new("fiscal_quarter", DataType::Utf8, false),
            Field::new("tax_category", DataType::Utf8, false),
            Field::new("revenue", DataType::Float64, false),
        ])
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        RecordBatch::try_new(
            Arc::new(Self::schema()),
            vec![
                Arc::new(self.state.clone()) as ArrayRef,
                Arc::new(self.fiscal_quarter.clone()) as ArrayRef,
                Arc::new(self.tax_category.clone()) as ArrayRef,
                Arc::new(self.revenue.clone()) as ArrayRef,
            ],
        )
    }

    pub fn len(&self) -> usize {
        self.revenue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unique states, first-seen order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn fiscal_quarters(&self) -> &[String] {
        &self.fiscal_quarters
    }

    pub fn tax_categories(&self) -> &[String] {
        &self.tax_categories
    }

    /// Section headers that parented composite categories.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn record(&self, idx: usize) -> RevenueRecord {
        RevenueRecord {
            state: self.state.value(idx).to_string(),
            fiscal_quarter: self.fiscal_quarter.value(idx).to_string(),
            tax_category: self.tax_category.value(idx).to_string(),
            revenue: self.revenue.value(idx),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = RevenueRecord> + '_ {
        (0..self.len()).map(move |i| self.record(i))
    }

    fn matches(&self, idx: usize, q: &RevenueQuery) -> bool {
        self.fiscal_quarter.value(idx) == q.fiscal_quarter
            && q.state.as_deref().map_or(true, |s| self.state.value(idx) == s)
            && q
                .tax_category
                .as_deref()
                .map_or(true, |c| self.tax_category.value(idx) == c)
    }

    /// Rows matching every provided filter, in table order.
    pub fn query(&self, q: &RevenueQuery) -> Vec<RevenueRow> {
        (0..self.len())
            .filter(|&i| self.matches(i, q))
            .map(|i| RevenueRow {
                state: self.state.value(i).to_string(),
                tax_category: self.tax_category.value(i).to_string(),
                revenue: self.revenue.value(i),
            })
            .collect()
    }

    pub fn value(&self, state: &str, fiscal_quarter: &str, tax_category: &str) -> Option<f64> {
        (0..self.len())
            .find(|&i| {
                self.state.value(i) == state
                    && self.fiscal_quarter.value(i) == fiscal_quarter
                    && self.tax_category.value(i) == tax_category
            })
            .map(|i| self.revenue.value(i))
    }
}
