use thiserror::Error;

/// Structural drift between the published workbook and the layout we expect.
///
/// Row and column numbers are absolute, zero-based sheet coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaMismatch {
    #[error("sheet has {found} rows, layout needs at least {needed} (header skip + header + data rows)")]
    TooFewRows { needed: usize, found: usize },
    #[error("header row {row}: expected label column `{expected}` in column 0, found `{found}`")]
    MissingLabelColumn {
        row: usize,
        expected: String,
        found: String,
    },
    #[error("header row {row}: code column `{expected}` not found")]
    MissingCodeColumn { row: usize, expected: String },
    #[error("header row {row}: no value columns after the label and code columns")]
    NoValueColumns { row: usize },
    #[error("header row {row}, column {col}: first value column has no label to forward-fill from")]
    LeadingUnlabelledColumn { row: usize, col: usize },
    #[error("period row {row}, column {col}: missing fiscal period for `{state}`")]
    MissingPeriod {
        row: usize,
        col: usize,
        state: String,
    },
    #[error("row {row}, column {col}: `{value}` is neither numeric nor a suppression marker")]
    NonNumericCell {
        row: usize,
        col: usize,
        value: String,
    },
    #[error("duplicate record for ({state}, {fiscal_quarter}, {tax_category})")]
    DuplicateRecord {
        state: String,
        fiscal_quarter: String,
        tax_category: String,
    },
    #[error("row {row}: data row has no tax description")]
    MissingCategoryLabel { row: usize },
    #[error("row {row}: category `{label}` would nest deeper than two levels")]
    NestedSection { row: usize, label: String },
}

/// Everything that can abort a table load. There is no partial-result mode.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("GET {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} did not return a spreadsheet")]
    NotSpreadsheet { url: String },
    #[error("reading workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no worksheets")]
    EmptyWorkbook,
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),
    #[error("normalizer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// Transport failures and 5xx/429 responses are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            LoadError::Fetch { source, .. } => !source.is_builder() && !source.is_redirect(),
            LoadError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
