// src/load.rs
//! Fetch → read → normalize, as one fallible unit.

use reqwest::Client;
use tracing::{info, instrument};

use crate::config::{FetchPolicy, SourceConfig};
use crate::error::LoadError;
use crate::fetch::fetch_workbook;
use crate::normalize::normalize;
use crate::schema::SheetLayout;
use crate::sheet::read_first_sheet;
use crate::table::TaxTable;

/// Parse workbook bytes and normalize them. CPU-bound; call from a blocking context.
pub fn table_from_bytes(bytes: Vec<u8>, layout: &SheetLayout) -> Result<TaxTable, LoadError> {
    let sheet = read_first_sheet(bytes)?;
    Ok(normalize(&sheet, layout)?)
}

/// Download the source workbook and build the table. Any stage failure is fatal.
#[instrument(level = "info", skip_all, fields(url = %source.url))]
pub async fn load_table(
    client: &Client,
    source: &SourceConfig,
    policy: &FetchPolicy,
) -> Result<TaxTable, LoadError> {
    let start = std::time::Instant::now();
    let bytes = fetch_workbook(client, &source.url, policy).await?;

    // offload parsing + reshaping to the blocking pool
    let layout = source.layout.clone();
    let table = tokio::task::spawn_blocking(move || table_from_bytes(bytes, &layout)).await??;

    info!(records = table.len(), elapsed = ?start.elapsed(), "table loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaMismatch;
    use crate::normalize::tests::{minimal_layout, minimal_sheet, to_xlsx};
    use warp::Filter;

    fn serve_bytes(body: Vec<u8>) -> String {
        let route = warp::path("q3t3.xlsx").map(move || body.clone());
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/q3t3.xlsx", addr)
    }

    #[tokio::test]
    async fn test_load_table_end_to_end() {
        let url = serve_bytes(to_xlsx(&minimal_sheet()));
        let source = SourceConfig {
            url,
            layout: minimal_layout(),
        };
        let table = load_table(&Client::new(), &source, &FetchPolicy::default())
            .await
            .unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.fiscal_quarters(), &["2023 Q3"]);
    }

    #[tokio::test]
    async fn test_layout_drift_fails_load() {
        let url = serve_bytes(to_xlsx(&minimal_sheet()));
        let source = SourceConfig {
            url,
            // one row too deep lands on the period row
            layout: SheetLayout {
                header_skip: 4,
                ..minimal_layout()
            },
        };
        let err = load_table(&Client::new(), &source, &FetchPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::SchemaMismatch(SchemaMismatch::MissingLabelColumn { row: 4, .. })
        ));
    }
}
