// src/fetch/mod.rs

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::config::FetchPolicy;
use crate::error::LoadError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// xlsx/xlsb/ods are ZIP containers, legacy xls is OLE2.
pub fn looks_like_spreadsheet(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC)
}

async fn get_bytes_core(client: &Client, url: &str, policy: &FetchPolicy) -> Result<Vec<u8>, LoadError> {
    debug!("Fetching workbook from {}", url);
    let resp = client
        .get(url)
        .timeout(std::time::Duration::from_secs(policy.timeout_secs))
        .send()
        .await
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = resp.bytes().await.map_err(|source| LoadError::Fetch {
        url: url.to_string(),
        source,
    })?;
    Ok(bytes.to_vec())
}

/// Download the workbook, retrying transient failures with exponential backoff.
#[instrument(level = "info", skip(client, policy))]
pub async fn fetch_workbook(
    client: &Client,
    url: &str,
    policy: &FetchPolicy,
) -> Result<Vec<u8>, LoadError> {
    let mut attempts = 0;
    let bytes = loop {
        match get_bytes_core(client, url, policy).await {
            Ok(b) => break b,
            Err(e) if e.is_transient() && attempts < policy.max_retries => {
                attempts += 1;
                let backoff = policy.backoff(attempts);
                warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                sleep(backoff).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Giving up on workbook download");
                return Err(e);
            }
        }
    };

    if !looks_like_spreadsheet(&bytes) {
        return Err(LoadError::NotSpreadsheet {
            url: url.to_string(),
        });
    }
    debug!(bytes = bytes.len(), "workbook downloaded");
    Ok(bytes)
}
