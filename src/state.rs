use reqwest::Client;
use std::sync::Arc;

use crate::cache::TableCache;
use crate::config::Settings;
use crate::error::LoadError;
use crate::load::load_table;
use crate::table::TaxTable;

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub client: Client,
    pub cache: Arc<TableCache>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let cache = Arc::new(TableCache::new(settings.cache_ttl));
        Self {
            settings: Arc::new(settings),
            client: Client::new(),
            cache,
        }
    }

    /// The current table, loading it on first access or once stale.
    pub async fn table(&self) -> Result<Arc<TaxTable>, LoadError> {
        let source = &self.settings.source;
        self.cache
            .get_or_load(&source.url, || {
                load_table(&self.client, source, &self.settings.fetch)
            })
            .await
    }
}
