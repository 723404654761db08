pub mod catalog;
pub mod chat;
pub mod health;
pub mod metrics_handler;

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    assistant::{ChatBackend, ChatClient, SessionStore},
    config::Config,
    error::AppError,
    sheets::{GoogleSheetsFetcher, PricingTables, SheetNames, SheetSource, TableCache},
};

/// Cache and assistant built from one configuration; replaced as a whole on reload
pub struct Services {
    pub tables: TableCache<Arc<dyn SheetSource>>,
    /// `None` when the assistant is disabled
    pub assistant: Option<Arc<dyn ChatBackend>>,
}

impl Services {
    pub fn new(
        config: &Config,
        source: Arc<dyn SheetSource>,
        assistant: Option<Arc<dyn ChatBackend>>,
    ) -> Self {
        Self {
            tables: TableCache::new(
                source,
                SheetNames::from(&config.sheets),
                config.columns.title.clone(),
                config.sheets.cache_ttl(),
                config.sheets.max_stale(),
            ),
            assistant,
        }
    }

    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let source: Arc<dyn SheetSource> =
            Arc::new(GoogleSheetsFetcher::new(http_client.clone(), &config.sheets));

        let assistant = config.assistant.enabled.then(|| {
            Arc::new(ChatClient::new(http_client, &config.assistant)) as Arc<dyn ChatBackend>
        });

        Self::new(config, source, assistant)
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<Config>>,
    pub services: Arc<ArcSwap<Services>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            services: Arc::new(ArcSwap::from_pointee(services)),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// Current pricing snapshot
    pub async fn tables(&self) -> Result<Arc<PricingTables>, AppError> {
        let services = self.services.load_full();
        services.tables.load(Instant::now()).await
    }
}
