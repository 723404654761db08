use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use super::table::Table;
use crate::config::SheetsConfig;
use crate::metrics;

/// Failure to obtain one sheet. No retry is attempted.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request for sheet '{sheet}' failed: {source}")]
    Http {
        sheet: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("sheet '{sheet}' returned HTTP {status}")]
    Status { sheet: String, status: u16 },
    #[error("sheet '{sheet}' is not valid CSV: {source}")]
    Csv {
        sheet: String,
        #[source]
        source: csv::Error,
    },
}

/// Where raw sheets come from
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Table, RetrievalError>;
}

#[async_trait]
impl<T: SheetSource + ?Sized> SheetSource for Arc<T> {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Table, RetrievalError> {
        (**self).fetch_sheet(sheet).await
    }
}

/// Downloads sheets through the spreadsheet CSV export endpoint
pub struct GoogleSheetsFetcher {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    timeout: Duration,
}

impl GoogleSheetsFetcher {
    pub fn new(client: Client, config: &SheetsConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// CSV export URL of `sheet`, with the sheet name percent-encoded
    pub fn sheet_url(&self, sheet: &str) -> String {
        format!(
            "{}/{}/gviz/tq?tqx=out:csv&sheet={}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(sheet)
        )
    }

    async fn download(&self, sheet: &str) -> Result<String, RetrievalError> {
        let url = self.sheet_url(sheet);
        debug!(sheet = %sheet, url = %url, "Downloading sheet");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| RetrievalError::Http {
                sheet: sheet.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(RetrievalError::Status {
                sheet: sheet.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| RetrievalError::Http {
            sheet: sheet.to_string(),
            source,
        })
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsFetcher {
    async fn fetch_sheet(&self, sheet: &str) -> Result<Table, RetrievalError> {
        let start = Instant::now();

        let result = self.download(sheet).await.and_then(|content| {
            Table::from_csv(&content).map_err(|source| RetrievalError::Csv {
                sheet: sheet.to_string(),
                source,
            })
        });

        match &result {
            Ok(table) => {
                debug!(
                    sheet = %sheet,
                    rows = table.len(),
                    columns = table.columns().len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Sheet loaded"
                );
                metrics::record_sheet_fetch(sheet, "ok", start.elapsed());
            }
            Err(e) => {
                warn!(sheet = %sheet, error = %e, "Sheet retrieval failed");
                metrics::record_sheet_fetch(sheet, "error", start.elapsed());
            }
        }

        result
    }
}
