use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::fetcher::{RetrievalError, SheetSource};
use super::normalize::{normalize, normalize_extras};
use super::table::Table;
use crate::config::SheetsConfig;
use crate::error::AppError;
use crate::metrics;

/// The three normalized sheets, always loaded together
#[derive(Debug, Clone, Serialize)]
pub struct PricingTables {
    pub plans: Table,
    pub included: Table,
    pub extras: Table,
    pub loaded_at: DateTime<Utc>,
}

/// Names of the sheets making up one snapshot
#[derive(Debug, Clone)]
pub struct SheetNames {
    pub plans: String,
    pub included: String,
    pub extras: String,
}

impl From<&SheetsConfig> for SheetNames {
    fn from(config: &SheetsConfig) -> Self {
        Self {
            plans: config.plans_sheet.clone(),
            included: config.included_sheet.clone(),
            extras: config.extras_sheet.clone(),
        }
    }
}

struct CacheEntry {
    snapshot: Arc<PricingTables>,
    loaded_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entry: Option<CacheEntry>,
    /// When the last refresh failed; cleared by a successful one
    failed_at: Option<Instant>,
}

/// Single-entry cache of [`PricingTables`].
///
/// A snapshot younger than `ttl` is served as is. Older snapshots trigger a
/// refresh of all three sheets; when that refresh fails, the old snapshot is
/// still served until it is `ttl + max_stale` old. After a failed refresh the
/// stale snapshot is served without fetching again until another `ttl` has
/// passed, so each sheet is fetched at most once per refresh cycle even when
/// many callers are queued behind a slow failure.
pub struct TableCache<S> {
    source: S,
    sheets: SheetNames,
    title_column: String,
    ttl: Duration,
    max_stale: Duration,
    state: RwLock<CacheState>,
}

impl<S: SheetSource> TableCache<S> {
    pub fn new(
        source: S,
        sheets: SheetNames,
        title_column: impl Into<String>,
        ttl: Duration,
        max_stale: Duration,
    ) -> Self {
        Self {
            source,
            sheets,
            title_column: title_column.into(),
            ttl,
            max_stale,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Drop the current snapshot; the next load refetches
    pub async fn invalidate(&self) {
        *self.state.write().await = CacheState::default();
        info!("Pricing tables invalidated");
    }

    /// Current snapshot as of `now`, refreshing it when expired
    pub async fn load(&self, now: Instant) -> Result<Arc<PricingTables>, AppError> {
        {
            let state = self.state.read().await;
            if let Some(snapshot) = self.fresh(state.entry.as_ref(), now) {
                metrics::record_cache_lookup("hit");
                return Ok(snapshot);
            }
        }

        let mut state = self.state.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(snapshot) = self.fresh(state.entry.as_ref(), now) {
            metrics::record_cache_lookup("hit");
            return Ok(snapshot);
        }

        // A recent refresh already failed; keep serving stale until the next cycle
        if let Some(failed_at) = state.failed_at {
            if now < failed_at + self.ttl {
                if let Some(snapshot) = self.stale(state.entry.as_ref(), now) {
                    metrics::record_cache_lookup("stale");
                    return Ok(snapshot);
                }
            }
        }

        match self.fetch_all().await {
            Ok(tables) => {
                metrics::record_cache_lookup("miss");
                info!(
                    plans = tables.plans.len(),
                    included = tables.included.len(),
                    extras = tables.extras.len(),
                    "Pricing tables refreshed"
                );

                let snapshot = Arc::new(tables);
                state.failed_at = None;
                state.entry = Some(CacheEntry {
                    snapshot: snapshot.clone(),
                    loaded_at: now,
                });
                Ok(snapshot)
            }
            Err(e) => {
                metrics::record_error("sheets", "retrieval_error");
                state.failed_at = Some(now);

                match state.entry.as_ref() {
                    Some(stale) if now.saturating_duration_since(stale.loaded_at) < self.ttl + self.max_stale => {
                        metrics::record_cache_lookup("stale");
                        warn!(
                            error = %e,
                            age_secs = now.saturating_duration_since(stale.loaded_at).as_secs(),
                            "Refresh failed, serving stale pricing tables"
                        );
                        Ok(stale.snapshot.clone())
                    }
                    _ => Err(AppError::Retrieval(e)),
                }
            }
        }
    }

    fn fresh(&self, entry: Option<&CacheEntry>, now: Instant) -> Option<Arc<PricingTables>> {
        entry
            .filter(|entry| now.saturating_duration_since(entry.loaded_at) < self.ttl)
            .map(|entry| entry.snapshot.clone())
    }

    fn stale(&self, entry: Option<&CacheEntry>, now: Instant) -> Option<Arc<PricingTables>> {
        entry
            .filter(|entry| now.saturating_duration_since(entry.loaded_at) < self.ttl + self.max_stale)
            .map(|entry| entry.snapshot.clone())
    }

    async fn fetch_all(&self) -> Result<PricingTables, RetrievalError> {
        let (plans, included, extras) = tokio::try_join!(
            self.source.fetch_sheet(&self.sheets.plans),
            self.source.fetch_sheet(&self.sheets.included),
            self.source.fetch_sheet(&self.sheets.extras),
        )?;

        Ok(PricingTables {
            plans: normalize(&plans),
            included: normalize(&included),
            extras: normalize_extras(&extras, &self.title_column),
            loaded_at: Utc::now(),
        })
    }
}
