pub mod disk;

use crate::core::convert::ConversionEngine;
use crate::core::error::{CacheError, StoreError};
use crate::core::provider::RateProvider;
use crate::core::rates::{
    CacheRecord, PIVOT_CURRENCY, RateSource, RateTable, SupportedCurrency, now_timestamp,
};
use chrono::NaiveDateTime;
use disk::CacheFile;
use futures::future::try_join;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Outcome of a manual refresh, displayed to the user as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshReport {
    Updated { currencies: usize },
    /// New rates are in use but could not be written to the cache file.
    UpdatedUnsaved { currencies: usize, reason: String },
    KeptPrevious { reason: String },
}

impl Display for RefreshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshReport::Updated { currencies } => {
                write!(f, "Rates updated from the provider ({currencies} currencies).")
            }
            RefreshReport::UpdatedUnsaved { currencies, reason } => write!(
                f,
                "Rates updated from the provider ({currencies} currencies), but the cache could not be saved ({reason})."
            ),
            RefreshReport::KeptPrevious { reason } => write!(
                f,
                "Failed to update rates ({reason}). Using the last available rates."
            ),
        }
    }
}

/// Owns the current rate table and keeps it in sync with the cache file and provider.
pub struct RateStore<P: RateProvider> {
    provider: P,
    cache: CacheFile,
    rates: RateTable,
    last_update: Option<NaiveDateTime>,
    supported: Vec<SupportedCurrency>,
    source: Option<RateSource>,
}

impl<P: RateProvider> RateStore<P> {
    /// Creates a store with an empty table; call [`RateStore::initialize`] before use.
    pub fn new(provider: P, cache: CacheFile) -> Self {
        Self {
            provider,
            cache,
            rates: RateTable::new(),
            last_update: None,
            supported: Vec::new(),
            source: None,
        }
    }

    /// Populates the table from a fresh cache, the provider, or the built-in defaults.
    ///
    /// Never fails: every error degrades to the next source down the list.
    pub async fn initialize(&mut self) -> RateSource {
        match self.cache.load() {
            Ok(Some(record)) => {
                let now = now_timestamp();
                if record.is_fresh(now) {
                    info!(
                        last_update = %record.last_update,
                        "Using cached rates"
                    );
                    self.rates = record.rates;
                    self.last_update = Some(record.last_update);
                    self.source = Some(RateSource::Cache);
                    return RateSource::Cache;
                }
                info!(
                    age_days = record.age_in_days(now),
                    "Cached rates are stale, fetching"
                );
            }
            Ok(None) => debug!("No cached rates, fetching"),
            Err(e) => warn!(error = %e, "Ignoring unreadable cache file"),
        }

        match self.fetch_latest().await {
            Ok(()) => RateSource::Provider,
            Err(StoreError::Cache(_)) => {
                // Fetched rates are already adopted; only the cache write failed.
                RateSource::Provider
            }
            Err(StoreError::Fetch(_)) => {
                warn!("Falling back to built-in default rates");
                self.use_defaults();
                RateSource::Default
            }
        }
    }

    /// Fetches supported codes and the latest pivot rates, adopts them and persists.
    pub async fn fetch_latest(&mut self) -> Result<(), StoreError> {
        let (supported, rates) = try_join(
            self.provider.supported_codes(),
            self.provider.latest_rates(PIVOT_CURRENCY),
        )
        .await
        .inspect_err(|e| warn!(error = %e, "Failed to fetch latest rates"))?;

        info!(
            currencies = rates.len(),
            supported = supported.len(),
            "Fetched latest rates"
        );
        self.supported = supported;
        self.rates = rates;
        self.last_update = Some(now_timestamp());
        self.source = Some(RateSource::Provider);

        self.persist()
            .inspect_err(|e| warn!(error = %e, "Failed to write cache file"))?;
        Ok(())
    }

    /// Writes the current table and timestamp to the cache file.
    pub fn persist(&self) -> Result<(), CacheError> {
        let record = CacheRecord {
            rates: self.rates.clone(),
            last_update: self.last_update.unwrap_or_else(now_timestamp),
        };
        self.cache.save(&record)
    }

    /// Manual refresh; on failure the current table stays in effect.
    pub async fn refresh(&mut self) -> RefreshReport {
        match self.fetch_latest().await {
            Ok(()) => RefreshReport::Updated {
                currencies: self.rates.len(),
            },
            Err(StoreError::Cache(e)) => RefreshReport::UpdatedUnsaved {
                currencies: self.rates.len(),
                reason: e.to_string(),
            },
            Err(e @ StoreError::Fetch(_)) => RefreshReport::KeptPrevious {
                reason: e.to_string(),
            },
        }
    }

    fn use_defaults(&mut self) {
        self.rates = RateTable::defaults();
        self.last_update = Some(now_timestamp());
        self.source = Some(RateSource::Default);
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn engine(&self) -> ConversionEngine<'_> {
        ConversionEngine::new(&self.rates)
    }

    pub fn last_update(&self) -> Option<NaiveDateTime> {
        self.last_update
    }

    pub fn source(&self) -> Option<RateSource> {
        self.source
    }

    /// Provider's currency list from the last successful fetch, empty otherwise.
    /// Informational only: conversions are checked against the rate table.
    pub fn supported_currencies(&self) -> &[SupportedCurrency] {
        &self.supported
    }

    pub fn cache(&self) -> &CacheFile {
        &self.cache
    }
}
