//! Rate provider abstraction

use crate::core::error::FetchError;
use crate::core::rates::{RateTable, SupportedCurrency};
use async_trait::async_trait;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Currencies the provider can quote.
    async fn supported_codes(&self) -> Result<Vec<SupportedCurrency>, FetchError>;

    /// Latest rates of every supported currency against `base`.
    async fn latest_rates(&self, base: &str) -> Result<RateTable, FetchError>;
}
