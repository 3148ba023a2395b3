//! Core business logic abstractions

pub mod config;
pub mod convert;
pub mod error;
pub mod log;
pub mod provider;
pub mod rates;

// Re-export main types for cleaner imports
pub use convert::ConversionEngine;
pub use error::{CacheError, ConfigError, ConversionError, FetchError, StoreError};
pub use provider::RateProvider;
pub use rates::{CacheRecord, PIVOT_CURRENCY, RateSource, RateTable, SupportedCurrency};
