//! Error kinds for configuration, rate fetching, the cache file and conversion.

use thiserror::Error;

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key not found: set the {0} environment variable")]
    MissingApiKey(&'static str),
}

/// Failures talking to the rate provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {status} for {endpoint}")]
    Status {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    /// The provider answered but did not report `"result": "success"`.
    #[error("Provider reported failure for {endpoint}: {reason}")]
    Unsuccessful { endpoint: String, reason: String },

    #[error("Failed to parse JSON response for {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reading or writing the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cache file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cache file holds no rates")]
    Empty,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// Either side of the pair is missing from the rate table.
    #[error("Unsupported currency")]
    UnsupportedCurrency,
}
