pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::ui::{self, StyleType};
use crate::core::config::{self, AppConfig};
use crate::core::rates::RateSource;
use crate::providers::ExchangeRateApiProvider;
use crate::store::{RateStore, disk::CacheFile};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runs the interactive converter on stdin/stdout.
///
/// Fails before touching the network or the cache when the API key is missing.
pub async fn run(config_path: Option<&str>, cache_file: Option<&str>) -> Result<()> {
    let api_key = config::api_key_from_env()?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    run_with(config_path, cache_file, &api_key, &mut input, &mut output).await
}

pub async fn run_with<R: BufRead, W: Write>(
    config_path: Option<&str>,
    cache_file: Option<&str>,
    api_key: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let cache_path = match cache_file {
        Some(path) => PathBuf::from(path),
        None => config.cache_path()?,
    };
    debug!("Using cache file {}", cache_path.display());

    let provider_config = &config.providers.exchangerate;
    let provider = ExchangeRateApiProvider::new(&provider_config.base_url, api_key)?
        .with_retries(provider_config.retries, provider_config.retry_delay_ms);
    let mut store = RateStore::new(provider, CacheFile::new(cache_path));

    let spinner = ui::new_spinner("Loading exchange rates...");
    let source = store.initialize().await;
    spinner.finish_and_clear();
    info!(%source, currencies = store.rates().len(), "Rates ready");

    if source == RateSource::Default {
        writeln!(
            output,
            "{}",
            ui::style_text(
                "Could not fetch current rates, using built-in default rates.",
                StyleType::Error
            )
        )?;
    }

    cli::menu::run_menu(&mut store, input, output).await
}
