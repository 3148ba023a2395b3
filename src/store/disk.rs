use crate::core::error::CacheError;
use crate::core::rates::CacheRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file holding the last fetched rate table.
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Reads the record, `Ok(None)` when there is no file yet.
    pub fn load(&self) -> Result<Option<CacheRecord>, CacheError> {
        if !self.path.exists() {
            debug!("Cache MISS: no file at {}", self.path.display());
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let record: CacheRecord = serde_json::from_str(&contents)?;
        if record.rates.is_empty() {
            return Err(CacheError::Empty);
        }
        debug!(
            "Cache HIT: {} rates from {}",
            record.rates.len(),
            record.last_update
        );
        Ok(Some(record))
    }

    /// Overwrites the file with `record`, creating parent directories as needed.
    pub fn save(&self, record: &CacheRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, contents)?;
        debug!("Cache PUT: {}", self.path.display());
        Ok(())
    }
}
