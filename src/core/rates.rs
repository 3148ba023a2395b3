//! Rate table and cache record types

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Every rate in a [`RateTable`] is expressed against this currency.
pub const PIVOT_CURRENCY: &str = "USD";

/// Format of `last_update` in the cache file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_RATES: [(&str, f64); 6] = [
    ("USD", 1.0),
    ("EUR", 0.93),
    ("IDR", 15600.0),
    ("SGD", 1.35),
    ("MYR", 4.73),
    ("JPY", 150.27),
];

/// Currency code to pivot-relative rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "HashMap<String, f64>")]
pub struct RateTable(HashMap<String, f64>);

impl RateTable {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Built-in table used when neither the cache nor the provider is usable.
    pub fn defaults() -> Self {
        DEFAULT_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect()
    }

    /// Looks up a rate. `code` must already be uppercase.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, rate)| (code.to_uppercase(), rate))
                .collect(),
        )
    }
}

impl TryFrom<HashMap<String, f64>> for RateTable {
    type Error = String;

    /// Uppercases codes and rejects rates that are not finite and positive.
    fn try_from(raw: HashMap<String, f64>) -> Result<Self, Self::Error> {
        if let Some((code, rate)) = raw
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(format!("invalid rate {rate} for {code}"));
        }
        Ok(raw.into_iter().collect())
    }
}

impl From<RateTable> for HashMap<String, f64> {
    fn from(table: RateTable) -> Self {
        table.0
    }
}

/// Current local time truncated to whole seconds, the precision kept in the cache.
pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Persisted form of the rate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub rates: RateTable,
    #[serde(with = "timestamp")]
    pub last_update: NaiveDateTime,
}

impl CacheRecord {
    /// Whole days elapsed since `last_update`, truncated toward zero.
    pub fn age_in_days(&self, now: NaiveDateTime) -> i64 {
        (now - self.last_update).num_days()
    }

    /// A record stays fresh until a full day has elapsed.
    pub fn is_fresh(&self, now: NaiveDateTime) -> bool {
        self.age_in_days(now) < 1
    }
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A currency the provider knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedCurrency {
    pub code: String,
    pub name: String,
}

/// Where the current rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Provider,
    Default,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateSource::Cache => "cache",
                RateSource::Provider => "provider",
                RateSource::Default => "built-in defaults",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record_aged(age: Duration) -> (CacheRecord, NaiveDateTime) {
        let now = now_timestamp();
        (
            CacheRecord {
                rates: RateTable::defaults(),
                last_update: now - age,
            },
            now,
        )
    }

    #[test]
    fn test_default_table_contents() {
        let table = RateTable::defaults();
        assert_eq!(table.len(), 6);
        assert_eq!(table.get("USD"), Some(1.0));
        assert_eq!(table.get("EUR"), Some(0.93));
        assert_eq!(table.get("IDR"), Some(15600.0));
        assert_eq!(table.get("SGD"), Some(1.35));
        assert_eq!(table.get("MYR"), Some(4.73));
        assert_eq!(table.get("JPY"), Some(150.27));
    }

    #[test]
    fn test_table_keys_are_uppercased() {
        let table: RateTable = vec![("eur".to_string(), 0.9)].into_iter().collect();
        assert!(table.contains("EUR"));
        assert!(!table.contains("eur"));
    }

    #[test]
    fn test_freshness_uses_whole_days() {
        let (record, now) = record_aged(Duration::hours(23));
        assert_eq!(record.age_in_days(now), 0);
        assert!(record.is_fresh(now));

        let (record, now) = record_aged(Duration::hours(25));
        assert_eq!(record.age_in_days(now), 1);
        assert!(!record.is_fresh(now));

        let (record, now) = record_aged(Duration::days(3));
        assert!(!record.is_fresh(now));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let (record, now) = record_aged(Duration::hours(-30));
        assert!(record.is_fresh(now));
    }

    #[test]
    fn test_cache_record_json_layout() {
        let record = CacheRecord {
            rates: vec![("USD".to_string(), 1.0)].into_iter().collect(),
            last_update: NaiveDateTime::parse_from_str("2024-03-01 08:15:30", TIMESTAMP_FORMAT)
                .unwrap(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["last_update"], "2024-03-01 08:15:30");
        assert_eq!(value["rates"]["USD"], 1.0);

        let parsed: CacheRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_cached_codes_are_uppercased() {
        let json = r#"{"rates": {"usd": 1.0, "Eur": 0.9}, "last_update": "2024-03-01 08:15:30"}"#;
        let record: CacheRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rates.get("USD"), Some(1.0));
        assert_eq!(record.rates.get("EUR"), Some(0.9));
        assert!(!record.rates.contains("eur"));
    }

    #[test]
    fn test_non_positive_cached_rate_is_rejected() {
        for rate in ["0", "-1.5"] {
            let json = format!(
                r#"{{"rates": {{"USD": 1.0, "EUR": {rate}}}, "last_update": "2024-03-01 08:15:30"}}"#
            );
            let err = serde_json::from_str::<CacheRecord>(&json).unwrap_err();
            assert!(err.to_string().contains("invalid rate"), "{err}");
        }
    }

    #[test]
    fn test_malformed_timestamp_is_rejected() {
        let json = r#"{"rates": {"USD": 1.0}, "last_update": "yesterday"}"#;
        assert!(serde_json::from_str::<CacheRecord>(json).is_err());
    }
}
