//! Usage ledger
//!
//! Tracks per-model token and request consumption so routing can honor
//! daily budgets and rate limits. Persisted to `model_usage.json` and
//! reloaded on startup; counters roll over at the UTC day boundary.

use crate::config::ModelConfig;
use crate::error::ModelError;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// Consumption record for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    /// UTC day the counters belong to
    pub day: NaiveDate,
    /// Tokens consumed today
    pub tokens: u64,
    /// Requests made today
    pub requests: u64,
    /// Request timestamps inside the sliding minute window
    #[serde(skip)]
    pub minute_window: VecDeque<DateTime<Utc>>,
    /// Back-off marker set when the provider returns a rate limit
    #[serde(skip)]
    pub saturated_until: Option<DateTime<Utc>>,
}

impl ModelUsage {
    fn fresh(day: NaiveDate) -> Self {
        Self {
            day,
            tokens: 0,
            requests: 0,
            minute_window: VecDeque::new(),
            saturated_until: None,
        }
    }
}

/// Persisted + in-memory usage ledger
#[derive(Debug)]
pub struct UsageLedger {
    path: PathBuf,
    usage: DashMap<String, ModelUsage>,
}

impl UsageLedger {
    /// Load the ledger, tolerating an absent or corrupt file
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let usage = DashMap::new();

        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, ModelUsage>>(&raw) {
                Ok(entries) => {
                    for (name, entry) in entries {
                        usage.insert(name, entry);
                    }
                }
                Err(e) => {
                    tracing::warn!("usage ledger corrupt, starting fresh: {}", e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("usage ledger unreadable, starting fresh: {}", e);
            }
        }

        Self { path, usage }
    }

    /// Persist the ledger atomically (write temp, then rename)
    pub fn save(&self) -> Result<(), ModelError> {
        let snapshot: HashMap<String, ModelUsage> = self
            .usage
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| ModelError::Ledger(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModelError::Ledger(e.to_string()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ModelError::Ledger(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ModelError::Ledger(e.to_string()))?;

        Ok(())
    }

    /// Record a completed request
    pub fn record(&self, model: &str, tokens: u64, now: DateTime<Utc>) {
        let mut entry = self
            .usage
            .entry(model.to_string())
            .or_insert_with(|| ModelUsage::fresh(now.date_naive()));

        Self::roll_day(&mut entry, now);
        entry.tokens += tokens;
        entry.requests += 1;
        entry.minute_window.push_back(now);
        Self::trim_window(&mut entry, now);
    }

    /// Mark a model saturated until the next minute
    pub fn saturate(&self, model: &str, now: DateTime<Utc>) {
        let mut entry = self
            .usage
            .entry(model.to_string())
            .or_insert_with(|| ModelUsage::fresh(now.date_naive()));
        entry.saturated_until = Some(now + chrono::Duration::seconds(60));
    }

    /// Whether the model may take another request
    #[must_use]
    pub fn within_limits(&self, config: &ModelConfig, now: DateTime<Utc>) -> bool {
        let Some(mut entry) = self.usage.get_mut(&config.name) else {
            return true;
        };

        Self::roll_day(&mut entry, now);
        Self::trim_window(&mut entry, now);

        if let Some(until) = entry.saturated_until {
            if now < until {
                return false;
            }
            entry.saturated_until = None;
        }

        entry.tokens < config.daily_token_limit
            && (entry.minute_window.len() as u32) < config.rpm_limit
    }

    /// Tokens consumed today by a model
    #[must_use]
    pub fn tokens_today(&self, model: &str) -> u64 {
        self.usage.get(model).map(|e| e.tokens).unwrap_or(0)
    }

    fn roll_day(entry: &mut ModelUsage, now: DateTime<Utc>) {
        let today = now.date_naive();
        if entry.day != today {
            *entry = ModelUsage::fresh(today);
        }
    }

    fn trim_window(entry: &mut ModelUsage, now: DateTime<Utc>) {
        let cutoff = now - chrono::Duration::seconds(60);
        while entry
            .minute_window
            .front()
            .is_some_and(|t| *t < cutoff)
        {
            entry.minute_window.pop_front();
        }
    }

    /// Ledger file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config(daily: u64, rpm: u32) -> ModelConfig {
        ModelConfig::local("llama2")
            .with_daily_limit(daily)
            .with_rpm_limit(rpm)
    }

    #[test]
    fn fresh_model_within_limits() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::load(dir.path().join("usage.json"));

        assert!(ledger.within_limits(&test_config(1000, 60), Utc::now()));
    }

    #[test]
    fn daily_token_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::load(dir.path().join("usage.json"));
        let config = test_config(100, 60);
        let now = Utc::now();

        ledger.record(&config.name, 100, now);
        assert!(!ledger.within_limits(&config, now));
    }

    #[test]
    fn rpm_limit_enforced_and_window_slides() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::load(dir.path().join("usage.json"));
        let config = test_config(1_000_000, 2);
        let t0 = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();

        ledger.record(&config.name, 10, t0);
        ledger.record(&config.name, 10, t0 + chrono::Duration::seconds(1));
        assert!(!ledger.within_limits(&config, t0 + chrono::Duration::seconds(2)));

        // Two minutes later the window is empty again
        assert!(ledger.within_limits(&config, t0 + chrono::Duration::seconds(120)));
    }

    #[test]
    fn counters_roll_at_day_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::load(dir.path().join("usage.json"));
        let config = test_config(100, 60);
        let day1 = Utc.with_ymd_and_hms(2026, 8, 7, 23, 59, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 8, 8, 0, 1, 0).unwrap();

        ledger.record(&config.name, 100, day1);
        assert!(!ledger.within_limits(&config, day1));
        assert!(ledger.within_limits(&config, day2));
    }

    #[test]
    fn saturation_expires() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = UsageLedger::load(dir.path().join("usage.json"));
        let config = test_config(1_000_000, 60);
        let now = Utc::now();

        ledger.saturate(&config.name, now);
        assert!(!ledger.within_limits(&config, now));
        assert!(ledger.within_limits(&config, now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn save_and_reload_preserves_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");
        let now = Utc::now();

        let ledger = UsageLedger::load(&path);
        ledger.record("gpt-4o", 500, now);
        ledger.save().unwrap();

        let reloaded = UsageLedger::load(&path);
        assert_eq!(reloaded.tokens_today("gpt-4o"), 500);
    }

    #[test]
    fn corrupt_ledger_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usage.json");
        std::fs::write(&path, "not json {{").unwrap();

        let ledger = UsageLedger::load(&path);
        assert_eq!(ledger.tokens_today("gpt-4o"), 0);
    }
}
