//! Runtime configuration. Layered per spec.md §3 authority ordering:
//! process flags / environment variables take precedence over the `settings`
//! table, which takes precedence over these defaults. `docsis-controller`
//! resolves flags and env vars via `clap`, then overlays persisted
//! `settings` rows with [`Settings::apply_persisted`] once at startup.
//! Persisted rows are not re-read while the process is running: changing a
//! value through the management API takes effect on the next restart.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Setting;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub discovery_interval_secs: u64,
    pub rule_evaluation_interval_secs: u64,
    pub job_dispatch_interval_secs: u64,
    pub cleanup_interval_secs: u64,

    pub discovery_workers: usize,
    pub discovery_rate_limit_per_sec: u32,

    pub max_concurrent_jobs_per_cmts: usize,
    pub job_max_retries: i64,
    pub job_timeout_secs: i64,
    pub job_backoff_base_secs: i64,
    pub job_backoff_cap_secs: i64,

    /// `STALE_OFFLINE_THRESHOLD`: minutes unseen before a modem is marked `OFFLINE`.
    pub modem_offline_after_mins: i64,
    /// `STALE_DELETE_THRESHOLD`: days `OFFLINE` before a modem row is deleted.
    pub modem_delete_after_days: i64,

    /// Minimum acceptable downstream signal level (dBmV) for upgrade eligibility.
    pub signal_level_min_dbmv: f64,
    /// Maximum acceptable downstream signal level (dBmV) for upgrade eligibility.
    pub signal_level_max_dbmv: f64,

    pub snmp_timeout_secs: u64,
    pub snmp_retries: u32,
    pub snmp_max_oids_per_request: u32,

    pub http_bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_interval_secs: 300,
            rule_evaluation_interval_secs: 60,
            job_dispatch_interval_secs: 5,
            cleanup_interval_secs: 3600,

            discovery_workers: 8,
            discovery_rate_limit_per_sec: 20,

            max_concurrent_jobs_per_cmts: 4,
            job_max_retries: 3,
            job_timeout_secs: 600,
            job_backoff_base_secs: 30,
            job_backoff_cap_secs: 300,

            modem_offline_after_mins: 10,
            modem_delete_after_days: 7,

            signal_level_min_dbmv: -15.0,
            signal_level_max_dbmv: 15.0,

            snmp_timeout_secs: 10,
            snmp_retries: 3,
            snmp_max_oids_per_request: 60,

            http_bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Settings {
    /// `min(base * 2^(attempt-1), cap)`, the exponential backoff formula
    /// from spec.md §4.5. `attempt` is 1-indexed (the first retry is
    /// attempt 1).
    pub fn backoff_secs(&self, attempt: i64) -> i64 {
        if attempt <= 0 {
            return 0;
        }
        let scaled = self.job_backoff_base_secs.saturating_mul(1i64 << (attempt - 1).min(32));
        scaled.min(self.job_backoff_cap_secs)
    }

    /// Overlays the recognized `settings` table keys from spec.md §6 onto
    /// `self`. Called once at startup, after defaults and before any
    /// process-flag/env override, per the authority ordering above. Unknown
    /// keys are ignored; malformed values are logged and left at whatever
    /// was already resolved.
    pub fn apply_persisted(&mut self, rows: &[Setting]) {
        for row in rows {
            match row.key.as_str() {
                "workers" => self.apply_parsed(&row.key, &row.value, |s, v| s.discovery_workers = v),
                "poll_interval" => self.apply_parsed(&row.key, &row.value, |s, v| s.job_dispatch_interval_secs = v),
                "discovery_interval" => self.apply_parsed(&row.key, &row.value, |s, v| s.discovery_interval_secs = v),
                "evaluation_interval" => self.apply_parsed(&row.key, &row.value, |s, v| s.rule_evaluation_interval_secs = v),
                "job_timeout" => self.apply_parsed(&row.key, &row.value, |s, v| s.job_timeout_secs = v),
                "retry_attempts" => self.apply_parsed(&row.key, &row.value, |s, v| s.job_max_retries = v),
                "signal_level_min" => self.apply_parsed(&row.key, &row.value, |s, v| s.signal_level_min_dbmv = v),
                "signal_level_max" => self.apply_parsed(&row.key, &row.value, |s, v| s.signal_level_max_dbmv = v),
                "max_upgrades_per_cmts" => {
                    self.apply_parsed(&row.key, &row.value, |s, v| s.max_concurrent_jobs_per_cmts = v)
                }
                other => warn!(key = other, "ignoring unrecognized settings row"),
            }
        }
    }

    fn apply_parsed<T: std::str::FromStr>(&mut self, key: &str, value: &str, set: impl FnOnce(&mut Self, T)) {
        match value.parse::<T>() {
            Ok(v) => set(self, v),
            Err(_) => warn!(key, value, "failed to parse persisted setting, keeping prior value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let s = Settings::default();
        assert_eq!(s.backoff_secs(1), 30);
        assert_eq!(s.backoff_secs(2), 60);
        assert_eq!(s.backoff_secs(3), 120);
        assert_eq!(s.backoff_secs(4), 240);
        assert_eq!(s.backoff_secs(5), 300); // would be 480, capped at 300
        assert_eq!(s.backoff_secs(10), 300);
    }

    #[test]
    fn apply_persisted_overlays_recognized_keys() {
        let mut s = Settings::default();
        let rows = vec![
            Setting { key: "workers".into(), value: "16".into(), updated_at: 0 },
            Setting { key: "discovery_interval".into(), value: "120".into(), updated_at: 0 },
            Setting { key: "signal_level_min".into(), value: "-20.5".into(), updated_at: 0 },
            Setting { key: "bogus_key".into(), value: "whatever".into(), updated_at: 0 },
            Setting { key: "retry_attempts".into(), value: "not-a-number".into(), updated_at: 0 },
        ];
        s.apply_persisted(&rows);
        assert_eq!(s.discovery_workers, 16);
        assert_eq!(s.discovery_interval_secs, 120);
        assert_eq!(s.signal_level_min_dbmv, -20.5);
        // unrecognized key and malformed value are both ignored, not fatal
        assert_eq!(s.job_max_retries, Settings::default().job_max_retries);
    }
}
