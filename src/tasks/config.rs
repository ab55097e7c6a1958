use std::env;
use std::time::Duration;
use uuid::Uuid;

use crate::store::cache::MAX_TTL;

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn capped_ttl(secs: u64) -> Duration {
    Duration::from_secs(secs).min(MAX_TTL)
}

/// Settings for the task listing cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Key prefix; entries are stored under `{namespace}:{owner_id}`.
    pub namespace: String,
    pub ttl: Duration,
    /// Interval between sweeps of expired in-process entries.
    pub purge_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: "tasks".to_string(),
            ttl: Duration::from_secs(3600),
            purge_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: env_string("TASKS_CACHE_NAMESPACE", &defaults.namespace),
            ttl: capped_ttl(env_u64("TASKS_CACHE_TTL_SECS", defaults.ttl.as_secs())),
            purge_interval: Duration::from_secs(
                env_u64(
                    "TASKS_CACHE_PURGE_INTERVAL_SECS",
                    defaults.purge_interval.as_secs(),
                )
                .max(1),
            ),
        }
    }

    pub fn key_for(&self, owner_id: Uuid) -> String {
        format!("{}:{}", self.namespace, owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_owner() {
        let config = CacheConfig::default();
        let owner = Uuid::nil();
        assert_eq!(
            config.key_for(owner),
            "tasks:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(config.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn oversized_ttl_is_capped() {
        assert_eq!(capped_ttl(u64::MAX), MAX_TTL);
        assert_eq!(capped_ttl(90), Duration::from_secs(90));
    }
}
