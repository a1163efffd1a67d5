use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::service::{CacheConfig, CachePolicyKind};
use crate::parser::coercion::ConfigValue;

/// When a namespace record must be fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// fetch on every request, keep nothing afterwards
    AlwaysFresh,
    /// keep a record for the given duration
    Ttl(Duration),
}

impl From<&CacheConfig> for FreshnessPolicy {
    fn from(cfg: &CacheConfig) -> Self {
        match cfg.policy {
            CachePolicyKind::AlwaysFresh => FreshnessPolicy::AlwaysFresh,
            CachePolicyKind::Ttl => FreshnessPolicy::Ttl(Duration::from_secs(cfg.ttl_seconds)),
        }
    }
}

/// All entries of one namespace plus the moment they were fetched.
/// Immutable once built; a refresh swaps in a new record.
#[derive(Debug, Clone)]
pub struct NamespaceRecord {
    pub entries: BTreeMap<String, ConfigValue>,
    pub fetched_at: Instant,
}

impl NamespaceRecord {
    pub fn new(entries: BTreeMap<String, ConfigValue>, fetched_at: Instant) -> Self {
        Self { entries, fetched_at }
    }

    pub fn is_fresh(&self, policy: FreshnessPolicy, now: Instant) -> bool {
        match policy {
            FreshnessPolicy::AlwaysFresh => false,
            FreshnessPolicy::Ttl(ttl) => now.saturating_duration_since(self.fetched_at) < ttl,
        }
    }
}
