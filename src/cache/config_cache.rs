use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::namespace_record::{FreshnessPolicy, NamespaceRecord};
use crate::credentials::store::CredentialStore;
use crate::error::ServiceError;
use crate::observability::metrics::get_metrics;
use crate::parser::coercion::ConfigValue;
use crate::parser::rows::parse_rows;
use crate::sources::sheets::FetchRows;

/// label for namespaces that have never produced a record
pub const UNKNOWN_NAMESPACE: &str = "unknown";

/// Answer to a namespace lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Value(ConfigValue),
    All(BTreeMap<String, ConfigValue>),
}

/// Typed configuration per namespace, refreshed from upstream rows according to a
/// freshness policy.
///
/// Records are swapped as whole `Arc`s under the lock, so a reader never sees a
/// partially built namespace. Concurrent refreshes of one namespace are not coalesced;
/// the last one to finish wins.
pub struct ConfigCache {
    policy: FreshnessPolicy,
    store: Arc<CredentialStore>,
    fetcher: Arc<dyn FetchRows>,
    records: RwLock<HashMap<String, Arc<NamespaceRecord>>>,
}

impl ConfigCache {
    pub fn new(policy: FreshnessPolicy, store: Arc<CredentialStore>, fetcher: Arc<dyn FetchRows>) -> Self {
        Self {
            policy,
            store,
            fetcher,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Full mapping when `key` is `None`, a single value otherwise.
    ///
    /// Under `AlwaysFresh` the namespace is dropped once the answer is taken,
    /// whether or not the lookup succeeded.
    pub async fn get(&self, namespace: &str, key: Option<&str>) -> Result<Lookup, ServiceError> {
        let result = match self.current_record(namespace).await {
            Ok(record) => select(&record, namespace, key),
            Err(e) => Err(e),
        };
        if self.policy == FreshnessPolicy::AlwaysFresh {
            self.evict(namespace).await;
        }
        result
    }

    pub async fn contains(&self, namespace: &str) -> bool {
        self.records.read().await.contains_key(namespace)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn evict(&self, namespace: &str) {
        if self.records.write().await.remove(namespace).is_some() {
            debug!("namespace '{}' evicted", namespace);
            get_metrics().await.cached_entries.with_label_values(&[namespace]).set(0);
        }
    }

    async fn current_record(&self, namespace: &str) -> Result<Arc<NamespaceRecord>, ServiceError> {
        let metrics = get_metrics().await;
        let now = Instant::now();
        let (cached, known) = {
            let records = self.records.read().await;
            let record = records.get(namespace);
            (
                record.filter(|record| record.is_fresh(self.policy, now)).cloned(),
                record.is_some(),
            )
        };
        if let Some(record) = cached {
            debug!("namespace '{}' served from cache", namespace);
            metrics.cache_hits.with_label_values(&[namespace]).inc();
            return Ok(record);
        }

        let start = Instant::now();
        let result = self.refresh(namespace).await;
        let elapsed = start.elapsed().as_secs_f64();

        // a namespace becomes a label value only once it has produced a record
        match result {
            Ok(record) => {
                metrics.cache_misses.with_label_values(&[namespace]).inc();
                metrics.upstream_fetch_requests.with_label_values(&[namespace]).inc();
                metrics.upstream_fetch_duration.with_label_values(&[namespace]).observe(elapsed);
                metrics
                    .cached_entries
                    .with_label_values(&[namespace])
                    .set(record.entries.len() as i64);
                self.records
                    .write()
                    .await
                    .insert(namespace.to_owned(), record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!("refreshing namespace '{}' failed: {}", namespace, e);
                let label = if known { namespace } else { UNKNOWN_NAMESPACE };
                metrics.cache_misses.with_label_values(&[label]).inc();
                metrics.upstream_fetch_requests.with_label_values(&[label]).inc();
                metrics.upstream_fetch_duration.with_label_values(&[label]).observe(elapsed);
                metrics
                    .upstream_fetch_failures
                    .with_label_values(&[label, e.reason()])
                    .inc();
                // a TTL cache keeps its last good record for the next attempt
                if self.policy == FreshnessPolicy::AlwaysFresh {
                    self.evict(namespace).await;
                }
                Err(e)
            }
        }
    }

    /// Fetch with whatever access token is stored; renewal is the refresher's job.
    async fn refresh(&self, namespace: &str) -> Result<Arc<NamespaceRecord>, ServiceError> {
        let credential = self.store.load().await?;
        let rows = self.fetcher.fetch_rows(namespace, &credential.access_token).await?;

        let parsed = parse_rows(&rows);
        if !parsed.skipped.is_empty() {
            let malformed = get_metrics().await.malformed_rows.with_label_values(&[namespace]);
            for skipped in &parsed.skipped {
                warn!("namespace '{}': {}", namespace, skipped);
                malformed.inc();
            }
        }
        info!(
            "namespace '{}' refreshed: {} rows, {} entries",
            namespace,
            rows.len(),
            parsed.entries.len()
        );
        Ok(Arc::new(NamespaceRecord::new(parsed.entries, Instant::now())))
    }
}

fn select(record: &NamespaceRecord, namespace: &str, key: Option<&str>) -> Result<Lookup, ServiceError> {
    match key {
        None => Ok(Lookup::All(record.entries.clone())),
        Some(key) => record
            .entries
            .get(key)
            .cloned()
            .map(Lookup::Value)
            .ok_or_else(|| ServiceError::KeyNotFound {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
            }),
    }
}
