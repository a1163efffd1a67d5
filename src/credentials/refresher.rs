use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::app_identity::AppIdentity;
use crate::config::service::{OAuthConfig, RefresherConfig};
use crate::credentials::store::CredentialStore;
use crate::error::ServiceError;
use crate::helpers::time::{chrono_duration, expiry_after, format_remaining};
use crate::observability::metrics::{get_metrics, RENEWAL_FAILED, RENEWAL_RENEWED, RENEWAL_SKIPPED};
use crate::sources::oauth2::TokenExchange;

/// What a single tick did.
#[derive(Debug)]
pub enum RenewalOutcome {
    /// enough validity left, nothing was called
    Skipped { remaining: chrono::Duration },
    Renewed { expiry: DateTime<Utc> },
    /// stored credential left untouched, next tick retries
    Failed(ServiceError),
}

/// Background renewal of the stored access token.
///
/// Every tick renews when `expiry - now < interval + safety_margin`, which leaves a
/// full interval plus margin of validity even if one tick is late or fails.
pub struct CredentialRefresher {
    store: Arc<CredentialStore>,
    exchange: Arc<dyn TokenExchange>,
    oauth: OAuthConfig,
    interval: Duration,
    safety_margin: Duration,
    initial_delay: Duration,
}

impl CredentialRefresher {
    pub fn new(
        store: Arc<CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        oauth: OAuthConfig,
        refresher: &RefresherConfig,
    ) -> Self {
        Self {
            store,
            exchange,
            oauth,
            interval: refresher.interval(),
            safety_margin: refresher.safety_margin(),
            initial_delay: refresher.initial_delay(),
        }
    }

    pub fn needs_renewal(&self, expiry: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let window = chrono_duration(self.interval)
            .checked_add(&chrono_duration(self.safety_margin))
            .unwrap_or(chrono::TimeDelta::MAX);
        expiry - now < window
    }

    /// Tick loop. Returns once `shutdown` flips or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "credential refresher started: interval {}s, safety margin {}s, first check in {}s",
            self.interval.as_secs(),
            self.safety_margin.as_secs(),
            self.initial_delay.as_secs()
        );
        if wait_or_shutdown(self.initial_delay, &mut shutdown).await {
            info!("credential refresher stopped");
            return Ok(());
        }
        loop {
            self.tick().await;
            if wait_or_shutdown(self.interval, &mut shutdown).await {
                break;
            }
        }
        info!("credential refresher stopped");
        Ok(())
    }

    pub async fn tick(&self) -> RenewalOutcome {
        self.tick_at(Utc::now()).await
    }

    /// One Idle -> (Renewing ->) Idle cycle evaluated at `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> RenewalOutcome {
        let metrics = get_metrics().await;
        let outcome = match self.renew_if_needed(now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error while renewing token: {}", e);
                RenewalOutcome::Failed(e)
            }
        };
        let label = match &outcome {
            RenewalOutcome::Skipped { .. } => RENEWAL_SKIPPED,
            RenewalOutcome::Renewed { .. } => RENEWAL_RENEWED,
            RenewalOutcome::Failed(_) => RENEWAL_FAILED,
        };
        metrics.credential_renewals.with_label_values(&[label]).inc();
        outcome
    }

    async fn renew_if_needed(&self, now: DateTime<Utc>) -> Result<RenewalOutcome, ServiceError> {
        let metrics = get_metrics().await;
        let credential = self.store.load().await?;
        metrics.credential_expiry_unix.set(credential.expiry.timestamp());

        if !self.needs_renewal(credential.expiry, now) {
            let remaining = credential.remaining(now);
            info!(
                "no need to renew access token: expires in {}, next check in {}s",
                format_remaining(remaining),
                self.interval.as_secs()
            );
            return Ok(RenewalOutcome::Skipped { remaining });
        }

        debug!("access token expires in {}, renewing", format_remaining(credential.remaining(now)));
        let identity = AppIdentity::load(&PathBuf::from(&self.oauth.credentials_file))
            .await
            .map_err(|e| ServiceError::Renewal(e.to_string()))?;
        let grant = self
            .exchange
            .renew(&identity, &identity.token_url(&self.oauth), &credential.refresh_token)
            .await?;
        let expiry = expiry_after(now, grant.expires_in_seconds).ok_or_else(|| {
            ServiceError::Renewal(format!(
                "token response has unusable expires_in {}",
                grant.expires_in_seconds
            ))
        })?;
        let renewed = credential.renewed(grant.access_token, expiry);
        self.store
            .save(&renewed)
            .await
            .map_err(|e| ServiceError::Renewal(e.to_string()))?;

        metrics.credential_expiry_unix.set(expiry.timestamp());
        info!("access token refreshed, new expiry {}", expiry);
        Ok(RenewalOutcome::Renewed { expiry })
    }
}

/// `true` when shutdown was requested before `duration` elapsed.
async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
