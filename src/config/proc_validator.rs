//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks upstream identity, file locations, refresher and cache timing,
//!   and server / metrics / logging settings

use tracing::{error, info};

use crate::config::service::{CachePolicyKind, CacheConfig, OAuthConfig, RefresherConfig, ServiceConfig, UpstreamConfig};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MAX_REFRESHER_SECS;

const RESERVED_PATHS: [&str; 3] = ["/", "/login", "/callback"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_upstream(&cfg.upstream, &mut errors);
    validate_oauth(&cfg.oauth, &mut errors);
    validate_refresher(&cfg.refresher, &mut errors);
    validate_cache(&cfg.cache, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        return Ok(());
    }

    let metrics = get_metrics().await;
    for e in &errors {
        error!("config validation: {}", e);
        metrics.config_validation_errors.inc();
    }
    Err(errors)
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' is not a valid port",
            settings.server.port
        ));
    }

    if settings.metrics.is_enabled {
        let path = settings.metrics.path.as_str();
        if !path.starts_with('/') {
            errors.push(format!("settings.metrics.path '{}' must start with '/'", path));
        }
        if RESERVED_PATHS.contains(&path) {
            errors.push(format!("settings.metrics.path '{}' collides with a built-in route", path));
        }
    }

    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<String>) {
    if upstream.spreadsheet_id.trim().is_empty() {
        errors.push("upstream.spreadsheet_id must not be empty".to_string());
    }
    if !(upstream.api_base_url.starts_with("http://") || upstream.api_base_url.starts_with("https://")) {
        errors.push(format!(
            "upstream.api_base_url '{}' must be an http(s) URL",
            upstream.api_base_url
        ));
    }
    if upstream.columns.trim().is_empty() {
        errors.push("upstream.columns must not be empty".to_string());
    }
    if upstream.request_timeout_ms == 0 {
        errors.push("upstream.request_timeout_ms must be > 0".to_string());
    }
}

fn validate_oauth(oauth: &OAuthConfig, errors: &mut Vec<String>) {
    if oauth.credentials_file.trim().is_empty() {
        errors.push("oauth.credentials_file must not be empty".to_string());
    }
    if oauth.token_file.trim().is_empty() {
        errors.push("oauth.token_file must not be empty".to_string());
    }
    if oauth.credentials_file == oauth.token_file {
        errors.push("oauth.credentials_file and oauth.token_file must be different files".to_string());
    }
    if oauth.scope.trim().is_empty() {
        errors.push("oauth.scope must not be empty".to_string());
    }
}

fn validate_refresher(refresher: &RefresherConfig, errors: &mut Vec<String>) {
    if refresher.interval_seconds == 0 {
        errors.push("refresher.interval_seconds must be > 0".to_string());
    }
    for (field, value) in [
        ("interval_seconds", refresher.interval_seconds),
        ("safety_margin_seconds", refresher.safety_margin_seconds),
        ("initial_delay_seconds", refresher.initial_delay_seconds),
    ] {
        if value > MAX_REFRESHER_SECS {
            errors.push(format!(
                "refresher.{} {} exceeds the maximum of {}",
                field, value, MAX_REFRESHER_SECS
            ));
        }
    }
}

fn validate_cache(cache: &CacheConfig, errors: &mut Vec<String>) {
    if cache.policy == CachePolicyKind::Ttl && cache.ttl_seconds == 0 {
        errors.push("cache.ttl_seconds must be > 0 when cache.policy is 'ttl'".to_string());
    }
}
