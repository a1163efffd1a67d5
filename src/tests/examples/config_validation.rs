#[cfg(test)]
mod tests {
    use std::path::Path;

    use serial_test::serial;

    use crate::cache::namespace_record::FreshnessPolicy;
    use crate::config::proc_loader::{expand_env_vars, file_to_config, parse_config};
    use crate::config::proc_validator::validate_service_config;
    use crate::config::service::CachePolicyKind;
    use crate::config::settings::LogFormat;
    use crate::ServiceConfig;

    #[tokio::test]
    #[serial]
    async fn shipped_config_is_valid() {
        let path = Path::new("config/sheets-config-agent.yaml");
        let service_config: ServiceConfig = file_to_config(path)
            .await
            .expect("config/sheets-config-agent.yaml must exist in repo root for tests");
        validate_service_config(&service_config).await.unwrap();

        assert_eq!(service_config.settings.server.port, "4040");
        assert!(service_config.settings.metrics.is_enabled);
        assert_eq!(service_config.cache.policy, CachePolicyKind::AlwaysFresh);
    }

    #[tokio::test]
    async fn minimal_config_gets_defaults() {
        let yaml = r#"
settings: {}
upstream:
  spreadsheet_id: abc123
"#;
        let cfg = parse_config(yaml.to_owned()).await.unwrap();

        assert_eq!(cfg.settings.server.host, "0.0.0.0");
        assert_eq!(cfg.settings.server.port, "4040");
        assert!(!cfg.settings.metrics.is_enabled);
        let logging = cfg.settings.logging.expect("logging defaults applied");
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);

        assert_eq!(cfg.upstream.api_base_url, "https://sheets.googleapis.com");
        assert_eq!(cfg.upstream.columns, "A:B");
        assert_eq!(cfg.oauth.scope, "https://www.googleapis.com/auth/spreadsheets.readonly");
        assert_eq!(cfg.refresher.interval_seconds, 1800);
        assert_eq!(cfg.refresher.safety_margin_seconds, 300);
        assert_eq!(FreshnessPolicy::from(&cfg.cache), FreshnessPolicy::AlwaysFresh);
    }

    #[tokio::test]
    async fn ttl_policy_carries_its_duration() {
        let yaml = r#"
settings: {}
upstream:
  spreadsheet_id: abc123
cache:
  policy: ttl
  ttl_seconds: 45
"#;
        let cfg = parse_config(yaml.to_owned()).await.unwrap();
        assert_eq!(
            FreshnessPolicy::from(&cfg.cache),
            FreshnessPolicy::Ttl(std::time::Duration::from_secs(45))
        );
    }

    #[tokio::test]
    #[should_panic(expected = "config is not valid")]
    async fn invalid_config_reports_all_errors() {
        let invalid_yaml = r#"
settings:
  server:
    host: ""
    port: "http"
  metrics:
    path: "/login"
    is_enabled: true
  logging:
    level: chatty
    format: json
upstream:
  spreadsheet_id: ""
  api_base_url: "ftp://sheets"
  request_timeout_ms: 0
oauth:
  credentials_file: same.json
  token_file: same.json
refresher:
  interval_seconds: 0
cache:
  policy: ttl
  ttl_seconds: 0
"#;
        parse_config(invalid_yaml.to_owned()).await.unwrap();
    }

    #[tokio::test]
    async fn every_invalid_field_is_listed() {
        let yaml = r#"
settings:
  server:
    port: "70000"
upstream:
  spreadsheet_id: " "
refresher:
  interval_seconds: 0
"#;
        let cfg: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_service_config(&cfg).await.unwrap_err();

        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("settings.server.port")));
        assert!(errors.iter().any(|e| e.contains("upstream.spreadsheet_id")));
        assert!(errors.iter().any(|e| e.contains("refresher.interval_seconds")));
    }

    #[tokio::test]
    async fn refresher_durations_are_bounded() {
        let yaml = r#"
settings: {}
upstream:
  spreadsheet_id: abc123
refresher:
  interval_seconds: 10000000000000000
  safety_margin_seconds: 2592001
  initial_delay_seconds: 2592000
"#;
        let cfg: ServiceConfig = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_service_config(&cfg).await.unwrap_err();

        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("refresher.interval_seconds")));
        assert!(errors.iter().any(|e| e.contains("refresher.safety_margin_seconds")));
    }

    #[tokio::test]
    async fn unparseable_yaml_is_an_error() {
        let result = parse_config("settings: [".to_owned()).await;
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn env_vars_expand_with_defaults() {
        std::env::set_var("SHEETS_AGENT_TEST_SHEET", "from-env");
        std::env::remove_var("SHEETS_AGENT_TEST_UNSET");

        let expanded = expand_env_vars("id: ${SHEETS_AGENT_TEST_SHEET}\nport: ${SHEETS_AGENT_TEST_UNSET:8080}\nx: ${SHEETS_AGENT_TEST_UNSET}");

        assert_eq!(expanded, "id: from-env\nport: 8080\nx: ");
        std::env::remove_var("SHEETS_AGENT_TEST_SHEET");
    }
}
