#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::Result;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    use crate::cache::config_cache::ConfigCache;
    use crate::cache::namespace_record::FreshnessPolicy;
    use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};
    use crate::credentials::store::CredentialStore;
    use crate::observability::metrics::get_metrics;
    use crate::server::routes::GatewayState;
    use crate::server::server::{router, AppState};
    use crate::sources::oauth2::OAuth2Exchange;
    use crate::tests::common::{build_reqwest_client, credential_expiring_in, spawn_axum, test_oauth, StaticRows};

    struct Gateway {
        addr: SocketAddr,
        store: Arc<CredentialStore>,
        fetcher: Arc<StaticRows>,
    }

    impl Gateway {
        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }
    }

    fn settings() -> SettingsConfig {
        SettingsConfig {
            server: ServerConfig::default(),
            metrics: MetricsConfig {
                path: "/metrics".into(),
                is_enabled: true,
            },
            logging: None,
        }
    }

    async fn start_gateway(dir: &Path, token_uri: &str, logged_in: bool) -> Gateway {
        let oauth = test_oauth(dir, token_uri);
        let store = Arc::new(CredentialStore::new(&oauth.token_file));
        if logged_in {
            store.save(&credential_expiring_in(60)).await.unwrap();
        }
        let fetcher = Arc::new(StaticRows::new(json!([
            ["max_connections", "100"],
            ["ratio", "0.25"],
            ["feature_x", "TRUE"],
            ["owner", "platform team"],
            ["fallback", "null"]
        ])));
        let cache = Arc::new(ConfigCache::new(FreshnessPolicy::AlwaysFresh, store.clone(), fetcher.clone()));
        let exchange = Arc::new(OAuth2Exchange::new(build_reqwest_client()));
        let gateway_state = GatewayState::new(cache, store.clone(), exchange, oauth);

        let app = router(&settings(), AppState::new(get_metrics().await, gateway_state));
        let (_handle, addr) = spawn_axum(app).await;
        Gateway { addr, store, fetcher }
    }

    #[tokio::test]
    async fn liveness_route_answers() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", false).await;

        let response = build_reqwest_client().get(gateway.url("/")).send().await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await?, "It's working!");
        Ok(())
    }

    #[tokio::test]
    async fn namespace_without_query_returns_typed_json() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", true).await;
        let client = build_reqwest_client();

        let response = client.get(gateway.url("/prod")).send().await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await?;
        assert_eq!(
            body,
            json!({
                "fallback": null,
                "feature_x": true,
                "max_connections": 100,
                "owner": "platform team",
                "ratio": 0.25
            })
        );

        let alias: Value = client.get(gateway.url("/prod/get")).send().await?.json().await?;
        assert_eq!(alias, body);
        assert_eq!(gateway.fetcher.calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn single_key_is_plain_text() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", true).await;
        let client = build_reqwest_client();

        for (path, expected) in [
            ("/prod?key=max_connections", "100"),
            ("/prod/get?key=ratio", "0.25"),
            ("/prod?key=feature_x", "true"),
            ("/prod?key=owner&key=ratio", "platform team"),
        ] {
            let response = client.get(gateway.url(path)).send().await?;
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
            assert_eq!(response.text().await?, expected, "{}", path);
        }
        Ok(())
    }

    #[tokio::test]
    async fn lookup_errors_map_to_status_codes() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", true).await;
        let client = build_reqwest_client();

        let missing = client.get(gateway.url("/prod?key=nope")).send().await?;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.text().await?, "Error: key nope is not in sheet.");

        let calls_before = gateway.fetcher.calls();
        let no_key = client.get(gateway.url("/prod?name=owner")).send().await?;
        assert_eq!(no_key.status(), StatusCode::BAD_REQUEST);
        assert_eq!(no_key.text().await?, "Error: key param is not in url.");
        assert_eq!(gateway.fetcher.calls(), calls_before);

        gateway.fetcher.fail_with("quota exceeded");
        let upstream = client.get(gateway.url("/prod")).send().await?;
        assert_eq!(upstream.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            upstream.text().await?,
            "Error: Unable to retrieve data from sheet: quota exceeded"
        );
        Ok(())
    }

    #[tokio::test]
    async fn namespace_before_login_is_bad_request() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", false).await;

        let response = build_reqwest_client().get(gateway.url("/prod")).send().await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.text().await?.starts_with("Error: credential is missing"));
        assert_eq!(gateway.fetcher.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn login_redirects_to_consent_page() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", false).await;

        let response = build_reqwest_client().get(gateway.url("/login")).send().await?;

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let url = reqwest::Url::parse(&location)?;
        assert_eq!(url.host_str(), Some("accounts.example.com"));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for expected in [
            ("access_type", "offline"),
            ("client_id", "client-id"),
            ("response_type", "code"),
            ("scope", "https://www.googleapis.com/auth/spreadsheets.readonly"),
            ("redirect_uri", "http://localhost:4040/callback"),
        ] {
            assert!(
                params.iter().any(|(k, v)| k == expected.0 && v == expected.1),
                "missing {:?} in {}",
                expected,
                location
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn callback_exchanges_code_and_persists_credential() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/token")
                    .form_urlencoded_tuple("grant_type", "authorization_code")
                    .form_urlencoded_tuple("code", "4/auth-code");
                then.status(200).json_body(json!({
                    "access_token": "ya29.first",
                    "refresh_token": "1//long-lived",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }));
            })
            .await;
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), &server.url("/token"), false).await;

        let response = build_reqwest_client()
            .get(gateway.url("/callback?state=state-token&code=4%2Fauth-code"))
            .send()
            .await?;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await?, "You are logged in!");
        let stored = gateway.store.load().await?;
        assert_eq!(stored.access_token, "ya29.first");
        assert_eq!(stored.refresh_token, "1//long-lived");

        // the namespace route now uses the fresh access token
        build_reqwest_client().get(gateway.url("/prod")).send().await?;
        assert_eq!(gateway.fetcher.tokens_seen(), vec!["ya29.first".to_owned()]);
        Ok(())
    }

    #[tokio::test]
    async fn callback_keeps_stored_refresh_token_when_provider_omits_it() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({
                    "access_token": "ya29.second",
                    "expires_in": 3599
                }));
            })
            .await;
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), &server.url("/token"), true).await;

        let response = build_reqwest_client()
            .get(gateway.url("/callback?code=again"))
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let stored = gateway.store.load().await?;
        assert_eq!(stored.access_token, "ya29.second");
        assert_eq!(stored.refresh_token, "1//refresh-token");
        Ok(())
    }

    #[tokio::test]
    async fn callback_failures_are_bad_requests() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(400).json_body(json!({"error": "invalid_grant"}));
            })
            .await;
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), &server.url("/token"), false).await;
        let client = build_reqwest_client();

        let no_code = client.get(gateway.url("/callback?state=x")).send().await?;
        assert_eq!(no_code.status(), StatusCode::BAD_REQUEST);
        assert_eq!(no_code.text().await?, "Unable to read authorization code");

        let rejected = client.get(gateway.url("/callback?code=stale")).send().await?;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
        assert!(rejected
            .text()
            .await?
            .starts_with("Unable to retrieve token from web:"));
        assert!(gateway.store.load().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn callback_rejects_unusable_token_lifetimes() -> Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token").form_urlencoded_tuple("code", "huge");
                then.status(200).json_body(json!({
                    "access_token": "ya29.huge",
                    "refresh_token": "1//long-lived",
                    "expires_in": 9_000_000_000_000_000i64
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token").form_urlencoded_tuple("code", "zero");
                then.status(200).json_body(json!({
                    "access_token": "ya29.zero",
                    "refresh_token": "1//long-lived",
                    "expires_in": 0
                }));
            })
            .await;
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), &server.url("/token"), false).await;
        let client = build_reqwest_client();

        for code in ["huge", "zero"] {
            let response = client
                .get(gateway.url(&format!("/callback?code={}", code)))
                .send()
                .await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", code);
            let body = response.text().await?;
            assert!(body.starts_with("Unable to retrieve token from web:"), "{}", body);
            assert!(body.contains("expires_in"), "{}", body);
        }
        assert!(gateway.store.load().await.is_err());

        // the server is still up
        let alive = client.get(gateway.url("/")).send().await?;
        assert_eq!(alive.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn metrics_route_exposes_registry() -> Result<()> {
        let dir = tempdir()?;
        let gateway = start_gateway(dir.path(), "http://unused.invalid/token", true).await;
        let client = build_reqwest_client();
        client.get(gateway.url("/prod?key=nope")).send().await?;

        let body = client.get(gateway.url("/metrics")).send().await?.text().await?;

        assert!(body.contains("sheetsagent_request_failures_total"));
        assert!(body.contains("sheetsagent_upstream_fetch_requests_total"));
        Ok(())
    }
}
