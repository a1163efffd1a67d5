use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::service::UpstreamConfig;
use crate::error::ServiceError;
use crate::parser::rows::Row;

/// Opaque upstream read: every row of one namespace, top to bottom.
#[async_trait]
pub trait FetchRows: Send + Sync {
    async fn fetch_rows(&self, namespace: &str, access_token: &str) -> Result<Vec<Row>, ServiceError>;
}

/// `GET /v4/spreadsheets/{id}/values/{range}` response. `values` is omitted for an empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

/// Row fetcher backed by the spreadsheet values API.
#[derive(Debug, Clone)]
pub struct SheetsSource {
    client: Client,
    api_base_url: String,
    spreadsheet_id: String,
    columns: String,
}

impl SheetsSource {
    pub fn new(client: Client, upstream: &UpstreamConfig) -> Self {
        Self {
            client,
            api_base_url: upstream.api_base_url.trim_end_matches('/').to_owned(),
            spreadsheet_id: upstream.spreadsheet_id.clone(),
            columns: upstream.columns.clone(),
        }
    }

    fn values_url(&self, namespace: &str) -> Result<Url, ServiceError> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| ServiceError::UpstreamFetch(format!("invalid api base url: {}", e)))?;
        let range = format!("{}!{}", namespace, self.columns);
        url.path_segments_mut()
            .map_err(|_| ServiceError::UpstreamFetch("api base url cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl FetchRows for SheetsSource {
    async fn fetch_rows(&self, namespace: &str, access_token: &str) -> Result<Vec<Row>, ServiceError> {
        let url = self.values_url(namespace)?;
        debug!("fetching rows from {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ServiceError::UpstreamFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::UpstreamFetch(format!("HTTP request failed: {} {}", status, body)));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| ServiceError::UpstreamFetch(format!("malformed values response: {}", e)))?;
        Ok(value_range.values)
    }
}
