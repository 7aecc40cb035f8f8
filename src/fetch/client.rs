// HTTP client for the TopLedger analytics API
// Author: Gabriel Demetrios Lafis

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value as JsonValue;
use url::Url;

use crate::data::{is_no_cached_result, HttpMethod, ResponseShape, Row};
use crate::utils::UpstreamConfig;
use super::{retry_with_backoff, FetchError, RetryPolicy, RowFetcher, RowRequest, ShapePolicy};

const MAX_ERROR_BODY: usize = 200;

/// Client for `/tl/api/queries/<id>/results` endpoints
#[derive(Debug, Clone)]
pub struct TopLedgerClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl TopLedgerClient {
    /// Create a new client from the upstream configuration
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| FetchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(TopLedgerClient {
            http,
            base_url,
            api_key: config.api_key.clone(),
            retry: config.retry_policy(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// URL of a query's cached results; falls back to the configured key
    pub fn query_url(&self, query_id: &str, api_key: Option<&str>) -> String {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/tl/api/queries/{}/results.json", query_id));

        if let Some(key) = api_key.or(self.api_key.as_deref()) {
            url.query_pairs_mut().append_pair("api_key", key);
        }

        url.to_string()
    }

    /// Request for a dashboard query, which must use the canonical envelope
    pub fn query_request(
        &self,
        query_id: &str,
        api_key: Option<&str>,
        method: HttpMethod,
        parameters: Option<JsonValue>,
    ) -> RowRequest {
        RowRequest::new(self.query_url(query_id, api_key), method, parameters, ShapePolicy::Canonical)
    }

    async fn send_once(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError> {
        let builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url).json(&request.body()),
        };

        let response = builder.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let body = response.text().await?;

        if is_no_cached_result(&body) {
            return Err(FetchError::NoCachedData(truncate(&body)));
        }

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let json: JsonValue = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        let rows = match request.shape {
            ShapePolicy::Canonical => ResponseShape::classify_strict(json)?,
            ShapePolicy::Probe => {
                let shape = ResponseShape::classify(json)?;
                debug!("Response envelope for {}: {}", request.url, shape.variant_name());
                shape.into_rows()
            },
        };

        debug!("Fetched {} rows from {}", rows.len(), request.url);
        Ok(rows)
    }
}

#[async_trait]
impl RowFetcher for TopLedgerClient {
    async fn fetch_rows(&self, request: &RowRequest) -> Result<Vec<Row>, FetchError> {
        retry_with_backoff(&self.retry, |_| self.send_once(request)).await
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}
