// Explorer fetches and proxy request handling
// Author: Gabriel Demetrios Lafis

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use crate::data::{ApiConfig, HttpMethod, Row};
use super::{FetchError, RowFetcher, RowRequest, ShapePolicy};

/// Body of `POST /api/proxy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

impl ProxyRequest {
    pub fn into_row_request(self) -> RowRequest {
        RowRequest::new(self.url, HttpMethod::Get, self.parameters, ShapePolicy::Probe)
    }
}

/// Cut an API key at the first embedded query fragment
pub fn sanitize_api_key(raw: &str) -> &str {
    match raw.find(|c| c == '?' || c == '&' || c == '#') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Canonical results URL for an API: `.json` suffix on `/results` paths and
/// a clean `api_key` query parameter
pub fn normalize_endpoint(api: &ApiConfig) -> Result<String, FetchError> {
    let mut url = Url::parse(&api.endpoint)
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", api.endpoint, e)))?;

    if url.path().ends_with("/results") {
        let path = format!("{}.json", url.path());
        url.set_path(&path);
    }

    let embedded_key = url
        .query_pairs()
        .find(|(key, _)| key == "api_key")
        .map(|(_, value)| value.into_owned());

    let api_key = api
        .api_key
        .clone()
        .or(embedded_key)
        .map(|key| sanitize_api_key(&key).to_string())
        .filter(|key| !key.is_empty());

    let other_pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "api_key")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !other_pairs.is_empty() || api_key.is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &other_pairs {
            pairs.append_pair(key, value);
        }
        if let Some(key) = &api_key {
            pairs.append_pair("api_key", key);
        }
    }

    Ok(url.to_string())
}

/// Request the Explorer issues for an API. Explicit parameters take
/// precedence over the ones declared in the descriptor.
pub fn request_for_api(api: &ApiConfig, parameters: Option<&JsonValue>) -> Result<RowRequest, FetchError> {
    let url = normalize_endpoint(api)?;
    let parameters = parameters.or_else(|| api.default_parameters()).cloned();

    Ok(RowRequest::new(url, api.method, parameters, ShapePolicy::Probe))
}

/// Fetch all rows of an API through the given fetcher
pub async fn fetch_api_data<F>(fetcher: &F, api: &ApiConfig, parameters: Option<&JsonValue>) -> Result<Vec<Row>, FetchError>
where
    F: RowFetcher + ?Sized,
{
    let request = request_for_api(api, parameters)?;
    debug!("Fetching API '{}' via {:?} {}", api.id, request.method, request.url);

    fetcher.fetch_rows(&request).await
}

/// Reject proxy targets outside the configured upstream
pub fn ensure_upstream_host(target: &str, upstream: &Url) -> Result<(), FetchError> {
    let url = Url::parse(target).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", target, e)))?;

    let same_origin = url.scheme() == upstream.scheme()
        && url.host_str() == upstream.host_str()
        && url.port_or_known_default() == upstream.port_or_known_default();

    if same_origin {
        Ok(())
    } else {
        Err(FetchError::ForbiddenHost(url.host_str().unwrap_or_default().to_string()))
    }
}
