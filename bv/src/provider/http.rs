//! HTTP client for the RapidAPI-hosted company-data provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::{CompanyDataProvider, CompanyProfile, FetchError, PostCollection, PostLimits};
use crate::config::{ProviderConfig, ProviderMethod};

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

/// Provider client speaking the RapidAPI header convention
pub struct RapidApiProvider {
    http: Client,
    base_url: String,
    host: String,
    api_key: String,
    profile_path: String,
    posts_path: String,
    method: ProviderMethod,
    timeout: Duration,
}

impl RapidApiProvider {
    /// Create a client from configuration and the resolved API key
    pub fn from_config(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self, FetchError> {
        debug!(base_url = %config.base_url, method = ?config.method, "RapidApiProvider::from_config: called");
        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("brandvoice/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: config.host.clone(),
            api_key: api_key.into(),
            profile_path: config.profile_path.clone(),
            posts_path: config.posts_path.clone(),
            method: config.method,
            timeout,
        })
    }

    /// Issue one request and decode the body as JSON
    ///
    /// `params` becomes the JSON body for POST and the query string for GET.
    async fn request(&self, path: &str, params: &[(&str, Value)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, method = ?self.method, "RapidApiProvider::request: called");

        let builder = match self.method {
            ProviderMethod::Post => {
                let body: serde_json::Map<String, Value> =
                    params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
                self.http.post(&url).json(&body)
            }
            ProviderMethod::Get => {
                let query: Vec<(&str, String)> = params
                    .iter()
                    .map(|(k, v)| {
                        let s = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (*k, s)
                    })
                    .collect();
                self.http.get(&url).query(&query)
            }
        };

        let response = builder
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    debug!("RapidApiProvider::request: timed out");
                    FetchError::Transport(format!("Request timed out after {:?}", self.timeout))
                } else {
                    debug!(error = %e, "RapidApiProvider::request: network error");
                    FetchError::Transport(e.to_string())
                }
            })?;

        let response = check_status(response).await?;

        let body = response.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!(body_len = body.len(), "RapidApiProvider::request: body read");
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Map 429 and other non-2xx statuses to typed errors
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status().as_u16();

    if status == 429 {
        debug!("check_status: rate limited (429)");
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(FetchError::RateLimited { retry_after });
    }

    if !response.status().is_success() {
        debug!(%status, "check_status: provider error");
        let mut message = response.text().await.unwrap_or_default();
        if message.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
            message.truncate(cut);
        }
        return Err(FetchError::HttpStatus { status, message });
    }

    Ok(response)
}

#[async_trait]
impl CompanyDataProvider for RapidApiProvider {
    async fn fetch_profile(&self, company_url: &str) -> Result<CompanyProfile, FetchError> {
        debug!(%company_url, "RapidApiProvider::fetch_profile: called");
        let doc = self
            .request(&self.profile_path, &[("link", Value::from(company_url))])
            .await?;
        CompanyProfile::from_document(&doc)
    }

    async fn fetch_posts(&self, company_url: &str, limits: &PostLimits) -> Result<PostCollection, FetchError> {
        debug!(%company_url, ?limits, "RapidApiProvider::fetch_posts: called");
        let params = [
            ("company_url", Value::from(company_url)),
            ("posts", Value::from(limits.posts)),
            ("comments", Value::from(limits.comments)),
            ("reposts", Value::from(limits.reposts)),
        ];
        let doc = self.request(&self.posts_path, &params).await?;
        PostCollection::from_document(&doc)
    }
}
