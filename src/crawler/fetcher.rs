//! HTTP fetcher with fixed headers and bounded retry
//!
//! Every request goes through [`BiliFetcher::send`], which:
//! - applies the browser-like header set from [`super::headers`]
//! - enforces the configured request timeout
//! - retries any transport failure or non-2xx status with a fixed delay
//! - returns `None` once attempts are exhausted, so callers can skip the unit of work

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::HttpConfig;
use crate::crawler::headers::build_api_headers;
use crate::error::BiliErrorTrait;
use crate::utils::error::{FetchError, ParseError};
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Request parameters; sorted so signed queries are reproducible
pub type Params = BTreeMap<String, String>;

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Parameters sent as query string
    Get,
    /// Parameters sent as JSON body
    Post,
}

impl FromStr for HttpMethod {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(FetchError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Bilibili API fetcher
pub struct BiliFetcher {
    /// HTTP client with default headers, timeout and compression
    client: Client,

    /// Attempt count and delay between attempts
    retry: RetryConfig,
}

impl BiliFetcher {
    /// Create a fetcher from HTTP configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidHeader` for unusable header values and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let retry = RetryConfig::new(config.max_attempts, config.retry_delay());
        Self::with_retry(config, retry)
    }

    /// Create a fetcher with an explicit retry policy
    pub fn with_retry(config: &HttpConfig, retry: RetryConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .default_headers(build_api_headers(config)?)
            .timeout(config.request_timeout())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .cookie_store(true)
            .build()?;

        Ok(Self { client, retry })
    }

    /// Retry policy in use
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Send a request with a method given by name
    ///
    /// # Errors
    ///
    /// Returns `FetchError::UnsupportedMethod` right away, without sending anything,
    /// if `method` is neither GET nor POST
    pub async fn request(
        &self,
        url: &str,
        method: &str,
        params: Option<&Params>,
    ) -> Result<Option<Response>, FetchError> {
        let method = method.parse::<HttpMethod>()?;
        Ok(self.send(url, method, params).await)
    }

    /// Send a request, retrying transport failures and non-2xx statuses
    ///
    /// Returns `None` when every attempt failed.
    pub async fn send(
        &self,
        url: &str,
        method: HttpMethod,
        params: Option<&Params>,
    ) -> Option<Response> {
        tracing::debug!(url = %url, method = ?method, "Sending request");

        let outcome = with_retry_if(
            &self.retry,
            || self.attempt(url, method, params),
            |e: &FetchError| e.is_recoverable(),
        )
        .await;

        match outcome {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    kind = e.kind(),
                    error = %e,
                    max_attempts = self.retry.max_attempts,
                    "Request failed, giving up"
                );
                None
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        method: HttpMethod,
        params: Option<&Params>,
    ) -> Result<Response, FetchError> {
        let builder = match (method, params) {
            (HttpMethod::Get, Some(params)) => self.client.get(url).query(params),
            (HttpMethod::Get, None) => self.client.get(url),
            (HttpMethod::Post, Some(params)) => self.client.post(url).json(params),
            (HttpMethod::Post, None) => self.client.post(url),
        };

        let response = builder.send().await.map_err(FetchError::from_reqwest)?;
        response.error_for_status().map_err(FetchError::from_reqwest)
    }
}

/// Read a response body as JSON
///
/// # Errors
///
/// Returns `ParseError::Body` if the body cannot be read and `ParseError::Json`
/// if it is not valid JSON for `T`
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ParseError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ParseError::Body(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}
