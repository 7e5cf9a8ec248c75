use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, REFERER, USER_AGENT};

use crate::config::HttpConfig;
use crate::utils::error::FetchError;

/// Build browser-like headers for Bilibili API requests
///
/// Every request carries the same four headers: User-Agent, Referer, Accept and
/// Accept-Encoding.
///
/// # Errors
///
/// Returns `FetchError::InvalidHeader` if a configured value is not a valid header value
///
/// # Examples
///
/// ```
/// use bilicomments::config::HttpConfig;
/// use bilicomments::crawler::headers::build_api_headers;
///
/// let headers = build_api_headers(&HttpConfig::default()).unwrap();
/// assert_eq!(headers.get("referer").unwrap(), "https://www.bilibili.com/");
/// ```
pub fn build_api_headers(config: &HttpConfig) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    headers.insert(REFERER, header_value("referer", &config.referer)?);
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(
        ACCEPT_ENCODING,
        header_value("accept-encoding", &config.accept_encoding)?,
    );

    Ok(headers)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}
