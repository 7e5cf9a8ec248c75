//! Request signing for the reply API
//!
//! Reply requests carry a `w_rid` token computed from the query parameters and the
//! `wts` timestamp. Signing is a collaborator behind [`RequestSigner`]:
//! - [`WbiSigner`] computes the WBI signature per request
//! - [`StaticSigner`] replays a captured token (only valid for the captured `wts`)
//!
//! The timestamp comes from a [`Clock`] so tests can pin it.

use md5::{Digest, Md5};
use serde_json::Value;

use crate::crawler::fetcher::{read_json, BiliFetcher, HttpMethod, Params};
use crate::error::{self, Error};
use crate::utils::error::{ParseError, SignError};

/// Permutation applied to `img_key + sub_key` to build the mixin key
const MIXIN_KEY_ENC_TAB: [usize; 64] = [
    46, 47, 18, 2, 53, 8, 23, 32, 15, 50, 10, 31, 58, 3, 45, 35, 27, 43, 5, 49, 33, 9, 42, 19, 29,
    28, 14, 39, 12, 38, 41, 13, 37, 48, 7, 16, 24, 55, 40, 61, 26, 17, 0, 1, 60, 51, 30, 4, 22, 25,
    54, 21, 56, 59, 6, 63, 57, 62, 11, 36, 20, 34, 44, 52,
];

/// Characters stripped from values before signing
const FILTERED_CHARS: &[char] = &['!', '\'', '(', ')', '*'];

/// Computes the `w_rid` token for a request
pub trait RequestSigner: Send + Sync {
    /// Sign `params` (without `wts` or `w_rid`) at timestamp `wts`
    fn sign(&self, params: &Params, wts: u64) -> Result<String, SignError>;
}

/// Source of the `wts` timestamp
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn unix_now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_now(&self) -> u64 {
        self.0
    }
}

/// Replays a fixed token
#[derive(Debug, Clone)]
pub struct StaticSigner {
    token: String,
}

impl StaticSigner {
    /// Create a static signer
    ///
    /// # Errors
    ///
    /// Returns `SignError::MissingToken` for an empty token
    pub fn new(token: impl Into<String>) -> Result<Self, SignError> {
        let token = token.into();
        if token.is_empty() {
            return Err(SignError::MissingToken);
        }
        Ok(Self { token })
    }
}

impl RequestSigner for StaticSigner {
    fn sign(&self, _params: &Params, _wts: u64) -> Result<String, SignError> {
        Ok(self.token.clone())
    }
}

/// WBI signer
///
/// ```
/// use bilicomments::crawler::fetcher::Params;
/// use bilicomments::crawler::sign::{RequestSigner, WbiSigner};
///
/// let signer = WbiSigner::new(
///     "7cd084941338484aae1ad9425b84077c",
///     "4932caff0ff746eab6f01bf08b70ac45",
/// ).unwrap();
///
/// let mut params = Params::new();
/// params.insert("foo".into(), "114".into());
/// params.insert("bar".into(), "514".into());
/// params.insert("zab".into(), "1919810".into());
///
/// let w_rid = signer.sign(&params, 1702204169).unwrap();
/// assert_eq!(w_rid, "8f6f2b5b3d485fe1886cec6a0be8c5d4");
/// ```
#[derive(Debug, Clone)]
pub struct WbiSigner {
    mixin_key: String,
}

impl WbiSigner {
    /// Build a signer from the image and sub keys
    ///
    /// # Errors
    ///
    /// Returns `SignError::KeyTooShort` if the concatenated keys are shorter than 64 characters
    pub fn new(img_key: &str, sub_key: &str) -> Result<Self, SignError> {
        let mixin_key = mixin_key(&format!("{img_key}{sub_key}"))?;
        Ok(Self { mixin_key })
    }

    /// Fetch the current keys from the nav endpoint and build a signer
    ///
    /// The nav endpoint answers with a non-zero code for anonymous visitors but still
    /// publishes `data.wbi_img`, so the code is not checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or the keys cannot be read
    pub async fn from_nav(fetcher: &BiliFetcher, nav_url: &str) -> error::Result<Self> {
        let response = fetcher
            .send(nav_url, HttpMethod::Get, None)
            .await
            .ok_or_else(|| Error::NoResponse {
                url: nav_url.to_string(),
            })?;

        let body: Value = read_json(response).await?;
        let (img_key, sub_key) = wbi_keys_from_nav(&body)?;

        tracing::debug!(img_key = %img_key, sub_key = %sub_key, "Fetched WBI keys");
        Ok(Self::new(&img_key, &sub_key)?)
    }

    /// The derived 32-character mixin key
    pub fn mixin_key(&self) -> &str {
        &self.mixin_key
    }
}

impl RequestSigner for WbiSigner {
    fn sign(&self, params: &Params, wts: u64) -> Result<String, SignError> {
        let mut signed = params.clone();
        signed.insert("wts".to_string(), wts.to_string());

        let query = signed
            .iter()
            .map(|(k, v)| {
                let value: String = v.chars().filter(|c| !FILTERED_CHARS.contains(c)).collect();
                format!("{}={}", encode_component(k), encode_component(&value))
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Md5::new();
        hasher.update(query.as_bytes());
        hasher.update(self.mixin_key.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Reorder `img_key + sub_key` through the mixin table and keep 32 characters
fn mixin_key(raw: &str) -> Result<String, SignError> {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() < MIXIN_KEY_ENC_TAB.len() {
        return Err(SignError::KeyTooShort(chars.len()));
    }

    Ok(MIXIN_KEY_ENC_TAB
        .iter()
        .take(32)
        .map(|&i| chars[i])
        .collect())
}

/// Percent-encode like `encodeURIComponent`, leaving `~` and encoding spaces as `%20`
fn encode_component(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace("%7E", "~")
}

/// Read `(img_key, sub_key)` from a nav response
fn wbi_keys_from_nav(body: &Value) -> Result<(String, String), ParseError> {
    let wbi_img = body
        .get("data")
        .and_then(|d| d.get("wbi_img"))
        .ok_or_else(|| ParseError::MissingField("data.wbi_img".into()))?;

    let key = |field: &str| -> Result<String, ParseError> {
        let url = wbi_img
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField(format!("data.wbi_img.{field}")))?;
        key_from_url(url).ok_or_else(|| ParseError::WrongType {
            path: format!("data.wbi_img.{field}"),
            expected: "image URL",
        })
    };

    Ok((key("img_url")?, key("sub_url")?))
}

/// File stem of a key image URL
fn key_from_url(url: &str) -> Option<String> {
    let file = url.rsplit('/').next()?;
    let stem = file.split('.').next()?;
    (!stem.is_empty()).then(|| stem.to_string())
}
