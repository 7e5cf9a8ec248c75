//! Bilibili reply API client
//!
//! This module fetches the reply listing for a video and picks out a single reply
//! by id. Requests are signed through an injected [`RequestSigner`] with a timestamp
//! from an injected [`Clock`].

use std::sync::Arc;

use crate::crawler::fetcher::{read_json, BiliFetcher, HttpMethod, Params};
use crate::crawler::sign::{Clock, RequestSigner};
use crate::models::{Reply, ReplyApiResponse};
use crate::utils::error::{ParseError, SignError};

/// Reply API constants
pub mod api {
    /// Reply type for videos
    pub const REPLY_TYPE: &str = "1";

    /// Sort mode (hot)
    pub const MODE: &str = "3";

    /// Empty cursor: first page
    pub const PAGINATION: &str = r#"{"offset":""}"#;

    /// Web platform
    pub const PLAT: &str = "1";
}

/// Why a comment lookup produced nothing
#[derive(Debug)]
pub enum CommentMiss {
    /// Every attempt failed
    NoResponse,
    /// The response was not the expected shape
    Parse(ParseError),
    /// No reply on the page has the target id
    NotFound,
    /// The signer refused the parameters
    Sign(SignError),
}

/// Reply API client
pub struct CommentClient {
    fetcher: Arc<BiliFetcher>,
    signer: Arc<dyn RequestSigner>,
    clock: Arc<dyn Clock>,
    comment_url: String,
    web_location: u64,
}

impl CommentClient {
    /// Create a new comment client
    pub fn new(
        fetcher: Arc<BiliFetcher>,
        signer: Arc<dyn RequestSigner>,
        clock: Arc<dyn Clock>,
        comment_url: impl Into<String>,
        web_location: u64,
    ) -> Self {
        Self {
            fetcher,
            signer,
            clock,
            comment_url: comment_url.into(),
            web_location,
        }
    }

    /// Build the signed query for a video
    ///
    /// `wts` and `w_rid` are added on top of the fixed parameter set.
    pub fn build_params(&self, video_id: &str) -> Result<Params, CommentMiss> {
        let mut params = Params::new();
        params.insert("oid".into(), video_id.to_string());
        params.insert("type".into(), api::REPLY_TYPE.into());
        params.insert("mode".into(), api::MODE.into());
        params.insert("pagination_str".into(), api::PAGINATION.into());
        params.insert("plat".into(), api::PLAT.into());
        params.insert("seek_rpid".into(), String::new());
        params.insert("web_location".into(), self.web_location.to_string());

        let wts = self.clock.unix_now();
        let w_rid = self.signer.sign(&params, wts).map_err(CommentMiss::Sign)?;

        params.insert("wts".into(), wts.to_string());
        params.insert("w_rid".into(), w_rid);
        Ok(params)
    }

    /// Fetch the text of reply `comment_id` under video `video_id`
    ///
    /// Returns `None` when there is no response, the response cannot be parsed, or no
    /// reply matches. Each case is logged separately.
    pub async fn fetch_comment(&self, video_id: &str, comment_id: &str) -> Option<String> {
        match self.lookup(video_id, comment_id).await {
            Ok(message) => Some(message),
            Err(CommentMiss::NoResponse) => {
                tracing::warn!(video_id, comment_id, "No response from reply API");
                None
            }
            Err(CommentMiss::Parse(e)) => {
                tracing::warn!(video_id, comment_id, error = %e, "Failed to parse reply listing");
                None
            }
            Err(CommentMiss::NotFound) => {
                tracing::info!(video_id, comment_id, "Comment id not found in replies");
                None
            }
            Err(CommentMiss::Sign(e)) => {
                tracing::warn!(video_id, comment_id, error = %e, "Failed to sign reply request");
                None
            }
        }
    }

    /// Fetch and match, keeping the reason for a miss
    pub async fn lookup(&self, video_id: &str, comment_id: &str) -> Result<String, CommentMiss> {
        let params = self.build_params(video_id)?;

        tracing::debug!(video_id, comment_id, "Fetching replies");

        let response = self
            .fetcher
            .send(&self.comment_url, HttpMethod::Get, Some(&params))
            .await
            .ok_or(CommentMiss::NoResponse)?;

        let body: ReplyApiResponse = read_json(response).await.map_err(CommentMiss::Parse)?;
        if body.code != 0 {
            return Err(CommentMiss::Parse(ParseError::Api {
                code: body.code,
                message: body.message,
            }));
        }

        let replies = body
            .data
            .ok_or_else(|| CommentMiss::Parse(ParseError::MissingField("data".into())))?
            .replies
            .ok_or_else(|| CommentMiss::Parse(ParseError::MissingField("data.replies".into())))?;

        find_reply(&replies, comment_id).ok_or(CommentMiss::NotFound)
    }
}

/// Message of the first reply whose id equals `comment_id` textually
///
/// A matching reply with a missing or empty message counts as no match.
pub fn find_reply(replies: &[Reply], comment_id: &str) -> Option<String> {
    replies
        .iter()
        .find(|reply| reply.id().as_deref() == Some(comment_id))
        .and_then(Reply::message)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::crawler::sign::{FixedClock, StaticSigner};
    use serde_json::json;

    fn reply(rpid: u64, message: &str) -> Reply {
        Reply(json!({"rpid": rpid, "content": {"message": message}}))
    }

    fn client() -> CommentClient {
        CommentClient::new(
            Arc::new(BiliFetcher::new(&HttpConfig::default()).unwrap()),
            Arc::new(StaticSigner::new("token").unwrap()),
            Arc::new(FixedClock(1_700_000_000)),
            "http://127.0.0.1:1/x/v2/reply/main",
            1_315_875,
        )
    }

    #[test]
    fn test_find_reply() {
        let replies = vec![reply(1, "first"), reply(456, "hello"), reply(456, "again")];
        assert_eq!(find_reply(&replies, "456"), Some("hello".to_string()));
        assert_eq!(find_reply(&replies, "999"), None);
    }

    #[test]
    fn test_find_reply_is_textual() {
        let replies = vec![reply(456, "hello")];
        assert_eq!(find_reply(&replies, "0456"), None);
        assert_eq!(find_reply(&replies, " 456"), None);
    }

    #[test]
    fn test_find_reply_string_rpid() {
        let replies = vec![Reply(json!({"rpid": "456", "content": {"message": "hello"}}))];
        assert_eq!(find_reply(&replies, "456"), Some("hello".to_string()));
    }

    #[test]
    fn test_find_reply_ignores_malformed_siblings() {
        let replies = vec![
            Reply(json!({"rpid": 111, "content": null})),
            Reply(json!({"content": {"message": "no id"}})),
            reply(456, "hello"),
        ];
        assert_eq!(find_reply(&replies, "456"), Some("hello".to_string()));
    }

    #[test]
    fn test_find_reply_empty_message_is_miss() {
        let replies = vec![reply(456, ""), reply(789, "other")];
        assert_eq!(find_reply(&replies, "456"), None);

        let replies = vec![Reply(json!({"rpid": 456, "content": {}}))];
        assert_eq!(find_reply(&replies, "456"), None);
    }

    #[test]
    fn test_build_params() {
        let params = client().build_params("BV123").unwrap();

        assert_eq!(params["oid"], "BV123");
        assert_eq!(params["type"], "1");
        assert_eq!(params["mode"], "3");
        assert_eq!(params["pagination_str"], r#"{"offset":""}"#);
        assert_eq!(params["plat"], "1");
        assert_eq!(params["seek_rpid"], "");
        assert_eq!(params["web_location"], "1315875");
        assert_eq!(params["wts"], "1700000000");
        assert_eq!(params["w_rid"], "token");
    }
}
