//! Core data structures for the crawl pipeline
//!
//! All entities are transient: they are created, used and dropped within a single
//! page's processing. Only the rendered output lines outlive them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::ParseError;
use crate::utils::json_id;

/// A topic page from the index listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Display title, written as the page header
    pub title: String,

    /// Page id used to fetch the page's cards
    pub item_id: String,
}

impl Page {
    /// Create a page
    pub fn new(title: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            item_id: item_id.into(),
        }
    }
}

/// Video and comment ids derived from a card URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    /// Video id (usually a `BV...` id), used as the reply `oid`
    pub video_id: String,

    /// Target reply id, compared textually against `rpid`
    pub comment_id: String,
}

/// An opaque card from a page's detail response
///
/// Cards without a populated `item` array are headers or decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(pub Value);

impl Card {
    /// Whether the card carries a non-empty `item` array
    pub fn has_items(&self) -> bool {
        self.0
            .get("item")
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty())
    }

    /// The URI at `item[0].item[0].uri`
    ///
    /// Returns `Ok(None)` for decoration cards and for a missing or empty `uri`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the card has items but `item[0].item[0]` is missing
    pub fn uri(&self) -> Result<Option<&str>, ParseError> {
        if !self.has_items() {
            return Ok(None);
        }

        let inner = self.0["item"][0]
            .get("item")
            .ok_or_else(|| ParseError::MissingField("item[0].item".into()))?
            .as_array()
            .ok_or_else(|| ParseError::WrongType {
                path: "item[0].item".into(),
                expected: "array",
            })?;

        let first = inner.first().ok_or_else(|| ParseError::IndexOutOfRange {
            path: "item[0].item".into(),
            index: 0,
        })?;

        Ok(first
            .get("uri")
            .and_then(Value::as_str)
            .filter(|uri| !uri.is_empty()))
    }
}

/// Envelope returned by the reply listing endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplyApiResponse {
    /// Business code, 0 on success
    #[serde(default)]
    pub code: i64,

    /// Error message when `code != 0`
    #[serde(default)]
    pub message: String,

    /// Reply data
    #[serde(default)]
    pub data: Option<ReplyData>,
}

/// Reply listing payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplyData {
    /// Replies on the current cursor page; `null` when the video has none
    #[serde(default)]
    pub replies: Option<Vec<Reply>>,
}

/// A single reply, kept as raw JSON
///
/// Only the reply that matches a lookup is ever read, so unrelated entries with an
/// unexpected shape do not affect the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(pub Value);

impl Reply {
    /// Reply id rendered as text; `rpid` may arrive as a number or a string
    pub fn id(&self) -> Option<String> {
        self.0.get("rpid").and_then(json_id)
    }

    /// The text at `content.message`
    pub fn message(&self) -> Option<&str> {
        self.0
            .get("content")
            .and_then(|content| content.get("message"))
            .and_then(Value::as_str)
    }
}

/// Counters for one processed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    /// Cards in the detail response
    pub cards: usize,

    /// Cards whose URI was already seen on this page
    pub duplicates: usize,

    /// Cards whose URI yielded no video/comment ids
    pub extract_failures: usize,

    /// Cards that raised a shape error
    pub card_errors: usize,

    /// References whose comment could not be fetched or matched
    pub missing_comments: usize,

    /// Numbered comment lines written
    pub written: usize,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Pages processed
    pub pages: usize,

    /// Cards seen across all pages
    pub cards: usize,

    /// Duplicate URIs skipped
    pub duplicates: usize,

    /// URIs that failed extraction
    pub extract_failures: usize,

    /// Cards with shape errors
    pub card_errors: usize,

    /// Comments not found
    pub missing_comments: usize,

    /// Comment lines written
    pub written: usize,
}

impl CrawlStats {
    /// Fold a page's counters into the run totals
    pub fn add_page(&mut self, page: &PageStats) {
        self.pages += 1;
        self.cards += page.cards;
        self.duplicates += page.duplicates;
        self.extract_failures += page.extract_failures;
        self.card_errors += page.card_errors;
        self.missing_comments += page.missing_comments;
        self.written += page.written;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_card_without_items_is_decoration() {
        assert!(!Card(json!({"type": "header"})).has_items());
        assert!(!Card(json!({"item": []})).has_items());
        assert!(!Card(json!({"item": null})).has_items());
        assert_eq!(Card(json!({"item": []})).uri().unwrap(), None);
    }

    #[test]
    fn test_card_uri() {
        let card = Card(json!({
            "item": [{"item": [{"uri": "https://www.bilibili.com/video/BV1xx?comment_root_id=42"}]}]
        }));
        assert_eq!(
            card.uri().unwrap(),
            Some("https://www.bilibili.com/video/BV1xx?comment_root_id=42")
        );
    }

    #[test]
    fn test_card_missing_or_empty_uri() {
        let card = Card(json!({"item": [{"item": [{"title": "no uri"}]}]}));
        assert_eq!(card.uri().unwrap(), None);

        let card = Card(json!({"item": [{"item": [{"uri": ""}]}]}));
        assert_eq!(card.uri().unwrap(), None);
    }

    #[test]
    fn test_card_shape_errors() {
        let card = Card(json!({"item": [{"title": "flat"}]}));
        assert!(matches!(card.uri(), Err(ParseError::MissingField(_))));

        let card = Card(json!({"item": [{"item": []}]}));
        assert!(matches!(card.uri(), Err(ParseError::IndexOutOfRange { .. })));

        let card = Card(json!({"item": [{"item": "oops"}]}));
        assert!(matches!(card.uri(), Err(ParseError::WrongType { .. })));
    }

    #[test]
    fn test_deserialize_reply_response() {
        let body = json!({
            "code": 0,
            "message": "0",
            "data": {
                "replies": [
                    {"rpid": 456, "content": {"message": "hello"}, "like": 3},
                    {"rpid": 789, "content": {"message": "world"}}
                ]
            }
        });

        let response: ReplyApiResponse = serde_json::from_value(body).unwrap();
        let replies = response.data.unwrap().replies.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].id().as_deref(), Some("456"));
        assert_eq!(replies[0].message(), Some("hello"));
    }

    #[test]
    fn test_reply_loose_shape() {
        let reply = Reply(json!({"rpid": "456", "content": null}));
        assert_eq!(reply.id().as_deref(), Some("456"));
        assert_eq!(reply.message(), None);

        let reply = Reply(json!({"content": {"message": 3}}));
        assert_eq!(reply.id(), None);
        assert_eq!(reply.message(), None);
    }

    #[test]
    fn test_crawl_stats_accumulate() {
        let mut stats = CrawlStats::default();
        stats.add_page(&PageStats {
            cards: 4,
            duplicates: 1,
            written: 2,
            ..PageStats::default()
        });
        stats.add_page(&PageStats {
            cards: 1,
            missing_comments: 1,
            ..PageStats::default()
        });

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.cards, 5);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.missing_comments, 1);
    }
}
