//! Per-page processing
//!
//! One page produces a header line followed by numbered comment lines:
//!
//! ```text
//!
//! <title>
//! 1. <message>
//! 2. <message>
//! ```
//!
//! Failures are isolated per card: a bad card is logged and the next card runs.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::crawler::comment::CommentClient;
use crate::crawler::fetcher::{read_json, BiliFetcher, HttpMethod, Params};
use crate::crawler::url;
use crate::error::BiliErrorTrait;
use crate::models::{Card, PageStats};
use crate::storage::OutputSink;
use crate::utils::error::ParseError;
use crate::utils::truncate_text;

/// Processes one page at a time
pub struct PageProcessor {
    fetcher: Arc<BiliFetcher>,
    comments: CommentClient,
    sink: Arc<dyn OutputSink>,
    detail_url: String,
}

impl PageProcessor {
    /// Create a page processor
    pub fn new(
        fetcher: Arc<BiliFetcher>,
        comments: CommentClient,
        sink: Arc<dyn OutputSink>,
        detail_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            comments,
            sink,
            detail_url: detail_url.into(),
        }
    }

    /// Process a page: write its header, then one numbered line per resolved comment
    ///
    /// The header is written even when the page yields nothing. Numbering starts at 1
    /// for every page and only advances when a line is actually written.
    pub async fn process(&self, title: &str, item_id: &str) -> PageStats {
        tracing::info!(title, item_id, "Processing page");

        let mut stats = PageStats::default();

        if let Err(e) = self.sink.append_line(&format!("\n{title}")) {
            tracing::error!(title, error = %e, "Failed to write page header");
        }

        let Some(cards) = self.fetch_cards(item_id).await else {
            return stats;
        };
        stats.cards = cards.len();

        let mut seen: HashSet<String> = HashSet::new();
        let mut count = 0usize;

        for (index, card) in cards.iter().enumerate() {
            let uri = match card.uri() {
                Ok(Some(uri)) => uri,
                Ok(None) => continue,
                Err(e) => {
                    stats.card_errors += 1;
                    tracing::warn!(
                        item_id,
                        index,
                        error = %e,
                        category = e.category().as_str(),
                        "Error while processing card"
                    );
                    continue;
                }
            };

            if !seen.insert(uri.to_string()) {
                stats.duplicates += 1;
                continue;
            }

            let Some(video_ref) = url::extract(uri) else {
                stats.extract_failures += 1;
                continue;
            };

            let Some(message) = self
                .comments
                .fetch_comment(&video_ref.video_id, &video_ref.comment_id)
                .await
            else {
                stats.missing_comments += 1;
                continue;
            };

            let line = format!("{}. {message}", count + 1);
            match self.sink.append_line(&line) {
                Ok(()) => {
                    count += 1;
                    stats.written += 1;
                    tracing::debug!(
                        number = count,
                        video_id = %video_ref.video_id,
                        preview = %truncate_text(&message, 40),
                        "Wrote comment"
                    );
                }
                Err(e) => {
                    tracing::error!(item_id, error = %e, "Failed to write comment");
                }
            }
        }

        tracing::info!(title, written = stats.written, cards = stats.cards, "Page done");
        stats
    }

    /// Fetch the page's cards; `None` if unreachable or malformed
    async fn fetch_cards(&self, item_id: &str) -> Option<Vec<Card>> {
        let mut params = Params::new();
        params.insert("page_id".into(), item_id.to_string());

        let response = self
            .fetcher
            .send(&self.detail_url, HttpMethod::Get, Some(&params))
            .await?;

        let parsed = match read_json::<Value>(response).await {
            Ok(body) => parse_cards(body),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(cards) => Some(cards),
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Failed to parse page cards");
                None
            }
        }
    }
}

/// Take `data.cards` out of a page detail response
///
/// # Errors
///
/// Returns a `ParseError` if `data.cards` is missing or not an array
pub fn parse_cards(mut body: Value) -> Result<Vec<Card>, ParseError> {
    let cards = body
        .get_mut("data")
        .and_then(|data| data.get_mut("cards"))
        .map(Value::take)
        .ok_or_else(|| ParseError::MissingField("data.cards".into()))?;

    match cards {
        Value::Array(cards) => Ok(cards.into_iter().map(Card).collect()),
        _ => Err(ParseError::WrongType {
            path: "data.cards".into(),
            expected: "array",
        }),
    }
}
