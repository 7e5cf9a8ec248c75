//! Topic index listing
//!
//! The topic index is a native page whose third card holds the list of sub-pages.
//! Each entry exposes a `title` and an `item_id`.

use std::sync::Arc;

use serde_json::Value;

use crate::crawler::fetcher::{read_json, BiliFetcher, HttpMethod, Params};
use crate::models::Page;
use crate::utils::error::ParseError;
use crate::utils::json_id;

/// Index of the card carrying the page list
const PAGE_LIST_CARD: usize = 2;

/// Topic index crawler
pub struct PageLister {
    fetcher: Arc<BiliFetcher>,
    url: String,
    page_id: String,
}

impl PageLister {
    /// Create new page lister
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared fetcher
    /// * `url` - Topic index endpoint
    /// * `page_id` - `page_id` of the topic index
    #[must_use]
    pub fn new(fetcher: Arc<BiliFetcher>, url: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
            page_id: page_id.into(),
        }
    }

    /// Fetch the pages, oldest first
    ///
    /// The index lists newest first; the result is reversed. Returns an empty list
    /// if the index is unreachable or not in the expected shape.
    pub async fn pages(&self) -> Vec<Page> {
        let mut params = Params::new();
        params.insert("page_id".into(), self.page_id.clone());
        params.insert("jsonp".into(), "jsonp".into());

        let Some(response) = self.fetcher.send(&self.url, HttpMethod::Get, Some(&params)).await
        else {
            return Vec::new();
        };

        let parsed = match read_json::<Value>(response).await {
            Ok(body) => parse_page_list(&body),
            Err(e) => Err(e),
        };

        match parsed {
            Ok(mut pages) => {
                pages.reverse();
                tracing::info!(count = pages.len(), page_id = %self.page_id, "Listed pages");
                pages
            }
            Err(e) => {
                tracing::warn!(error = %e, page_id = %self.page_id, "Failed to parse page list");
                Vec::new()
            }
        }
    }

    /// Fetch the pages as parallel `(titles, ids)` lists, oldest first
    pub async fn list_pages(&self) -> (Vec<String>, Vec<String>) {
        self.pages()
            .await
            .into_iter()
            .map(|page| (page.title, page.item_id))
            .unzip()
    }
}

/// Read `data.cards[2].item[0].item` into pages, in listed order
///
/// # Errors
///
/// Returns a `ParseError` naming the first step of the path that does not match
pub fn parse_page_list(body: &Value) -> Result<Vec<Page>, ParseError> {
    let cards = array_at(body, &["data", "cards"], "data.cards")?;
    let card = index(cards, PAGE_LIST_CARD, "data.cards")?;
    let outer = array_at(card, &["item"], "data.cards[2].item")?;
    let first = index(outer, 0, "data.cards[2].item")?;
    let items = array_at(first, &["item"], "data.cards[2].item[0].item")?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("data.cards[2].item[0].item[{i}]");

            let title = item
                .get("title")
                .ok_or_else(|| ParseError::MissingField(format!("{path}.title")))?
                .as_str()
                .ok_or_else(|| ParseError::WrongType {
                    path: format!("{path}.title"),
                    expected: "string",
                })?;

            let item_id = item
                .get("item_id")
                .ok_or_else(|| ParseError::MissingField(format!("{path}.item_id")))
                .and_then(|v| {
                    json_id(v).ok_or_else(|| ParseError::WrongType {
                        path: format!("{path}.item_id"),
                        expected: "string or number",
                    })
                })?;

            Ok(Page::new(title, item_id))
        })
        .collect()
}

fn array_at<'a>(value: &'a Value, keys: &[&str], path: &str) -> Result<&'a Vec<Value>, ParseError> {
    let mut current = value;
    for key in keys {
        current = current
            .get(key)
            .ok_or_else(|| ParseError::MissingField(path.to_string()))?;
    }
    current.as_array().ok_or_else(|| ParseError::WrongType {
        path: path.to_string(),
        expected: "array",
    })
}

fn index<'a>(items: &'a [Value], i: usize, path: &str) -> Result<&'a Value, ParseError> {
    items.get(i).ok_or_else(|| ParseError::IndexOutOfRange {
        path: path.to_string(),
        index: i,
    })
}
