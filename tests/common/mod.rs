//! Common test utilities

use std::path::Path;
use std::sync::Arc;

use bilicomments::config::{Config, SigningMode};
use bilicomments::crawler::sign::{FixedClock, StaticSigner};
use bilicomments::crawler::Crawler;
use bilicomments::storage::MemorySink;
use serde_json::{json, Value};

pub const LIST_PATH: &str = "/x/native_page/dynamic/index";
pub const DETAIL_PATH: &str = "/x/native_page/dynamic/inline";
pub const REPLY_PATH: &str = "/x/v2/reply/main";
pub const NAV_PATH: &str = "/x/web-interface/nav";

pub const TOKEN: &str = "test-token";
pub const WTS: u64 = 1_700_000_000;

/// Configuration pointing every endpoint at a mock server
pub fn test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.api.page_list_url = format!("{base_url}{LIST_PATH}");
    config.api.page_detail_url = format!("{base_url}{DETAIL_PATH}");
    config.api.comment_url = format!("{base_url}{REPLY_PATH}");
    config.api.nav_url = format!("{base_url}{NAV_PATH}");
    config.http.request_timeout_secs = 5;
    config.http.retry_delay_ms = 10;
    config.signing.mode = SigningMode::Static;
    config.signing.static_token = Some(TOKEN.to_string());
    config.output.path = output.to_path_buf();
    config
}

/// Crawler writing into a memory sink, with a pinned clock and static token
pub fn memory_crawler(config: &Config) -> (Crawler, MemorySink) {
    let sink = MemorySink::new();
    let crawler = Crawler::new(
        config,
        Arc::new(StaticSigner::new(TOKEN).unwrap()),
        Arc::new(FixedClock(WTS)),
        Arc::new(sink.clone()),
    )
    .unwrap();
    (crawler, sink)
}

/// Topic index body listing `(title, item_id)` pairs in API order
pub fn index_body(pages: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = pages
        .iter()
        .map(|(title, id)| json!({"title": title, "item_id": id, "type": "page"}))
        .collect();

    json!({
        "code": 0,
        "message": "0",
        "data": {
            "cards": [
                {"type": "head"},
                {"type": "navigation", "item": []},
                {"type": "list", "item": [{"item": items}]}
            ]
        }
    })
}

/// Page detail body: a header card followed by one card per URI
pub fn detail_body(uris: &[&str]) -> Value {
    let mut cards = vec![json!({"type": "header"})];
    cards.extend(
        uris.iter()
            .map(|uri| json!({"type": "resource", "item": [{"item": [{"uri": uri, "title": "card"}]}]})),
    );

    json!({"code": 0, "data": {"cards": cards}})
}

/// Reply listing body from `(rpid, message)` pairs
pub fn replies_body(replies: &[(u64, &str)]) -> Value {
    let replies: Vec<Value> = replies
        .iter()
        .map(|(rpid, message)| json!({"rpid": rpid, "oid": 1, "content": {"message": message}}))
        .collect();

    json!({"code": 0, "message": "0", "data": {"replies": replies}})
}

/// Card URI for a video and comment id
pub fn video_uri(video_id: &str, comment_id: &str) -> String {
    format!("https://www.bilibili.com/video/{video_id}?comment_on=1&comment_root_id={comment_id}")
}
