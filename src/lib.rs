//! bilicomments - Bilibili topic page comment collector
//!
//! Walks a Bilibili topic index, follows every card that links a video comment and
//! appends the referenced comment texts to a plain text file.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - HTTP fetching, page listing, URI extraction, reply lookup, signing
//! - [`models`] - Core data structures and types
//! - [`storage`] - Append-only output sinks
//! - [`error`] - Error types and classification
//! - [`utils`] - Retry and small helpers
//!
//! # Example
//!
//! ```no_run
//! use bilicomments::config::Config;
//! use bilicomments::crawler::Crawler;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let crawler = Crawler::from_config(&config).await?;
//!     let stats = crawler.run().await;
//!     println!("{} comments written", stats.written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::Crawler;
    pub use crate::error::{BiliErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Card, CrawlStats, Page, PageStats, VideoRef};
    pub use crate::storage::{AppendFileSink, MemorySink, OutputSink};
}

// Direct re-exports for convenience
pub use models::{CrawlStats, Page, VideoRef};
