//! Crawl pipeline
//!
//! This module implements the sequential crawl: list pages, then for each page
//! fetch its cards, resolve the referenced comments and append them to the output.
//! Requests are issued one at a time.

pub mod comment;
pub mod fetcher;
pub mod headers;
pub mod list;
pub mod page;
pub mod sign;
pub mod url;

use std::sync::Arc;

use crate::config::{Config, SigningMode};
use crate::crawler::comment::CommentClient;
use crate::crawler::fetcher::BiliFetcher;
use crate::crawler::list::PageLister;
use crate::crawler::page::PageProcessor;
use crate::crawler::sign::{Clock, RequestSigner, StaticSigner, SystemClock, WbiSigner};
use crate::error::{Error, Result};
use crate::models::CrawlStats;
use crate::storage::{AppendFileSink, OutputSink};

/// Main crawler structure
pub struct Crawler {
    /// Topic index lister
    lister: PageLister,

    /// Per-page processor
    processor: PageProcessor,
}

impl Crawler {
    /// Create a crawler with injected collaborators
    pub fn new(
        config: &Config,
        signer: Arc<dyn RequestSigner>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        validate(config)?;

        let fetcher = Arc::new(BiliFetcher::new(&config.http)?);
        Ok(Self::with_fetcher(config, fetcher, signer, clock, sink))
    }

    /// Create a crawler around an existing fetcher
    pub fn with_fetcher(
        config: &Config,
        fetcher: Arc<BiliFetcher>,
        signer: Arc<dyn RequestSigner>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        let lister = PageLister::new(
            Arc::clone(&fetcher),
            &config.api.page_list_url,
            &config.api.list_page_id,
        );

        let comments = CommentClient::new(
            Arc::clone(&fetcher),
            signer,
            clock,
            &config.api.comment_url,
            config.api.web_location,
        );

        let processor = PageProcessor::new(fetcher, comments, sink, &config.api.page_detail_url);

        Self { lister, processor }
    }

    /// Build a production crawler: system clock, configured signer, file output
    ///
    /// With WBI signing and no keys in the configuration, the keys are fetched from
    /// the nav endpoint once, before crawling starts.
    pub async fn from_config(config: &Config) -> Result<Self> {
        validate(config)?;

        let fetcher = Arc::new(BiliFetcher::new(&config.http)?);
        let signer = build_signer(config, &fetcher).await?;
        let sink = Arc::new(AppendFileSink::new(&config.output.path)?);

        Ok(Self::with_fetcher(
            config,
            fetcher,
            signer,
            Arc::new(SystemClock),
            sink,
        ))
    }

    /// Run the crawl over every listed page, in order
    pub async fn run(&self) -> CrawlStats {
        let (titles, item_ids) = self.lister.list_pages().await;
        let mut stats = CrawlStats::default();

        if titles.is_empty() {
            tracing::warn!("No pages to process");
        }

        for (title, item_id) in titles.iter().zip(item_ids.iter()) {
            let page_stats = self.processor.process(title, item_id).await;
            stats.add_page(&page_stats);
        }

        tracing::info!(
            pages = stats.pages,
            written = stats.written,
            duplicates = stats.duplicates,
            missing = stats.missing_comments,
            "Crawl finished"
        );

        stats
    }
}

fn validate(config: &Config) -> Result<()> {
    config
        .validate()
        .map_err(|e| Error::config(format!("{e:#}")))
}

/// Select the request signer described by the configuration
pub async fn build_signer(config: &Config, fetcher: &BiliFetcher) -> Result<Arc<dyn RequestSigner>> {
    match config.signing.mode {
        SigningMode::Static => {
            let token = config.signing.static_token.clone().unwrap_or_default();
            Ok(Arc::new(StaticSigner::new(token)?))
        }
        SigningMode::Wbi => {
            let signer = match (&config.signing.img_key, &config.signing.sub_key) {
                (Some(img_key), Some(sub_key)) => WbiSigner::new(img_key, sub_key)?,
                _ => WbiSigner::from_nav(fetcher, &config.api.nav_url).await?,
            };
            Ok(Arc::new(signer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::sign::FixedClock;
    use crate::error::{BiliErrorTrait, ErrorCategory};
    use crate::storage::MemorySink;

    #[tokio::test]
    async fn test_crawler_creation() {
        let crawler = Crawler::new(
            &Config::default(),
            Arc::new(StaticSigner::new("token").unwrap()),
            Arc::new(FixedClock(0)),
            Arc::new(MemorySink::new()),
        );
        assert!(crawler.is_ok());
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = Config::default();
        config.http.max_attempts = 0;
        let crawler = Crawler::new(
            &config,
            Arc::new(StaticSigner::new("token").unwrap()),
            Arc::new(FixedClock(0)),
            Arc::new(MemorySink::new()),
        );
        assert!(matches!(crawler, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_build_signer_from_configured_keys() {
        let mut config = Config::default();
        config.signing.img_key = Some("7cd084941338484aae1ad9425b84077c".into());
        config.signing.sub_key = Some("4932caff0ff746eab6f01bf08b70ac45".into());

        let fetcher = BiliFetcher::new(&config.http).unwrap();
        let signer = build_signer(&config, &fetcher).await.unwrap();

        let mut params = crate::crawler::fetcher::Params::new();
        params.insert("foo".into(), "114".into());
        params.insert("bar".into(), "514".into());
        params.insert("zab".into(), "1919810".into());
        assert_eq!(
            signer.sign(&params, 1_702_204_169).unwrap(),
            "8f6f2b5b3d485fe1886cec6a0be8c5d4"
        );
    }

    #[tokio::test]
    async fn test_unreachable_nav_is_network_error() {
        let mut config = Config::default();
        config.http.max_attempts = 1;
        config.api.nav_url = "http://127.0.0.1:9/x/web-interface/nav".into();

        let fetcher = BiliFetcher::new(&config.http).unwrap();
        let err = build_signer(&config, &fetcher).await.err().unwrap();

        assert!(matches!(err, Error::NoResponse { .. }));
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[tokio::test]
    async fn test_build_static_signer() {
        let mut config = Config::default();
        config.signing.mode = SigningMode::Static;
        config.signing.static_token = Some("captured".into());

        let fetcher = BiliFetcher::new(&config.http).unwrap();
        let signer = build_signer(&config, &fetcher).await.unwrap();
        assert_eq!(
            signer
                .sign(&crate::crawler::fetcher::Params::new(), 0)
                .unwrap(),
            "captured"
        );
    }
}
