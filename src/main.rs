use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bilicomments::config::Config;
use bilicomments::crawler::Crawler;
use bilicomments::error::BiliErrorTrait;

#[derive(Parser)]
#[command(
    name = "bilicomments",
    version,
    about = "Collect the Bilibili comments linked from a topic page's cards",
    long_about = None
)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output text file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Topic index page id
    #[arg(short, long)]
    page_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env()?;

    if let Some(output) = cli.output {
        config.output.path = output;
    }
    if let Some(page_id) = cli.page_id {
        config.api.list_page_id = page_id;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    tracing::info!(
        page_id = %config.api.list_page_id,
        output = %config.output.path.display(),
        signing = ?config.signing.mode,
        "bilicomments starting"
    );

    let crawler = match Crawler::from_config(&config).await {
        Ok(crawler) => crawler,
        Err(e) => {
            tracing::error!(
                category = e.category().as_str(),
                recoverable = e.is_recoverable(),
                error = %e,
                "Failed to start crawler"
            );
            return Err(e.into());
        }
    };
    let stats = crawler.run().await;

    println!("Pages processed:   {}", stats.pages);
    println!("Comments written:  {}", stats.written);
    println!("Duplicates:        {}", stats.duplicates);
    println!("Not found:         {}", stats.missing_comments);
    println!("Unparseable URIs:  {}", stats.extract_failures);
    println!("Output:            {}", config.output.path.display());

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("bilicomments=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("bilicomments={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
