//! Docmark main entry point
//!
//! Command-line interface for the Docmark documentation crawler. Flags
//! override values from the optional TOML configuration file.

use anyhow::{bail, Context};
use clap::Parser;
use docmark::config::load_config;
use docmark::storage::StorageKind;
use docmark::{Config, CrawlEngine};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// Docmark: a polite documentation-to-Markdown crawler
///
/// Docmark crawls a documentation site breadth-first while respecting
/// robots.txt and rate limits, converts each page to Markdown, and saves
/// the results through the configured storage backend.
#[derive(Parser, Debug)]
#[command(name = "docmark")]
#[command(version)]
#[command(about = "A polite documentation-to-Markdown crawler", long_about = None)]
struct Cli {
    /// Documentation root URL or sitemap URL to crawl
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output directory for the local storage backend
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Delay between requests in seconds
    #[arg(short, long)]
    delay: Option<f64>,

    /// Maximum number of pages to crawl (0 = unlimited)
    #[arg(short = 'm', long = "max-pages")]
    max_pages: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Storage backend: local, s3, gcs, azure, or sftp
    #[arg(long, value_name = "KIND")]
    storage: Option<String>,

    /// Combine all pages into a single documentation.md
    #[arg(long = "single-file")]
    single_file: bool,

    /// Prepend a YAML frontmatter block to each page
    #[arg(long)]
    frontmatter: bool,

    /// Override the User-Agent header
    #[arg(long = "user-agent", value_name = "UA")]
    user_agent: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let mut engine = CrawlEngine::new(config)?;

    // Ctrl-C stops the crawl between pages rather than mid-write
    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current page before stopping");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let stats = engine.crawl().await?;
    tracing::info!(
        "Done: {} pages saved, {} failed, {:.2} MB downloaded",
        stats.pages_processed,
        stats.pages_failed,
        stats.megabytes_downloaded()
    );

    Ok(())
}

/// Builds the effective configuration from the config file and CLI flags
///
/// The file (if given) supplies the base; every CLI flag overrides its
/// counterpart. At least one of URL and --config must be present.
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => match &cli.url {
            Some(url) => Config::new(url),
            None => bail!("either a URL or --config must be given"),
        },
    };

    if let Some(url) = &cli.url {
        config.crawl.url = url.clone();
    }
    if let Some(delay) = cli.delay {
        config.crawl.delay = delay;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if let Some(timeout) = cli.timeout {
        config.crawl.timeout = timeout;
    }
    if let Some(user_agent) = &cli.user_agent {
        config.crawl.user_agent = Some(user_agent.clone());
    }
    if cli.single_file {
        config.crawl.single_file = true;
    }
    if cli.frontmatter {
        config.crawl.frontmatter = true;
    }
    if let Some(output) = &cli.output {
        config.storage.output = output.clone();
    }
    if let Some(kind) = &cli.storage {
        config.storage.kind = parse_storage_kind(kind)?;
    }

    Ok(config)
}

fn parse_storage_kind(kind: &str) -> anyhow::Result<StorageKind> {
    match kind.to_lowercase().as_str() {
        "local" => Ok(StorageKind::Local),
        "s3" => Ok(StorageKind::S3),
        "gcs" => Ok(StorageKind::Gcs),
        "azure" => Ok(StorageKind::Azure),
        "sftp" => Ok(StorageKind::Sftp),
        other => bail!("unknown storage backend '{}'", other),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docmark=info,warn"),
            1 => EnvFilter::new("docmark=debug,info"),
            2 => EnvFilter::new("docmark=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_alone_builds_default_config() {
        let cli = Cli::parse_from(["docmark", "https://example.com/docs/"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.crawl.url, "https://example.com/docs/");
        assert_eq!(config.crawl.delay, 1.0);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "docmark",
            "https://example.com/",
            "--delay",
            "0.5",
            "--max-pages",
            "25",
            "--single-file",
        ]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.crawl.delay, 0.5);
        assert_eq!(config.crawl.max_pages, 25);
        assert!(config.crawl.single_file);
    }

    #[test]
    fn test_missing_url_and_config_rejected() {
        let cli = Cli::parse_from(["docmark"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_unknown_storage_kind_rejected() {
        assert!(parse_storage_kind("ftp").is_err());
        assert_eq!(parse_storage_kind("S3").unwrap(), StorageKind::S3);
    }
}
