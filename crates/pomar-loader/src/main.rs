//! Fetch and reassemble a fragmented page.
//!
//!   cargo run --bin pomar-loader -- --base-url http://192.168.4.1/ --output page.html

use clap::Parser;
use pomar_core::RetryPolicy;
use pomar_loader::{ContentLoader, Document, HttpSource, LoaderConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pomar-loader", about = "Load a page from numbered fragments")]
struct Args {
    /// Base URL the fragment paths resolve against.
    #[arg(long, env = "POMAR_BASE_URL", default_value = "http://192.168.4.1/")]
    base_url: String,

    /// Write the assembled page here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Per-request timeout, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    fetch_timeout_ms: u64,

    /// Delay before retrying a failed fragment, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    retry_delay_ms: u64,

    /// Give up on a fragment after this many attempts (default: never).
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Pause after each fragment, in milliseconds.
    #[arg(long, default_value_t = 300)]
    fragment_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pomar_loader=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let retry_delay = Duration::from_millis(args.retry_delay_ms);
    let config = LoaderConfig {
        fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
        retry: match args.max_attempts {
            Some(max) => RetryPolicy::bounded(retry_delay, max),
            None => RetryPolicy::forever(retry_delay),
        },
        fragment_delay: Duration::from_millis(args.fragment_delay_ms),
        ..LoaderConfig::default()
    };

    let source = HttpSource::new(&args.base_url)?;
    tracing::info!("Loading from {}", source.base());
    let loader = ContentLoader::new(source, config);

    let mut doc = Document::new();
    // On failure the page still carries the error panel.
    let result = loader.load_all(&mut doc).await;

    let html = doc.to_html();
    match args.output {
        Some(path) => tokio::fs::write(&path, html).await?,
        None => print!("{html}"),
    }
    Ok(result?)
}
