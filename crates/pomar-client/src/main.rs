//! Terminal chat client.
//!
//! Reads lines from stdin and sends them as chat messages; prints every view
//! update to stdout. The socket reconnects on its own until interrupted.
//!
//!   cargo run --bin pomar-chat -- --url ws://192.168.4.1:81/ws

use clap::Parser;
use pomar_client::{ChatConfig, ConnectionManager, DEFAULT_URL, ViewUpdate, WsConnector};
use pomar_core::RetryPolicy;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pomar-chat", about = "Chat over the pomar relay")]
struct Args {
    /// Relay WebSocket URL.
    #[arg(long, env = "POMAR_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Delay before reconnecting, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    reconnect_delay_ms: u64,

    /// Give up after this many connection attempts (default: never).
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between identification and the history request, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    sync_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pomar_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let delay = Duration::from_millis(args.reconnect_delay_ms);
    let config = ChatConfig {
        url: args.url,
        reconnect: match args.max_attempts {
            Some(max) => RetryPolicy::bounded(delay, max),
            None => RetryPolicy::forever(delay),
        },
        sync_delay: Duration::from_millis(args.sync_delay_ms),
        ..ChatConfig::default()
    };

    let (input_tx, mut input_rx) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if input_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("stdin error: {}", e);
                    break;
                }
            }
        }
    });

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            print_update(&update);
        }
    });

    let mut manager = ConnectionManager::new(WsConnector, &config).with_updates(update_tx);
    tokio::select! {
        () = manager.run(&mut input_rx) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Interrupted");
        }
    }
    Ok(())
}

fn print_update(update: &ViewUpdate) {
    match update {
        ViewUpdate::Appended(bubble) => println!("{bubble}"),
        ViewUpdate::Cleared => println!("--"),
        ViewUpdate::UserCount(count) => println!("[{count} online]"),
        ViewUpdate::Identity { name, avatar } => match avatar {
            Some(avatar) => println!("[you are {name} ({avatar})]"),
            None => println!("[you are {name}]"),
        },
        ViewUpdate::Indicator(_) => {}
    }
}
