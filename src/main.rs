use std::time::Duration;

use coinbase_orderbook::coinbase::CoinbaseClient;
use coinbase_orderbook::config::Config;
use coinbase_orderbook::feed::{FeedHandler, RawFeedLogger, TradeTickLogger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args, Config::from_env());

    tracing::info!(
        product_id = %config.product_id,
        rest_url = %config.rest_url,
        ws_url = %config.ws_url,
        authenticated = config.credentials.is_some(),
        "starting order book mirror"
    );

    let client = match &config.credentials {
        Some(credentials) => {
            CoinbaseClient::with_credentials(config.rest_url.clone(), credentials.clone())
        }
        None => CoinbaseClient::new(config.rest_url.clone()),
    };

    let mut handler = FeedHandler::new(config, client);
    handler.add_book_listener(Box::new(TradeTickLogger::default()));
    handler.add_raw_listener(Box::new(RawFeedLogger));

    tokio::select! {
        _ = handler.run() => {}
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, closing feed");
        }
    }

    Ok(())
}

/// Parse command-line arguments on top of the environment-derived config.
fn parse_args(args: &[String], mut config: Config) -> Config {
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--product" => {
                if i + 1 < args.len() {
                    config.product_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--rest-url" => {
                if i + 1 < args.len() {
                    config.rest_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--ws-url" => {
                if i + 1 < args.len() {
                    config.ws_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reconnect-secs" => {
                if i + 1 < args.len() {
                    if let Ok(secs) = args[i + 1].parse::<u64>() {
                        config.reconnect_delay = Duration::from_secs(secs);
                    }
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    config
}

fn print_usage() {
    println!("coinbase-orderbook - real-time level-3 order book mirror");
    println!();
    println!("USAGE:");
    println!("    coinbase-orderbook [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --product <PRODUCT>       Product to mirror (default: BTC-USD)");
    println!("    --rest-url <URL>          Exchange REST endpoint");
    println!("    --ws-url <URL>            Exchange WebSocket feed endpoint");
    println!("    --reconnect-secs <SECS>   Base reconnect delay (default: 5)");
    println!("    --help, -h                Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    COINBASE_REST_URL, COINBASE_WS_URL, COINBASE_PRODUCT,");
    println!("    COINBASE_RECONNECT_SECS, COINBASE_API_KEY, COINBASE_API_SECRET,");
    println!("    COINBASE_API_PASSPHRASE, RUST_LOG");
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
