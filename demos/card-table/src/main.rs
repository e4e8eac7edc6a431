//! A runnable card-table server: WebSocket rooms plus the HTTP discovery
//! surface, with logging wired up. Point a card-game client at it.

use clap::Parser;

use cardroom::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "card-table", about = "Cardroom session server")]
struct Args {
    /// WebSocket listen address (rooms).
    #[arg(long, default_value = "0.0.0.0:8080")]
    ws_addr: String,

    /// HTTP listen address (existence check / create / room list).
    #[arg(long, default_value = "0.0.0.0:3000")]
    http_addr: String,
}

#[tokio::main]
async fn main() -> Result<(), CardroomError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let server = CardroomServerBuilder::new()
        .ws_bind(&args.ws_addr)
        .http_bind(&args.http_addr)
        .build()
        .await?;

    tracing::info!(
        ws = %args.ws_addr,
        http = %args.http_addr,
        "card-table server starting"
    );

    server.run().await
}
