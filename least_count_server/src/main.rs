mod config;
mod table;
mod ws;

use anyhow::Context;
use least_count_core::Game;
use pico_args::Arguments;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, HELP};
use crate::table::TableActor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let config = ServerConfig::from_args(&mut pargs)?;

    // One table per process.
    let (actor, table) = TableActor::new(Game::new(config.cards_per_player));
    tokio::spawn(actor.run());

    let app = ws::router(table);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("server listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}
