use anyhow::{bail, Context, Result};
use config_manager::SystemConfig;
use leaderboard_service::{LeaderboardOptions, LeaderboardService};
use persistence_layer::{InMemoryStore, LeaderboardStore, PostgresClient};
use std::sync::Arc;
use tracing::info;

/// One-shot leaderboard query: `burn_leaderboard <mint> [limit] [session_id]`.
/// The HTTP surface lives in `api_server`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,leaderboard_service=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(mint) = args.next() else {
        bail!("usage: burn_leaderboard <mint> [limit] [session_id]");
    };
    let limit = args
        .next()
        .map(|raw| raw.parse::<usize>().context("limit must be a positive integer"))
        .transpose()?;
    let session_id = args.next();

    let config = SystemConfig::load().context("failed to load configuration")?;
    let store: Arc<dyn LeaderboardStore> = if config.database.enabled {
        let client = PostgresClient::new(&config.database.postgres_url).await?;
        client.ensure_schema().await?;
        Arc::new(client)
    } else {
        Arc::new(InMemoryStore::new())
    };

    let service = LeaderboardService::from_config(&config, store)?;
    info!("🔍 Building leaderboard for {}", mint);

    let response = service
        .get_leaderboard(
            &mint,
            LeaderboardOptions {
                limit,
                session_id,
                ..Default::default()
            },
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
