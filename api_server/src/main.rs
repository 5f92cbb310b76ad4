use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use config_manager::{ConfigurationError, SystemConfig};
use leaderboard_service::{LeaderboardError, LeaderboardService};
use persistence_layer::{InMemoryStore, LeaderboardStore, PersistenceError, PostgresClient};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

mod handlers;
mod types;

use handlers::*;
use types::*;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LeaderboardService>,
    /// Set when burns are stored in PostgreSQL
    pub database: Option<PostgresClient>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: LeaderboardService, database: Option<PostgresClient>) -> Self {
        Self {
            service: Arc::new(service),
            database,
            started_at: Instant::now(),
        }
    }
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),
    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Leaderboard(LeaderboardError::InvalidSessionId(_)) => StatusCode::BAD_REQUEST,
            ApiError::Leaderboard(LeaderboardError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_server=debug,leaderboard_service=debug".into()),
        )
        .init();

    info!("Starting Burn Leaderboard API Server...");

    let config = SystemConfig::load()?;
    info!("Configuration loaded successfully");
    debug!("Configuration: {}", config.to_json_value());

    let database = connect_database(&config).await?;
    let store: Arc<dyn LeaderboardStore> = match &database {
        Some(client) => Arc::new(client.clone()),
        None => {
            info!("🗄️ Database disabled, using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    let service = LeaderboardService::from_config(&config, store)?;
    if !service.ledger_enabled() {
        warn!("⚠️ Ledger disabled, every leaderboard will be served from stored burns");
    }

    let app = create_router(AppState::new(service, database));

    info!("📋 Available endpoints:");
    info!("   • GET /health - Health check");
    info!("   • GET /api/leaderboard/:token_id - Burn leaderboard (limit, sessionId, useBlockchain)");
    info!("   • DELETE /api/leaderboard/:token_id/cache - Drop cached leaderboards for a token");
    info!("   • DELETE /api/leaderboard/cache - Drop every cached leaderboard");

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("🚀 Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_database(config: &SystemConfig) -> Result<Option<PostgresClient>, ApiError> {
    if !config.database.enabled {
        return Ok(None);
    }

    let client = PostgresClient::new(&config.database.postgres_url).await?;
    client.ensure_schema().await?;
    info!("🗄️ PostgreSQL store ready");
    Ok(Some(client))
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/leaderboard/cache", delete(invalidate_all_caches))
        .route("/api/leaderboard/:token_id", get(get_leaderboard))
        .route("/api/leaderboard/:token_id/cache", delete(invalidate_token_cache))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}
