use crate::types::*;
use crate::{ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use tracing::{debug, info, warn};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_reachable = match &state.database {
        Some(client) => Some(match client.health_check().await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ Database health check failed: {}", e);
                false
            }
        }),
        None => None,
    };
    let status = if database_reachable == Some(false) {
        "degraded"
    } else {
        "healthy"
    };

    Json(SuccessResponse::new(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        ledger_enabled: state.service.ledger_enabled(),
        database_reachable,
        cached_leaderboards: state.service.cache().len(),
    }))
}

/// Ranked burners for one token, optionally scoped to a session
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Leaderboard request for {}: {:?}", token_id, query);

    let response = state
        .service
        .get_leaderboard(&token_id, query.into())
        .await?;

    Ok(Json(SuccessResponse::new(response)))
}

pub async fn invalidate_token_cache(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> impl IntoResponse {
    let invalidated_entries = state.service.invalidate(&token_id);
    info!("🧹 Invalidated {} cached leaderboards for {}", invalidated_entries, token_id);

    Json(SuccessResponse::new(CacheInvalidationResponse {
        token_id: Some(token_id),
        invalidated_entries,
    }))
}

pub async fn invalidate_all_caches(State(state): State<AppState>) -> impl IntoResponse {
    let invalidated_entries = state.service.invalidate_all();
    info!("🧹 Invalidated all {} cached leaderboards", invalidated_entries);

    Json(SuccessResponse::new(CacheInvalidationResponse {
        token_id: None,
        invalidated_entries,
    }))
}
