use chrono::{DateTime, Utc};
use leaderboard_service::LeaderboardOptions;
use serde::{Deserialize, Serialize};

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub ledger_enabled: bool,
    /// `None` when no database is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_reachable: Option<bool>,
    pub cached_leaderboards: usize,
}

/// Query string of `GET /api/leaderboard/:token_id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
    pub session_id: Option<String>,
    /// `false` serves stored burn records instead of scanning the ledger
    pub use_blockchain: Option<bool>,
}

impl From<LeaderboardQuery> for LeaderboardOptions {
    fn from(query: LeaderboardQuery) -> Self {
        Self {
            limit: query.limit,
            session_id: query.session_id.filter(|s| !s.is_empty()),
            use_fast_path: query.use_blockchain.unwrap_or(true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CacheInvalidationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    pub invalidated_entries: usize,
}
