pub mod aggregation;
pub mod session;
pub mod types;

pub use aggregation::{aggregate_burns, rank_totals, AggregationOptions};
pub use config_manager::{AggregationMode, AmountPolicy};
pub use session::{SessionId, SessionRecord, SessionSummary, TimeWindow};
pub use types::{
    AdvertisingMetadata, BurnEvent, BurnKind, DataSource, LeaderboardEntry, LeaderboardResponse,
    ProfileSummary, WalletTotal,
};

use thiserror::Error;

/// Failure taxonomy of the leaderboard read path.
///
/// Only `InvalidSessionId` and `SessionNotFound` are meant to reach an end
/// caller; everything else is absorbed, escalated or degraded upstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeaderboardError {
    #[error("Invalid sessionId format: {0}")]
    InvalidSessionId(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Remote ledger API unavailable: {0}")]
    RemoteApiUnavailable(String),
    #[error("Failed to parse transaction {signature}: {reason}")]
    ParseFailure { signature: String, reason: String },
    #[error("All burn discovery paths exhausted (fast path: {fast_path}; slow path: {slow_path})")]
    AllPathsExhausted { fast_path: String, slow_path: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config_manager::ConfigurationError> for LeaderboardError {
    fn from(err: config_manager::ConfigurationError) -> Self {
        LeaderboardError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
