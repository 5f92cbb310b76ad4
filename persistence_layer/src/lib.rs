use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leaderboard_core::{
    AdvertisingMetadata, LeaderboardError, ProfileSummary, SessionId, SessionRecord, WalletTotal,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod postgres_client;

pub use memory::InMemoryStore;
pub use postgres_client::PostgresClient;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Pool creation error: {0}")]
    PoolCreation(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl From<PersistenceError> for LeaderboardError {
    fn from(err: PersistenceError) -> Self {
        LeaderboardError::Storage(err.to_string())
    }
}

/// A burn as recorded by the application when a user burned through it.
/// Only read here, as the degraded-mode data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRecord {
    pub token_id: String,
    pub session_id: Option<SessionId>,
    pub wallet: String,
    pub user_id: Option<String>,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The token's live session, if one is running
    async fn find_active_session(&self, token_id: &str) -> Result<Option<SessionRecord>>;

    async fn find_session_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>>;
}

#[async_trait]
pub trait CreatorStore: Send + Sync {
    /// Session the token's creator currently points at
    async fn current_session_pointer(&self, token_id: &str) -> Result<Option<SessionId>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_user_profile(&self, user_id: &str) -> Result<Option<ProfileSummary>>;

    async fn find_user_id_by_wallet(&self, wallet: &str) -> Result<Option<String>>;

    async fn find_advertising_metadata(
        &self,
        wallet: &str,
        token_id: &str,
    ) -> Result<Option<AdvertisingMetadata>>;
}

#[async_trait]
pub trait BurnRecordStore: Send + Sync {
    /// Stored burns for the token summed per wallet, largest first
    async fn sum_burns_by_wallet(
        &self,
        token_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<WalletTotal>>;
}

/// Everything the leaderboard reads from local storage
pub trait LeaderboardStore: SessionStore + CreatorStore + ProfileStore + BurnRecordStore {}

impl<T> LeaderboardStore for T where T: SessionStore + CreatorStore + ProfileStore + BurnRecordStore {}

/// Largest total first, wallet ascending on ties
pub(crate) fn sort_wallet_totals(totals: &mut [WalletTotal]) {
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.wallet.cmp(&b.wallet)));
}
