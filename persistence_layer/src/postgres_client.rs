use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leaderboard_core::{AdvertisingMetadata, ProfileSummary, SessionId, SessionRecord, WalletTotal};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    sort_wallet_totals, BurnRecordStore, CreatorStore, PersistenceError, ProfileStore,
    Result, SessionStore,
};

/// PostgreSQL-backed implementation of the leaderboard's storage collaborators
#[derive(Debug, Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await
            .map_err(|e| {
                PersistenceError::PoolCreation(format!("PostgreSQL connection error: {}", e))
            })?;

        info!("PostgreSQL pool initialized: max_connections=20, min_connections=2, acquire_timeout=30s");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables read by the leaderboard if they are missing
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                token_id TEXT NOT NULL,
                start_time TIMESTAMPTZ NOT NULL,
                end_time TIMESTAMPTZ,
                is_active BOOLEAN NOT NULL DEFAULT FALSE,
                total_burns NUMERIC NOT NULL DEFAULT 0,
                participant_count BIGINT NOT NULL DEFAULT 0
            )",
            "CREATE INDEX IF NOT EXISTS idx_sessions_token_active ON sessions(token_id, is_active)",
            "CREATE TABLE IF NOT EXISTS creators (
                token_id TEXT PRIMARY KEY,
                current_session_id TEXT
            )",
            "CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                username TEXT,
                display_name TEXT,
                profile_image_url TEXT,
                twitter_handle TEXT
            )",
            "CREATE TABLE IF NOT EXISTS user_wallets (
                wallet TEXT PRIMARY KEY,
                user_id TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS advertising (
                wallet TEXT NOT NULL,
                token_id TEXT NOT NULL,
                message TEXT,
                website_url TEXT,
                image_url TEXT,
                contact TEXT,
                PRIMARY KEY (wallet, token_id)
            )",
            "CREATE TABLE IF NOT EXISTS burns (
                id BIGSERIAL PRIMARY KEY,
                token_id TEXT NOT NULL,
                session_id TEXT,
                wallet TEXT NOT NULL,
                user_id TEXT,
                amount NUMERIC NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE INDEX IF NOT EXISTS idx_burns_token_session ON burns(token_id, session_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!("Leaderboard schema ensured");
        Ok(())
    }

    /// Test PostgreSQL connectivity
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1 as test").fetch_one(&self.pool).await?;
        Ok(())
    }

    fn session_from_row(row: &PgRow) -> Result<SessionRecord> {
        let raw_id: String = row.try_get("id")?;
        let id = SessionId::parse(&raw_id)
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        let participant_count: i64 = row.try_get("participant_count")?;

        Ok(SessionRecord {
            id,
            token_id: row.try_get("token_id")?,
            start_time: row.try_get::<DateTime<Utc>, _>("start_time")?,
            end_time: row.try_get::<Option<DateTime<Utc>>, _>("end_time")?,
            is_active: row.try_get("is_active")?,
            total_burns: row.try_get::<Decimal, _>("total_burns")?,
            participant_count: participant_count.max(0) as u64,
        })
    }
}

const SESSION_COLUMNS: &str =
    "id, token_id, start_time, end_time, is_active, total_burns, participant_count";

#[async_trait]
impl SessionStore for PostgresClient {
    async fn find_active_session(&self, token_id: &str) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE token_id = $1 AND is_active = TRUE
             ORDER BY start_time DESC LIMIT 1",
            SESSION_COLUMNS
        ))
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn find_session_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        let row = sqlx::query(&format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::session_from_row).transpose()
    }
}

#[async_trait]
impl CreatorStore for PostgresClient {
    async fn current_session_pointer(&self, token_id: &str) -> Result<Option<SessionId>> {
        let row = sqlx::query("SELECT current_session_id FROM creators WHERE token_id = $1")
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;

        let raw: Option<String> = match row {
            Some(row) => row.try_get("current_session_id")?,
            None => None,
        };

        match raw {
            Some(raw) => match SessionId::parse(&raw) {
                Ok(id) => Ok(Some(id)),
                Err(_) => {
                    debug!("Ignoring malformed session pointer {} for {}", raw, token_id);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProfileStore for PostgresClient {
    async fn find_user_profile(&self, user_id: &str) -> Result<Option<ProfileSummary>> {
        let row = sqlx::query(
            "SELECT user_id, username, display_name, profile_image_url, twitter_handle
             FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ProfileSummary {
                user_id: row.try_get("user_id")?,
                username: row.try_get("username")?,
                display_name: row.try_get("display_name")?,
                profile_image_url: row.try_get("profile_image_url")?,
                twitter_handle: row.try_get("twitter_handle")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_user_id_by_wallet(&self, wallet: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT user_id FROM user_wallets WHERE wallet = $1")
            .bind(wallet)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("user_id")?)),
            None => Ok(None),
        }
    }

    async fn find_advertising_metadata(
        &self,
        wallet: &str,
        token_id: &str,
    ) -> Result<Option<AdvertisingMetadata>> {
        let row = sqlx::query(
            "SELECT message, website_url, image_url, contact
             FROM advertising WHERE wallet = $1 AND token_id = $2",
        )
        .bind(wallet)
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(AdvertisingMetadata {
                message: row.try_get("message")?,
                website_url: row.try_get("website_url")?,
                image_url: row.try_get("image_url")?,
                contact: row.try_get("contact")?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BurnRecordStore for PostgresClient {
    async fn sum_burns_by_wallet(
        &self,
        token_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<WalletTotal>> {
        let rows = sqlx::query(
            "SELECT wallet, MIN(user_id) AS user_id, SUM(amount) AS total
             FROM burns
             WHERE token_id = $1 AND ($2::TEXT IS NULL OR session_id = $2)
             GROUP BY wallet",
        )
        .bind(token_id)
        .bind(session_id.map(SessionId::as_str))
        .fetch_all(&self.pool)
        .await?;

        let mut totals = rows
            .iter()
            .map(|row| -> Result<WalletTotal> {
                Ok(WalletTotal {
                    wallet: row.try_get("wallet")?,
                    user_id: row.try_get("user_id")?,
                    total: row.try_get::<Option<Decimal>, _>("total")?.unwrap_or(Decimal::ZERO),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        sort_wallet_totals(&mut totals);
        debug!("Summed {} stored burn wallets for {}", totals.len(), token_id);
        Ok(totals)
    }
}
