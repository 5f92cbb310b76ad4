use crate::{
    sort_wallet_totals, BurnRecord, BurnRecordStore, CreatorStore, PersistenceError, ProfileStore,
    Result, SessionStore,
};
use async_trait::async_trait;
use leaderboard_core::{AdvertisingMetadata, ProfileSummary, SessionId, SessionRecord, WalletTotal};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    sessions: HashMap<SessionId, SessionRecord>,
    creator_pointers: HashMap<String, SessionId>,
    profiles: HashMap<String, ProfileSummary>,
    wallet_users: HashMap<String, String>,
    advertising: HashMap<(String, String), AdvertisingMetadata>,
    burns: Vec<BurnRecord>,
}

/// Process-local store used when no database is configured, and in tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| PersistenceError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write<F: FnOnce(&mut Tables)>(&self, apply: F) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| PersistenceError::Unavailable("in-memory store lock poisoned".to_string()))?;
        apply(&mut tables);
        Ok(())
    }

    pub fn insert_session(&self, session: SessionRecord) -> Result<()> {
        self.write(|t| {
            t.sessions.insert(session.id.clone(), session);
        })
    }

    pub fn set_current_session(&self, token_id: &str, session_id: SessionId) -> Result<()> {
        self.write(|t| {
            t.creator_pointers.insert(token_id.to_string(), session_id);
        })
    }

    /// Register a profile and link the given wallets to it
    pub fn insert_profile(&self, profile: ProfileSummary, wallets: &[&str]) -> Result<()> {
        self.write(|t| {
            for wallet in wallets {
                t.wallet_users
                    .insert(wallet.to_string(), profile.user_id.clone());
            }
            t.profiles.insert(profile.user_id.clone(), profile);
        })
    }

    pub fn insert_advertising(
        &self,
        wallet: &str,
        token_id: &str,
        metadata: AdvertisingMetadata,
    ) -> Result<()> {
        self.write(|t| {
            t.advertising
                .insert((wallet.to_string(), token_id.to_string()), metadata);
        })
    }

    pub fn insert_burn(&self, record: BurnRecord) -> Result<()> {
        self.write(|t| t.burns.push(record))
    }

    pub fn burn_count(&self) -> Result<usize> {
        Ok(self.read()?.burns.len())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn find_active_session(&self, token_id: &str) -> Result<Option<SessionRecord>> {
        let tables = self.read()?;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.is_active && s.token_id == token_id)
            .max_by_key(|s| s.start_time)
            .cloned())
    }

    async fn find_session_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.read()?.sessions.get(id).cloned())
    }
}

#[async_trait]
impl CreatorStore for InMemoryStore {
    async fn current_session_pointer(&self, token_id: &str) -> Result<Option<SessionId>> {
        Ok(self.read()?.creator_pointers.get(token_id).cloned())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn find_user_profile(&self, user_id: &str) -> Result<Option<ProfileSummary>> {
        Ok(self.read()?.profiles.get(user_id).cloned())
    }

    async fn find_user_id_by_wallet(&self, wallet: &str) -> Result<Option<String>> {
        Ok(self.read()?.wallet_users.get(wallet).cloned())
    }

    async fn find_advertising_metadata(
        &self,
        wallet: &str,
        token_id: &str,
    ) -> Result<Option<AdvertisingMetadata>> {
        Ok(self
            .read()?
            .advertising
            .get(&(wallet.to_string(), token_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl BurnRecordStore for InMemoryStore {
    async fn sum_burns_by_wallet(
        &self,
        token_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Vec<WalletTotal>> {
        let tables = self.read()?;
        let mut grouped: HashMap<&str, WalletTotal> = HashMap::new();

        for record in tables.burns.iter().filter(|r| {
            r.token_id == token_id && session_id.map_or(true, |id| r.session_id.as_ref() == Some(id))
        }) {
            let entry = grouped
                .entry(record.wallet.as_str())
                .or_insert_with(|| WalletTotal::new(record.wallet.clone(), Decimal::ZERO));
            entry.total += record.amount;
            if entry.user_id.is_none() {
                entry.user_id = record.user_id.clone();
            }
        }

        let mut totals: Vec<WalletTotal> = grouped.into_values().collect();
        sort_wallet_totals(&mut totals);
        debug!("Summed stored burns for {} into {} wallets", token_id, totals.len());
        Ok(totals)
    }
}
