#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use config_manager::{SystemConfig, DEFAULT_BURN_SINK_ADDRESS};
use leaderboard_core::{
    AdvertisingMetadata, ProfileSummary, SessionId, SessionRecord, WalletTotal,
};
use leaderboard_service::LeaderboardService;
use persistence_layer::{
    BurnRecordStore, CreatorStore, InMemoryStore, PersistenceError, ProfileStore, SessionStore,
};
use rust_decimal::Decimal;
use serde_json::json;
use solana_client::{LedgerSource, ParsedTransaction, SolanaClientError, TransactionSignature};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MINT: &str = "BurnMint1111111111111111111111111111111111";

pub fn burn_tx(wallet: &str, amount: u64, block_time: i64) -> ParsedTransaction {
    serde_json::from_value(json!({
        "slot": 1,
        "blockTime": block_time,
        "meta": {"err": null},
        "transaction": {
            "signatures": ["sig"],
            "message": {"instructions": [{
                "program": "spl-token",
                "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "parsed": {"type": "burn", "info": {
                    "mint": MINT,
                    "authority": wallet,
                    "account": "token-account",
                    "amount": amount.to_string()
                }}
            }]}
        }
    }))
    .unwrap()
}

pub fn sink_transfer_tx(wallet: &str, amount: u64, block_time: i64) -> ParsedTransaction {
    serde_json::from_value(json!({
        "blockTime": block_time,
        "meta": {"err": null},
        "transaction": {"message": {"instructions": [{
            "program": "spl-token",
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "parsed": {"type": "transferChecked", "info": {
                "mint": MINT,
                "authority": wallet,
                "source": "token-account",
                "destination": DEFAULT_BURN_SINK_ADDRESS,
                "tokenAmount": {"amount": amount.to_string(), "decimals": 6}
            }}
        }]}}
    }))
    .unwrap()
}

pub fn swap_tx(block_time: i64) -> ParsedTransaction {
    serde_json::from_value(json!({
        "blockTime": block_time,
        "meta": {"err": null},
        "transaction": {"message": {"instructions": [{
            "program": "spl-token",
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "parsed": {"type": "transfer", "info": {
                "source": "a", "destination": "b", "authority": "W9", "amount": "10"
            }}
        }]}}
    }))
    .unwrap()
}

/// Swap that unwraps SOL: a transfer plus the wSOL account close
pub fn close_swap_tx(owner: &str, block_time: i64) -> ParsedTransaction {
    serde_json::from_value(json!({
        "blockTime": block_time,
        "meta": {"err": null},
        "transaction": {"message": {"instructions": [
            {
                "program": "spl-token",
                "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "parsed": {"type": "transfer", "info": {
                    "source": "a", "destination": "b", "authority": owner, "amount": "10"
                }}
            },
            {
                "program": "spl-token",
                "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "parsed": {"type": "closeAccount", "info": {
                    "account": "wsol-account", "destination": owner, "owner": owner
                }}
            }
        ]}}
    }))
    .unwrap()
}

/// Scriptable ledger with call counters
#[derive(Default)]
pub struct FakeLedger {
    pub asset_signatures: Vec<String>,
    pub address_signatures: Vec<String>,
    pub transactions: HashMap<String, ParsedTransaction>,
    pub fail_asset: bool,
    pub fail_address: bool,
    pub asset_calls: AtomicUsize,
    pub address_calls: AtomicUsize,
    pub transaction_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction listed on both paths
    pub fn with_tx(mut self, signature: &str, tx: ParsedTransaction) -> Self {
        self.asset_signatures.push(signature.to_string());
        self.address_signatures.push(signature.to_string());
        self.transactions.insert(signature.to_string(), tx);
        self
    }

    /// Transaction only the slow path sees
    pub fn with_slow_only_tx(mut self, signature: &str, tx: ParsedTransaction) -> Self {
        self.address_signatures.push(signature.to_string());
        self.transactions.insert(signature.to_string(), tx);
        self
    }

    pub fn failing_fast_path(mut self) -> Self {
        self.fail_asset = true;
        self
    }

    pub fn failing_slow_path(mut self) -> Self {
        self.fail_address = true;
        self
    }

    pub fn ledger_calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
            + self.address_calls.load(Ordering::SeqCst)
            + self.transaction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerSource for FakeLedger {
    async fn signatures_for_asset(
        &self,
        _asset_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>, SolanaClientError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_asset {
            return Err(SolanaClientError::Unauthorized("HTTP 401".to_string()));
        }
        Ok(self
            .asset_signatures
            .iter()
            .skip((page as usize - 1) * limit as usize)
            .take(limit as usize)
            .map(|s| TransactionSignature::new(s.clone()))
            .collect())
    }

    async fn signatures_for_address(
        &self,
        _address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>, SolanaClientError> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_address {
            return Err(SolanaClientError::InvalidResponse("HTTP 503".to_string()));
        }
        let start = before
            .and_then(|b| self.address_signatures.iter().position(|s| s == b))
            .map_or(0, |i| i + 1);
        Ok(self
            .address_signatures
            .iter()
            .skip(start)
            .take(limit as usize)
            .map(|s| TransactionSignature::new(s.clone()))
            .collect())
    }

    async fn parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, SolanaClientError> {
        self.transaction_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transactions.get(signature).cloned())
    }
}

/// Config with every pacing delay disabled
pub fn test_config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.ledger.api_key = "test-key".to_string();
    config.ledger.signature_page_delay_ms = 0;
    config.ledger.transaction_fetch_delay_ms = 0;
    config.ledger.slow_path_chunk_pause_ms = 0;
    config
}

pub fn service(ledger: Arc<FakeLedger>, store: Arc<InMemoryStore>) -> LeaderboardService {
    LeaderboardService::with_source(&test_config(), ledger, store).unwrap()
}

pub fn session_id(n: u8) -> SessionId {
    SessionId::parse(&format!("{:024x}", n)).unwrap()
}

pub fn session(n: u8, start: i64, end: Option<i64>, active: bool) -> SessionRecord {
    SessionRecord {
        id: session_id(n),
        token_id: MINT.to_string(),
        start_time: Utc.timestamp_opt(start, 0).unwrap(),
        end_time: end.map(|e| Utc.timestamp_opt(e, 0).unwrap()),
        is_active: active,
        total_burns: Decimal::ZERO,
        participant_count: 0,
    }
}

/// In-memory store whose profile and burn-record reads can be made to fail
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_profiles: bool,
    pub fail_burns: bool,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            fail_profiles: false,
            fail_burns: false,
        }
    }

    fn outage() -> PersistenceError {
        PersistenceError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn find_active_session(
        &self,
        token_id: &str,
    ) -> persistence_layer::Result<Option<SessionRecord>> {
        self.inner.find_active_session(token_id).await
    }

    async fn find_session_by_id(
        &self,
        id: &SessionId,
    ) -> persistence_layer::Result<Option<SessionRecord>> {
        self.inner.find_session_by_id(id).await
    }
}

#[async_trait]
impl CreatorStore for FlakyStore {
    async fn current_session_pointer(
        &self,
        token_id: &str,
    ) -> persistence_layer::Result<Option<SessionId>> {
        self.inner.current_session_pointer(token_id).await
    }
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn find_user_profile(
        &self,
        user_id: &str,
    ) -> persistence_layer::Result<Option<ProfileSummary>> {
        if self.fail_profiles {
            return Err(Self::outage());
        }
        self.inner.find_user_profile(user_id).await
    }

    async fn find_user_id_by_wallet(&self, wallet: &str) -> persistence_layer::Result<Option<String>> {
        if self.fail_profiles {
            return Err(Self::outage());
        }
        self.inner.find_user_id_by_wallet(wallet).await
    }

    async fn find_advertising_metadata(
        &self,
        wallet: &str,
        token_id: &str,
    ) -> persistence_layer::Result<Option<AdvertisingMetadata>> {
        if self.fail_profiles {
            return Err(Self::outage());
        }
        self.inner.find_advertising_metadata(wallet, token_id).await
    }
}

#[async_trait]
impl BurnRecordStore for FlakyStore {
    async fn sum_burns_by_wallet(
        &self,
        token_id: &str,
        session_id: Option<&SessionId>,
    ) -> persistence_layer::Result<Vec<WalletTotal>> {
        if self.fail_burns {
            return Err(Self::outage());
        }
        self.inner.sum_burns_by_wallet(token_id, session_id).await
    }
}
