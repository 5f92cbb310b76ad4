use crate::cache::{CacheKey, ResultCache};
use crate::orchestrator::{FallbackOrchestrator, OrchestratorConfig};
use chrono::Utc;
use config_manager::{AggregationMode, AmountPolicy, SystemConfig};
use leaderboard_core::{
    aggregate_burns, rank_totals, AggregationOptions, BurnEvent, DataSource, LeaderboardEntry,
    LeaderboardError, LeaderboardResponse, Result, SessionId, SessionRecord, WalletTotal,
};
use persistence_layer::LeaderboardStore;
use solana_client::{FetcherConfig, LedgerFetcher, LedgerSource, SolanaClient};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tx_parser::{BurnClassifier, ClassifierConfig};

/// Per-request options
#[derive(Debug, Clone)]
pub struct LeaderboardOptions {
    /// Defaults to the configured limit; clamped to the configured maximum
    pub limit: Option<usize>,
    /// Raw session id as supplied by the caller
    pub session_id: Option<String>,
    /// `false` reads stored burn records instead of the ledger
    pub use_fast_path: bool,
}

impl Default for LeaderboardOptions {
    fn default() -> Self {
        Self {
            limit: None,
            session_id: None,
            use_fast_path: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub over_fetch_multiplier: usize,
    pub aggregation_mode: AggregationMode,
    pub amount_policy: AmountPolicy,
    pub enrich_entries: bool,
    pub cache_ttl: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&SystemConfig::default())
    }
}

impl From<&SystemConfig> for ServiceSettings {
    fn from(config: &SystemConfig) -> Self {
        Self {
            default_limit: config.leaderboard.default_limit,
            max_limit: config.leaderboard.max_limit,
            over_fetch_multiplier: config.leaderboard.over_fetch_multiplier.max(1),
            aggregation_mode: config.leaderboard.aggregation_mode,
            amount_policy: config.leaderboard.amount_policy,
            enrich_entries: config.leaderboard.enrich_entries,
            cache_ttl: Duration::from_secs(config.cache.ttl_seconds),
        }
    }
}

/// Burn leaderboard read path: ledger discovery with stored-record fallback,
/// session scoping, enrichment and response caching
pub struct LeaderboardService {
    orchestrator: Option<FallbackOrchestrator>,
    store: Arc<dyn LeaderboardStore>,
    cache: ResultCache,
    settings: ServiceSettings,
}

impl LeaderboardService {
    /// `orchestrator` may be `None` to serve every request from stored records
    pub fn new(
        orchestrator: Option<FallbackOrchestrator>,
        store: Arc<dyn LeaderboardStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            cache: ResultCache::new(settings.cache_ttl),
            orchestrator,
            store,
            settings,
        }
    }

    /// Wire the service against an arbitrary ledger source
    pub fn with_source(
        config: &SystemConfig,
        source: Arc<dyn LedgerSource>,
        store: Arc<dyn LeaderboardStore>,
    ) -> Result<Self> {
        let fetcher = LedgerFetcher::new(source, FetcherConfig::from(&config.ledger))
            .map_err(|e| LeaderboardError::Configuration(e.to_string()))?;
        let orchestrator = FallbackOrchestrator::new(
            fetcher,
            BurnClassifier::new(ClassifierConfig::from(&config.ledger)),
            OrchestratorConfig::from(config),
        );

        Ok(Self::new(Some(orchestrator), store, ServiceSettings::from(config)))
    }

    /// Wire the service from configuration, talking to the configured RPC endpoint
    pub fn from_config(config: &SystemConfig, store: Arc<dyn LeaderboardStore>) -> Result<Self> {
        if !config.ledger.enabled {
            info!("📴 Ledger access disabled, serving leaderboards from stored burns only");
            return Ok(Self::new(None, store, ServiceSettings::from(config)));
        }

        let client = SolanaClient::from_ledger_config(&config.ledger)
            .map_err(|e| LeaderboardError::Configuration(e.to_string()))?;
        Self::with_source(config, Arc::new(client), store)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn ledger_enabled(&self) -> bool {
        self.orchestrator.is_some()
    }

    pub async fn get_leaderboard(
        &self,
        token_id: &str,
        options: LeaderboardOptions,
    ) -> Result<LeaderboardResponse> {
        // Validate before touching the cache, the stores or the ledger
        let explicit_session = options
            .session_id
            .as_deref()
            .map(SessionId::parse)
            .transpose()?;
        let limit = options
            .limit
            .unwrap_or(self.settings.default_limit)
            .clamp(1, self.settings.max_limit.max(1));

        let key = CacheKey::new(token_id, explicit_session.as_ref(), limit, options.use_fast_path);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let session = match &explicit_session {
            Some(id) => Some(
                self.store
                    .find_session_by_id(id)
                    .await?
                    .ok_or_else(|| LeaderboardError::SessionNotFound(id.to_string()))?,
            ),
            None => self.resolve_current_session(token_id).await,
        };

        let candidate_count = limit.saturating_mul(self.settings.over_fetch_multiplier);
        let (totals, data_source) = match (&self.orchestrator, options.use_fast_path) {
            (Some(orchestrator), true) => match orchestrator.discover(token_id).await {
                Ok(discovery) => {
                    debug!(
                        "Discovered {} burns for {} via {:?} path ({} skipped)",
                        discovery.events.len(),
                        token_id,
                        discovery.path,
                        discovery.skipped
                    );
                    let totals = self
                        .aggregate_events(&discovery.events, session.as_ref())
                        .await;
                    (totals, DataSource::Blockchain)
                }
                Err(e) => {
                    warn!("⚠️ Ledger discovery failed for {}: {}. Falling back to stored burns", token_id, e);
                    let totals = match self.stored_totals(token_id, session.as_ref()).await {
                        Ok(totals) => totals,
                        Err(store_err) => {
                            error!(
                                "❌ Stored burns unavailable for {} after ledger failure: {}",
                                token_id, store_err
                            );
                            Vec::new()
                        }
                    };
                    (totals, DataSource::DatabaseFallback)
                }
            },
            _ => (
                self.stored_totals(token_id, session.as_ref()).await?,
                DataSource::Database,
            ),
        };

        let mut leaderboard = rank_totals(totals, candidate_count);
        if self.settings.enrich_entries {
            leaderboard = self.enrich(token_id, leaderboard).await;
        }
        leaderboard.truncate(limit);

        let response = LeaderboardResponse {
            leaderboard,
            session: session.as_ref().map(SessionRecord::summary),
            token_id: token_id.to_string(),
            data_source,
        };

        if data_source != DataSource::DatabaseFallback {
            self.cache.put(key, response.clone());
        }

        info!(
            "🏆 Leaderboard for {}: {} entries from {}",
            token_id,
            response.leaderboard.len(),
            data_source.as_str()
        );
        Ok(response)
    }

    /// Drop cached leaderboards for one token
    pub fn invalidate(&self, token_id: &str) -> usize {
        self.cache.invalidate(token_id)
    }

    pub fn invalidate_all(&self) -> usize {
        self.cache.invalidate_all()
    }

    /// Creator's session pointer first, then the token's active session.
    /// Lookup failures fall through to the full history.
    async fn resolve_current_session(&self, token_id: &str) -> Option<SessionRecord> {
        match self.store.current_session_pointer(token_id).await {
            Ok(Some(pointer)) => match self.store.find_session_by_id(&pointer).await {
                Ok(Some(session)) => return Some(session),
                Ok(None) => debug!("Session pointer {} for {} has no session", pointer, token_id),
                Err(e) => warn!("⚠️ Failed to load session {} for {}: {}", pointer, token_id, e),
            },
            Ok(None) => {}
            Err(e) => warn!("⚠️ Failed to read session pointer for {}: {}", token_id, e),
        }

        match self.store.find_active_session(token_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!("⚠️ Failed to read active session for {}: {}", token_id, e);
                None
            }
        }
    }

    async fn aggregate_events(
        &self,
        events: &[BurnEvent],
        session: Option<&SessionRecord>,
    ) -> Vec<WalletTotal> {
        let identities = match self.settings.aggregation_mode {
            AggregationMode::Current => self.wallet_identities(events).await,
            AggregationMode::Legacy => HashMap::new(),
        };

        let options = AggregationOptions::new(Utc::now().timestamp())
            .with_window(session.map(SessionRecord::window))
            .with_amount_policy(self.settings.amount_policy)
            .with_mode(self.settings.aggregation_mode)
            .with_identities(&identities);

        aggregate_burns(events, &options)
    }

    async fn wallet_identities(&self, events: &[BurnEvent]) -> HashMap<String, String> {
        let mut identities = HashMap::new();
        let mut looked_up = HashSet::new();

        for event in events {
            if !looked_up.insert(event.wallet.as_str()) {
                continue;
            }
            match self.store.find_user_id_by_wallet(&event.wallet).await {
                Ok(Some(user_id)) => {
                    identities.insert(event.wallet.clone(), user_id);
                }
                Ok(None) => {}
                Err(e) => debug!("User lookup failed for {}: {}", event.wallet, e),
            }
        }

        identities
    }

    async fn stored_totals(
        &self,
        token_id: &str,
        session: Option<&SessionRecord>,
    ) -> Result<Vec<WalletTotal>> {
        let totals = self
            .store
            .sum_burns_by_wallet(token_id, session.map(|s| &s.id))
            .await?;
        Ok(totals)
    }

    /// Attach advertising and profile data. Any lookup failure returns the
    /// rows exactly as ranked.
    async fn enrich(&self, token_id: &str, entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
        let mut enriched = entries.clone();

        for entry in enriched.iter_mut() {
            if let Err(e) = self.enrich_entry(token_id, entry).await {
                warn!("⚠️ Enrichment failed for {}: {}. Returning plain entries", token_id, e);
                return entries;
            }
        }

        enriched
    }

    async fn enrich_entry(&self, token_id: &str, entry: &mut LeaderboardEntry) -> Result<()> {
        let user_id = match &entry.user_id {
            Some(user_id) => Some(user_id.clone()),
            None => self.store.find_user_id_by_wallet(&entry.wallet).await?,
        };

        if let Some(user_id) = &user_id {
            entry.profile = self.store.find_user_profile(user_id).await?;
        }
        entry.user_id = user_id;
        entry.advertising = self
            .store
            .find_advertising_metadata(&entry.wallet, token_id)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_use_ledger() {
        let options = LeaderboardOptions::default();
        assert!(options.use_fast_path);
        assert!(options.limit.is_none());
        assert!(options.session_id.is_none());
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = SystemConfig::default();
        config.leaderboard.over_fetch_multiplier = 3;
        config.cache.ttl_seconds = 5;

        let settings = ServiceSettings::from(&config);
        assert_eq!(settings.over_fetch_multiplier, 3);
        assert_eq!(settings.cache_ttl, Duration::from_secs(5));
        assert_eq!(settings.default_limit, 10);
        assert_eq!(settings.max_limit, 100);
    }
}
