use config_manager::SystemConfig;
use leaderboard_core::{BurnEvent, BurnKind, LeaderboardError, Result};
use solana_client::{LedgerFetcher, SignatureScope, TransactionSignature};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tx_parser::BurnClassifier;

/// Discovery state machine: fast path, then slow path, then give up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    FastPath,
    SlowPath,
    Exhausted,
}

/// Which path produced a discovery result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPath {
    /// Asset-indexed signature history
    Fast,
    /// Direct scan of the mint address' signatures
    Slow,
}

impl DiscoveryPath {
    fn scope(&self, mint: &str) -> SignatureScope {
        match self {
            DiscoveryPath::Fast => SignatureScope::Asset(mint.to_string()),
            DiscoveryPath::Slow => SignatureScope::Address(mint.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BurnDiscovery {
    /// Newest first
    pub events: Vec<BurnEvent>,
    pub path: DiscoveryPath,
    /// Signatures whose transaction was requested
    pub scanned: usize,
    /// Signatures with no usable transaction body
    pub skipped: usize,
    /// Scan stopped at the event cap
    pub truncated: bool,
}

impl BurnDiscovery {
    /// Events that carry a burned amount. Account closes only signal a burn.
    pub fn amount_bearing(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind != BurnKind::AccountClose)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub chunk_size: usize,
    pub fast_path_chunk_pause: Duration,
    pub slow_path_chunk_pause: Duration,
    /// Stop scanning once this many amount-bearing events are collected (0 = no cap)
    pub max_burn_events: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            fast_path_chunk_pause: Duration::ZERO,
            slow_path_chunk_pause: Duration::from_millis(1000),
            max_burn_events: 1000,
        }
    }
}

impl From<&SystemConfig> for OrchestratorConfig {
    fn from(config: &SystemConfig) -> Self {
        Self {
            chunk_size: config.ledger.chunk_size.max(1),
            fast_path_chunk_pause: Duration::from_millis(config.ledger.fast_path_chunk_pause_ms),
            slow_path_chunk_pause: Duration::from_millis(config.ledger.slow_path_chunk_pause_ms),
            max_burn_events: config.leaderboard.max_burn_events,
        }
    }
}

/// Runs the fast path and escalates to the slow path when it errors or
/// finds no amount-bearing burn. Reports `AllPathsExhausted` instead of an empty result
/// when neither path could be read.
pub struct FallbackOrchestrator {
    fetcher: LedgerFetcher,
    classifier: BurnClassifier,
    config: OrchestratorConfig,
}

impl FallbackOrchestrator {
    pub fn new(fetcher: LedgerFetcher, classifier: BurnClassifier, config: OrchestratorConfig) -> Self {
        Self {
            fetcher,
            classifier,
            config,
        }
    }

    pub async fn discover(&self, mint: &str) -> Result<BurnDiscovery> {
        let mut state = PathState::FastPath;
        let mut fast_failure = String::new();
        let mut slow_failure = String::new();

        loop {
            state = match state {
                PathState::FastPath => match self.run_path(DiscoveryPath::Fast, mint).await {
                    Ok(discovery) if discovery.amount_bearing() > 0 => return Ok(discovery),
                    Ok(discovery) => {
                        info!(
                            "🔄 Fast path found no burns for {} ({} scanned), escalating to slow path",
                            mint, discovery.scanned
                        );
                        fast_failure = "no burn events found".to_string();
                        PathState::SlowPath
                    }
                    Err(e) => {
                        warn!("🔄 Fast path failed for {}: {}, escalating to slow path", mint, e);
                        fast_failure = e.to_string();
                        PathState::SlowPath
                    }
                },
                PathState::SlowPath => match self.run_path(DiscoveryPath::Slow, mint).await {
                    Ok(discovery) => return Ok(discovery),
                    Err(e) => {
                        error!("❌ Slow path failed for {}: {}", mint, e);
                        slow_failure = e.to_string();
                        PathState::Exhausted
                    }
                },
                PathState::Exhausted => {
                    return Err(LeaderboardError::AllPathsExhausted {
                        fast_path: fast_failure,
                        slow_path: slow_failure,
                    })
                }
            };
        }
    }

    async fn run_path(&self, path: DiscoveryPath, mint: &str) -> Result<BurnDiscovery> {
        let signatures = self
            .fetcher
            .list_signatures(&path.scope(mint))
            .await
            .map_err(|e| LeaderboardError::RemoteApiUnavailable(e.to_string()))?;

        let pause = match path {
            DiscoveryPath::Fast => self.config.fast_path_chunk_pause,
            DiscoveryPath::Slow => self.config.slow_path_chunk_pause,
        };

        let mut burns = 0usize;
        let mut discovery = BurnDiscovery {
            events: Vec::new(),
            path,
            scanned: 0,
            skipped: 0,
            truncated: false,
        };

        'chunks: for (index, chunk) in signatures.chunks(self.config.chunk_size.max(1)).enumerate() {
            if index > 0 && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            debug!(
                "📦 {:?} path chunk {} for {}: {} signatures",
                path,
                index + 1,
                mint,
                chunk.len()
            );

            for signature in chunk {
                discovery.scanned += 1;
                match self.classify_signature(signature, mint).await {
                    Classified::Burn(event) => {
                        if event.kind != BurnKind::AccountClose {
                            burns += 1;
                        }
                        discovery.events.push(event);
                    }
                    Classified::NotBurn => continue,
                    Classified::Unavailable => {
                        discovery.skipped += 1;
                        continue;
                    }
                }

                if self.config.max_burn_events > 0 && burns >= self.config.max_burn_events {
                    info!(
                        "✋ Reached {} burn events for {}, stopping scan",
                        self.config.max_burn_events, mint
                    );
                    discovery.truncated = true;
                    break 'chunks;
                }
            }
        }

        discovery
            .events
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.signature.cmp(&b.signature)));

        info!(
            "🔥 {:?} path for {}: {} burns from {} signatures",
            path,
            mint,
            discovery.events.len(),
            discovery.scanned
        );
        Ok(discovery)
    }

    async fn classify_signature(&self, signature: &TransactionSignature, mint: &str) -> Classified {
        let Some(transaction) = self.fetcher.fetch_parsed(&signature.signature).await else {
            let failure = LeaderboardError::ParseFailure {
                signature: signature.signature.clone(),
                reason: "no usable transaction body".to_string(),
            };
            debug!("{}", failure);
            return Classified::Unavailable;
        };

        match self.classifier.classify(&transaction, &signature.signature, mint) {
            Some(mut event) => {
                if event.timestamp == 0 {
                    if let Some(block_time) = signature.block_time {
                        event.timestamp = block_time;
                    }
                }
                Classified::Burn(event)
            }
            None => Classified::NotBurn,
        }
    }
}

enum Classified {
    Burn(BurnEvent),
    NotBurn,
    Unavailable,
}
