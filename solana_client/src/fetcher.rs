use crate::source::LedgerSource;
use crate::types::{ParsedTransaction, TransactionSignature};
use crate::{Result, SolanaClientError};
use config_manager::LedgerConfig;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a signature listing is keyed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureScope {
    /// Asset-indexed history (DAS), paged by number
    Asset(String),
    /// Every signature touching the address, paged by `before` cursor
    Address(String),
}

impl SignatureScope {
    pub fn target(&self) -> &str {
        match self {
            SignatureScope::Asset(id) | SignatureScope::Address(id) => id,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SignatureScope::Asset(_) => "asset",
            SignatureScope::Address(_) => "address",
        }
    }
}

/// Where the next listing request resumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Start,
    Page(u32),
    Before(String),
}

#[derive(Debug, Clone)]
pub struct SignaturePage {
    pub signatures: Vec<TransactionSignature>,
    /// `None` once the listing is complete
    pub next: Option<PageCursor>,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub page_size: u32,
    /// Cap for asset-scoped listings (0 = unlimited)
    pub max_signatures: usize,
    /// Cap for address-scoped listings (0 = unlimited)
    pub address_max_signatures: usize,
    pub request_timeout: Duration,
    pub page_delay_ms: u64,
    pub transaction_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_signatures: 50_000,
            address_max_signatures: 1000,
            request_timeout: Duration::from_secs(30),
            page_delay_ms: 200,
            transaction_delay_ms: 50,
        }
    }
}

impl From<&LedgerConfig> for FetcherConfig {
    fn from(ledger: &LedgerConfig) -> Self {
        Self {
            page_size: ledger.das_page_size,
            max_signatures: ledger.max_signatures,
            address_max_signatures: ledger.slow_path_max_signatures,
            request_timeout: Duration::from_secs(ledger.request_timeout_seconds),
            page_delay_ms: ledger.signature_page_delay_ms,
            transaction_delay_ms: ledger.transaction_fetch_delay_ms,
        }
    }
}

/// Paginated, paced access to a [`LedgerSource`]
pub struct LedgerFetcher {
    source: Arc<dyn LedgerSource>,
    config: FetcherConfig,
}

impl LedgerFetcher {
    pub fn new(source: Arc<dyn LedgerSource>, config: FetcherConfig) -> Result<Self> {
        if config.page_size == 0 {
            return Err(SolanaClientError::Config("page_size must be greater than 0".to_string()));
        }

        Ok(Self { source, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch one listing page. Ends the listing when the page comes back
    /// shorter than requested.
    pub async fn list_signatures_page(
        &self,
        scope: &SignatureScope,
        cursor: &PageCursor,
        limit: u32,
    ) -> Result<SignaturePage> {
        let limit = limit.clamp(1, self.config.page_size);

        let signatures = match (scope, cursor) {
            (SignatureScope::Asset(asset_id), PageCursor::Start | PageCursor::Page(_)) => {
                let page = match cursor {
                    PageCursor::Page(n) => *n,
                    _ => 1,
                };
                self.with_timeout(self.source.signatures_for_asset(asset_id, page, limit))
                    .await?
            }
            (SignatureScope::Address(address), PageCursor::Start | PageCursor::Before(_)) => {
                let before = match cursor {
                    PageCursor::Before(sig) => Some(sig.as_str()),
                    _ => None,
                };
                self.with_timeout(self.source.signatures_for_address(address, before, limit))
                    .await?
            }
            _ => {
                return Err(SolanaClientError::Config(format!(
                    "cursor {:?} does not apply to {} listings",
                    cursor,
                    scope.label()
                )))
            }
        };

        let next = if signatures.len() < limit as usize {
            None
        } else {
            match (scope, cursor) {
                (SignatureScope::Asset(_), PageCursor::Page(n)) => Some(PageCursor::Page(n + 1)),
                (SignatureScope::Asset(_), _) => Some(PageCursor::Page(2)),
                (SignatureScope::Address(_), _) => signatures
                    .last()
                    .map(|last| PageCursor::Before(last.signature.clone())),
            }
        };

        Ok(SignaturePage { signatures, next })
    }

    /// Walk the listing to its end or to the scope's cap.
    ///
    /// A failure on the first page is fatal. A failure on a later page ends
    /// the walk and keeps what was already listed.
    pub async fn list_signatures(&self, scope: &SignatureScope) -> Result<Vec<TransactionSignature>> {
        let cap = match scope {
            SignatureScope::Asset(_) => self.config.max_signatures,
            SignatureScope::Address(_) => self.config.address_max_signatures,
        };

        let mut seen = HashSet::new();
        let mut signatures = Vec::new();
        let mut cursor = PageCursor::Start;
        let mut pages = 0u32;

        loop {
            if pages > 0 {
                Self::apply_rate_limit(self.config.page_delay_ms).await;
            }

            let limit = match scope {
                // Page numbers only line up with a constant page size
                SignatureScope::Asset(_) => self.config.page_size,
                SignatureScope::Address(_) if cap > 0 => {
                    (cap - signatures.len()).min(self.config.page_size as usize) as u32
                }
                SignatureScope::Address(_) => self.config.page_size,
            };

            let page = match self.list_signatures_page(scope, &cursor, limit).await {
                Ok(page) => page,
                Err(e) if pages == 0 => return Err(e),
                Err(e) => {
                    warn!(
                        "⚠️ {} listing for {} stopped after {} pages: {}",
                        scope.label(),
                        scope.target(),
                        pages,
                        e
                    );
                    break;
                }
            };
            pages += 1;

            let page_len = page.signatures.len();
            for signature in page.signatures {
                // DAS repeats a signature once per instruction type it matched
                if seen.insert(signature.signature.clone()) {
                    signatures.push(signature);
                }
            }
            debug!(
                "✍️ {} page {} for {}: {} signatures, {} total",
                scope.label(),
                pages,
                scope.target(),
                page_len,
                signatures.len()
            );

            if cap > 0 && signatures.len() >= cap {
                signatures.truncate(cap);
                info!(
                    "✂️ {} listing for {} capped at {} signatures",
                    scope.label(),
                    scope.target(),
                    cap
                );
                break;
            }

            match page.next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        info!(
            "📋 Listed {} signatures for {} ({} scope, {} pages)",
            signatures.len(),
            scope.target(),
            scope.label(),
            pages
        );
        Ok(signatures)
    }

    /// Fetch one parsed transaction. Every failure is logged and reported as
    /// absent so a batch never aborts on a single signature.
    pub async fn fetch_parsed(&self, signature: &str) -> Option<ParsedTransaction> {
        let result = self
            .with_timeout(self.source.parsed_transaction(signature))
            .await;
        Self::apply_rate_limit(self.config.transaction_delay_ms).await;

        match result {
            Ok(Some(tx)) => Some(tx),
            Ok(None) => {
                debug!("No transaction body returned for {}", signature);
                None
            }
            Err(e) => {
                warn!("❌ Failed to fetch transaction {}: {}", signature, e);
                None
            }
        }
    }

    /// Pause between requests against the same upstream
    async fn apply_rate_limit(delay_ms: u64) {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    async fn with_timeout<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SolanaClientError::Timeout(self.config.request_timeout.as_secs())),
        }
    }
}
