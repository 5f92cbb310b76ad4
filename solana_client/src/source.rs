use crate::types::{ParsedTransaction, TransactionSignature};
use crate::Result;
use async_trait::async_trait;

/// Remote ledger index the fetcher reads from.
///
/// One call per method is one remote request; pacing, timeouts and
/// pagination live in [`crate::LedgerFetcher`].
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// One page (1-based) of the asset-indexed signature history
    async fn signatures_for_asset(
        &self,
        asset_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>>;

    /// Signatures touching `address`, newest first, strictly older than `before`
    async fn signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>>;

    /// `Ok(None)` when the node has no body for the signature
    async fn parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>>;
}
