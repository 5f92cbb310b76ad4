use crate::source::LedgerSource;
use crate::types::{
    AssetSignaturesPage, ParsedTransaction, RpcResponse, SignatureInfo, TransactionSignature,
};
use crate::{Result, SolanaClientError};
use async_trait::async_trait;
use config_manager::LedgerConfig;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaClientConfig {
    /// Full JSON-RPC endpoint, api key included
    pub rpc_url: String,
    /// Request timeout in seconds
    pub rpc_timeout_seconds: u64,
}

impl Default for SolanaClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://mainnet.helius-rpc.com".to_string(),
            rpc_timeout_seconds: 30,
        }
    }
}

impl From<&LedgerConfig> for SolanaClientConfig {
    fn from(ledger: &LedgerConfig) -> Self {
        Self {
            rpc_url: ledger.rpc_endpoint(),
            rpc_timeout_seconds: ledger.request_timeout_seconds,
        }
    }
}

/// JSON-RPC client for a Helius-compatible Solana endpoint (DAS + standard RPC)
#[derive(Clone)]
pub struct SolanaClient {
    config: SolanaClientConfig,
    http_client: Client,
    request_id_counter: Arc<AtomicU64>,
}

impl SolanaClient {
    pub fn new(config: SolanaClientConfig) -> Result<Self> {
        if config.rpc_url.is_empty() {
            return Err(SolanaClientError::Config("rpc_url cannot be empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
            request_id_counter: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn from_ledger_config(ledger: &LedgerConfig) -> Result<Self> {
        Self::new(SolanaClientConfig::from(ledger))
    }

    fn next_request_id(&self) -> u64 {
        self.request_id_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Helius DAS `getSignaturesForAsset`
    pub async fn get_signatures_for_asset(
        &self,
        asset_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>> {
        let params = json!({
            "id": asset_id,
            "page": page,
            "limit": limit,
        });

        let result = self.rpc_call("getSignaturesForAsset", params).await?;
        let Some(result) = result else {
            return Ok(vec![]);
        };

        let page_data: AssetSignaturesPage = serde_json::from_value(result)?;
        debug!(
            "📄 DAS page {} for {}: {} items (total {:?})",
            page,
            asset_id,
            page_data.items.len(),
            page_data.total
        );
        Ok(page_data.items.into_iter().map(Into::into).collect())
    }

    /// Standard `getSignaturesForAddress`
    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>> {
        let mut options = serde_json::Map::new();
        if let Some(before_sig) = before {
            options.insert("before".to_string(), json!(before_sig));
        }
        options.insert("limit".to_string(), json!(limit));

        let result = self
            .rpc_call("getSignaturesForAddress", json!([address, options]))
            .await?;
        let Some(result) = result else {
            return Ok(vec![]);
        };

        let sig_infos: Vec<SignatureInfo> = serde_json::from_value(result)?;
        Ok(sig_infos.into_iter().map(Into::into).collect())
    }

    /// `getTransaction` with `jsonParsed` encoding
    pub async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>> {
        let params = json!([
            signature,
            {
                "encoding": "jsonParsed",
                "maxSupportedTransactionVersion": 0
            }
        ]);

        match self.rpc_call("getTransaction", params).await? {
            Some(result) => Ok(Some(serde_json::from_value(result)?)),
            None => Ok(None),
        }
    }

    /// Send one JSON-RPC request; a `null` result comes back as `None`
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Option<Value>> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
            "params": params
        });

        let response = self
            .http_client
            .post(&self.config.rpc_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SolanaClientError::Timeout(self.config.rpc_timeout_seconds)
                } else {
                    SolanaClientError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("🔑 {} rejected with HTTP {}", method, status);
            return Err(SolanaClientError::Unauthorized(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(SolanaClientError::InvalidResponse(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let rpc_response: RpcResponse<Value> = response.json().await?;
        if let Some(error) = rpc_response.error {
            return Err(SolanaClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result.filter(|value| !value.is_null()))
    }
}

#[async_trait]
impl LedgerSource for SolanaClient {
    async fn signatures_for_asset(
        &self,
        asset_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>> {
        self.get_signatures_for_asset(asset_id, page, limit).await
    }

    async fn signatures_for_address(
        &self,
        address: &str,
        before: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionSignature>> {
        self.get_signatures_for_address(address, before, limit).await
    }

    async fn parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>> {
        self.get_parsed_transaction(signature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_rejected() {
        let result = SolanaClient::new(SolanaClientConfig {
            rpc_url: String::new(),
            rpc_timeout_seconds: 30,
        });
        assert!(matches!(result, Err(SolanaClientError::Config(_))));
    }

    #[test]
    fn test_config_from_ledger_settings() {
        let mut ledger = config_manager::SystemConfig::default().ledger;
        ledger.api_key = "abc123".to_string();
        ledger.request_timeout_seconds = 12;

        let config = SolanaClientConfig::from(&ledger);
        assert_eq!(config.rpc_url, ledger.rpc_endpoint());
        assert!(config.rpc_url.contains("api-key=abc123"));
        assert_eq!(config.rpc_timeout_seconds, 12);
    }

    #[test]
    fn test_request_ids_increase() {
        let client = SolanaClient::new(SolanaClientConfig::default()).unwrap();
        let first = client.next_request_id();
        let second = client.clone().next_request_id();
        assert_eq!(second, first + 1);
    }
}
