use crate::session::SessionSummary;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a burn was recognised in its transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnKind {
    /// SPL `burn` / `burnChecked`
    Burn,
    /// Transfer of the target mint to the burn sink
    SinkTransfer,
    /// Token account closure; carries no amount
    AccountClose,
}

/// A single burn recovered from the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnEvent {
    pub signature: String,
    pub wallet: String,
    /// Raw token units, before decimals
    pub amount: i128,
    /// Block time in unix seconds (0 when the ledger did not report one)
    pub timestamp: i64,
    pub mint: String,
    pub kind: BurnKind,
}

/// Where a leaderboard's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Blockchain,
    Database,
    DatabaseFallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Blockchain => "blockchain",
            DataSource::Database => "database",
            DataSource::DatabaseFallback => "database_fallback",
        }
    }
}

/// Summed burns for one wallet (or one user, when grouping by identity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTotal {
    pub wallet: String,
    pub user_id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl WalletTotal {
    pub fn new(wallet: impl Into<String>, total: Decimal) -> Self {
        Self {
            wallet: wallet.into(),
            user_id: None,
            total,
        }
    }

    /// Key the total was grouped under
    pub fn group_key(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.wallet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisingMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// One ranked row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub wallet: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_burned: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertising: Option<AdvertisingMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
}

impl LeaderboardEntry {
    pub fn from_total(rank: u32, total: WalletTotal) -> Self {
        Self {
            rank,
            wallet: total.wallet,
            total_burned: total.total,
            user_id: total.user_id,
            advertising: None,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub session: Option<SessionSummary>,
    pub token_id: String,
    pub data_source: DataSource,
}

impl LeaderboardResponse {
    pub fn empty(token_id: impl Into<String>, data_source: DataSource) -> Self {
        Self {
            leaderboard: Vec::new(),
            session: None,
            token_id: token_id.into(),
            data_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_data_source_wire_names() {
        assert_eq!(
            serde_json::to_value(DataSource::DatabaseFallback).unwrap(),
            serde_json::json!("database_fallback")
        );
        assert_eq!(DataSource::Blockchain.as_str(), "blockchain");
    }

    #[test]
    fn test_entry_serializes_camel_case_without_empty_enrichment() {
        let entry = LeaderboardEntry::from_total(1, WalletTotal::new("W1", dec!(500)));
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["rank"], 1);
        assert_eq!(value["wallet"], "W1");
        assert_eq!(value["totalBurned"], 500.0);
        assert!(value.get("profile").is_none());
        assert!(value.get("advertising").is_none());
    }

    #[test]
    fn test_group_key_prefers_user() {
        let mut total = WalletTotal::new("W1", dec!(1));
        assert_eq!(total.group_key(), "W1");
        total.user_id = Some("u1".to_string());
        assert_eq!(total.group_key(), "u1");
    }

    #[test]
    fn test_empty_response_shape() {
        let response = LeaderboardResponse::empty("MINT", DataSource::Database);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["leaderboard"], serde_json::json!([]));
        assert_eq!(value["session"], serde_json::Value::Null);
        assert_eq!(value["tokenId"], "MINT");
        assert_eq!(value["dataSource"], "database");
    }
}
