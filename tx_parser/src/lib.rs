// Burn classification over jsonParsed Solana transactions

use config_manager::{LedgerConfig, DEFAULT_BURN_SINK_ADDRESS};
use leaderboard_core::{BurnEvent, BurnKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_client::{ParsedInstruction, ParsedTransaction};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Missing required data: {0}")]
    MissingData(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Configuration for burn classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Transfers of the target mint to this address count as burns
    pub burn_sink_address: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            burn_sink_address: DEFAULT_BURN_SINK_ADDRESS.to_string(),
        }
    }
}

impl From<&LedgerConfig> for ClassifierConfig {
    fn from(ledger: &LedgerConfig) -> Self {
        Self {
            burn_sink_address: ledger.burn_sink_address.clone(),
        }
    }
}

/// Decides whether a transaction burned the target mint.
///
/// Recognised shapes, in precedence order:
/// 1. `burn` / `burnChecked` of the target mint
/// 2. `transfer` / `transferChecked` of the target mint into the burn sink
/// 3. `closeAccount`, only when nothing above matched anywhere in the
///    transaction; recorded with a zero amount
///
/// At most one event is produced per transaction.
#[derive(Debug, Clone, Default)]
pub struct BurnClassifier {
    config: ClassifierConfig,
}

impl BurnClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(
        &self,
        transaction: &ParsedTransaction,
        signature: &str,
        target_mint: &str,
    ) -> Option<BurnEvent> {
        let instructions = match self.usable_instructions(transaction) {
            Ok(instructions) => instructions,
            Err(e) => {
                trace!("Skipping {}: {}", signature, e);
                return None;
            }
        };
        let timestamp = transaction.block_time.unwrap_or(0);

        let amount_burn = instructions
            .iter()
            .find_map(|ix| self.match_amount_burn(ix, target_mint));
        if let Some((kind, wallet, amount)) = amount_burn {
            debug!(
                "🔥 {:?} of {} by {} in {} (amount {})",
                kind, target_mint, wallet, signature, amount
            );
            return Some(BurnEvent {
                signature: signature.to_string(),
                wallet,
                amount,
                timestamp,
                mint: target_mint.to_string(),
                kind,
            });
        }

        instructions
            .iter()
            .find(|ix| ix.instruction_type() == Some("closeAccount"))
            .map(|ix| {
                let wallet = first_str(ix, &["owner", "multisigOwner", "account"]).unwrap_or_default();
                debug!("🗑️ closeAccount by {} in {}", wallet, signature);
                BurnEvent {
                    signature: signature.to_string(),
                    wallet,
                    amount: 0,
                    timestamp,
                    mint: target_mint.to_string(),
                    kind: BurnKind::AccountClose,
                }
            })
    }

    fn usable_instructions<'a>(
        &self,
        transaction: &'a ParsedTransaction,
    ) -> Result<Vec<&'a ParsedInstruction>> {
        let meta = transaction
            .meta
            .as_ref()
            .ok_or_else(|| ParseError::MissingData("meta".to_string()))?;
        if let Some(err) = &meta.err {
            return Err(ParseError::MissingData(format!("transaction failed: {}", err)));
        }

        let instructions = transaction
            .instructions()
            .ok_or_else(|| ParseError::MissingData("instructions".to_string()))?;

        Ok(instructions.iter().filter_map(|ix| ix.as_parsed()).collect())
    }

    fn match_amount_burn(
        &self,
        ix: &ParsedInstruction,
        target_mint: &str,
    ) -> Option<(BurnKind, String, i128)> {
        let kind = match ix.instruction_type()? {
            "burn" | "burnChecked" => BurnKind::Burn,
            "transfer" | "transferChecked"
                if ix.info_str("destination") == Some(self.config.burn_sink_address.as_str()) =>
            {
                BurnKind::SinkTransfer
            }
            _ => return None,
        };

        if ix.info_str("mint") != Some(target_mint) {
            return None;
        }

        let wallet_keys: &[&str] = match kind {
            BurnKind::Burn => &["authority", "multisigAuthority", "account"],
            _ => &["authority", "multisigAuthority", "source"],
        };
        let wallet = first_str(ix, wallet_keys).unwrap_or_default();
        let amount = ix.info().map(instruction_amount).unwrap_or(0);

        Some((kind, wallet, amount))
    }
}

fn first_str(ix: &ParsedInstruction, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| ix.info_str(key))
        .map(str::to_string)
}

/// Raw amount from `info.amount`, falling back to `info.tokenAmount.amount`.
/// Anything unreadable counts as 0.
fn instruction_amount(info: &Value) -> i128 {
    let raw = info
        .get("amount")
        .filter(|v| !v.is_null())
        .or_else(|| info.get("tokenAmount").and_then(|t| t.get("amount")));

    match raw.map(parse_amount) {
        Some(Ok(amount)) => amount,
        Some(Err(e)) => {
            debug!("{}; counting as 0", e);
            0
        }
        None => 0,
    }
}

/// Parse a base-unit token amount given as a JSON string or number
pub fn parse_amount(value: &Value) -> Result<i128> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| ParseError::InvalidAmount(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or_else(|| ParseError::InvalidAmount(n.to_string())),
        other => Err(ParseError::InvalidAmount(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const MINT: &str = "BurnMint1111111111111111111111111111111111";
    const OTHER_MINT: &str = "OtherMint111111111111111111111111111111111";

    fn tx(instructions: Value) -> ParsedTransaction {
        serde_json::from_value(json!({
            "slot": 1,
            "blockTime": 1700000000,
            "meta": {"err": null},
            "transaction": {"signatures": ["sig"], "message": {"instructions": instructions}}
        }))
        .unwrap()
    }

    fn spl(kind: &str, info: Value) -> Value {
        json!({
            "program": "spl-token",
            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "parsed": {"type": kind, "info": info}
        })
    }

    fn classifier() -> BurnClassifier {
        BurnClassifier::default()
    }

    #[test]
    fn test_native_burn() {
        let transaction = tx(json!([spl(
            "burn",
            json!({"mint": MINT, "authority": "W1", "account": "acct", "amount": "100"})
        )]));

        let event = classifier().classify(&transaction, "sig", MINT).unwrap();
        assert_eq!(event.wallet, "W1");
        assert_eq!(event.amount, 100);
        assert_eq!(event.timestamp, 1_700_000_000);
        assert_eq!(event.kind, BurnKind::Burn);
        assert_eq!(event.signature, "sig");
    }

    #[test]
    fn test_burn_checked_reads_token_amount() {
        let transaction = tx(json!([spl(
            "burnChecked",
            json!({
                "mint": MINT,
                "authority": "W1",
                "tokenAmount": {"amount": "2500", "decimals": 6, "uiAmount": 0.0025}
            })
        )]));

        let event = classifier().classify(&transaction, "sig", MINT).unwrap();
        assert_eq!(event.amount, 2500);
    }

    #[test]
    fn test_sink_transfer_falls_back_to_source() {
        let transaction = tx(json!([spl(
            "transferChecked",
            json!({
                "mint": MINT,
                "source": "W2-token-account",
                "destination": DEFAULT_BURN_SINK_ADDRESS,
                "tokenAmount": {"amount": "50", "decimals": 0}
            })
        )]));

        let event = classifier().classify(&transaction, "sig", MINT).unwrap();
        assert_eq!(event.wallet, "W2-token-account");
        assert_eq!(event.amount, 50);
        assert_eq!(event.kind, BurnKind::SinkTransfer);
    }

    #[test]
    fn test_transfer_elsewhere_is_not_a_burn() {
        let transaction = tx(json!([spl(
            "transferChecked",
            json!({"mint": MINT, "authority": "W1", "destination": "SomeoneElse", "tokenAmount": {"amount": "50"}})
        )]));
        assert!(classifier().classify(&transaction, "sig", MINT).is_none());
    }

    #[test]
    fn test_other_mint_is_ignored() {
        let transaction = tx(json!([spl(
            "burn",
            json!({"mint": OTHER_MINT, "authority": "W1", "amount": "100"})
        )]));
        assert!(classifier().classify(&transaction, "sig", MINT).is_none());
    }

    #[test]
    fn test_first_matching_instruction_wins() {
        let transaction = tx(json!([
            spl("burn", json!({"mint": OTHER_MINT, "authority": "W9", "amount": "999"})),
            spl("burn", json!({"mint": MINT, "authority": "W1", "amount": "10"})),
            spl("burn", json!({"mint": MINT, "authority": "W2", "amount": "20"})),
            spl("transfer", json!({"mint": MINT, "authority": "W3", "destination": DEFAULT_BURN_SINK_ADDRESS, "amount": "30"}))
        ]));

        let event = classifier().classify(&transaction, "sig", MINT).unwrap();
        assert_eq!((event.wallet.as_str(), event.amount), ("W1", 10));
    }

    #[test]
    fn test_close_account_only_without_amount_burn() {
        let close = spl("closeAccount", json!({"account": "acct", "destination": "W1", "owner": "W1"}));

        let lone = tx(json!([close.clone()]));
        let event = classifier().classify(&lone, "sig", MINT).unwrap();
        assert_eq!(event.kind, BurnKind::AccountClose);
        assert_eq!(event.amount, 0);
        assert_eq!(event.wallet, "W1");

        let with_burn = tx(json!([
            close,
            spl("burn", json!({"mint": MINT, "authority": "W1", "amount": "7"}))
        ]));
        let event = classifier().classify(&with_burn, "sig", MINT).unwrap();
        assert_eq!(event.kind, BurnKind::Burn);
        assert_eq!(event.amount, 7);
    }

    #[test]
    fn test_failed_transaction_is_not_a_burn() {
        let mut transaction = tx(json!([spl(
            "burn",
            json!({"mint": MINT, "authority": "W1", "amount": "100"})
        )]));
        transaction.meta.as_mut().unwrap().err = Some(json!({"InstructionError": [0, "Custom"]}));
        assert!(classifier().classify(&transaction, "sig", MINT).is_none());
    }

    #[test]
    fn test_missing_metadata_is_not_a_burn() {
        let no_meta: ParsedTransaction = serde_json::from_value(json!({
            "transaction": {"message": {"instructions": []}}
        }))
        .unwrap();
        assert!(classifier().classify(&no_meta, "sig", MINT).is_none());

        let no_body: ParsedTransaction =
            serde_json::from_value(json!({"meta": {"err": null}})).unwrap();
        assert!(classifier().classify(&no_body, "sig", MINT).is_none());
    }

    #[test]
    fn test_unparseable_amount_counts_as_zero() {
        let transaction = tx(json!([spl(
            "burn",
            json!({"mint": MINT, "authority": "W1", "amount": "lots"})
        )]));
        let event = classifier().classify(&transaction, "sig", MINT).unwrap();
        assert_eq!(event.amount, 0);
    }

    #[test]
    fn test_custom_sink_address() {
        let classifier = BurnClassifier::new(ClassifierConfig {
            burn_sink_address: "CustomSink".to_string(),
        });
        let transaction = tx(json!([spl(
            "transfer",
            json!({"mint": MINT, "authority": "W1", "destination": "CustomSink", "amount": "5"})
        )]));
        let event = classifier.classify(&transaction, "sig", MINT).unwrap();
        assert_eq!(event.kind, BurnKind::SinkTransfer);
        assert_eq!(event.amount, 5);
    }

    #[test]
    fn test_parse_amount_forms() {
        assert_eq!(parse_amount(&json!("12345678901234567890")), Ok(12_345_678_901_234_567_890));
        assert_eq!(parse_amount(&json!(42)), Ok(42));
        assert!(matches!(parse_amount(&json!(1.5)), Err(ParseError::InvalidAmount(_))));
        assert!(matches!(parse_amount(&json!(null)), Err(ParseError::InvalidAmount(_))));
    }

    proptest! {
        #[test]
        fn prop_burn_amount_is_decoded_field(amount in 0u64..u64::MAX, wallet in "[A-Za-z0-9]{32,44}") {
            let transaction = tx(json!([spl(
                "burn",
                json!({"mint": MINT, "authority": wallet.clone(), "amount": amount.to_string()})
            )]));
            let event = classifier().classify(&transaction, "sig", MINT).unwrap();
            prop_assert_eq!(event.amount, amount as i128);
            prop_assert_eq!(event.wallet, wallet);
        }

        #[test]
        fn prop_never_more_than_one_event(count in 1usize..8) {
            let instructions: Vec<Value> = (0..count)
                .map(|i| spl("burn", json!({"mint": MINT, "authority": format!("W{}", i), "amount": "1"})))
                .collect();
            let transaction = tx(Value::Array(instructions));
            let event = classifier().classify(&transaction, "sig", MINT);
            prop_assert!(event.is_some());
            prop_assert_eq!(event.map(|e| e.wallet), Some("W0".to_string()));
        }
    }
}
