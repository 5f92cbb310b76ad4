use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub jsonrpc: String,
    pub id: Value,
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A committed transaction's signature plus whatever ordering data the
/// listing endpoint returned with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub signature: String,
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
}

impl TransactionSignature {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            slot: None,
            block_time: None,
        }
    }
}

/// `getSignaturesForAddress` row
#[derive(Debug, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: Option<u64>,
    #[serde(rename = "blockTime")]
    pub block_time: Option<i64>,
    pub err: Option<Value>,
}

impl From<SignatureInfo> for TransactionSignature {
    fn from(info: SignatureInfo) -> Self {
        Self {
            signature: info.signature,
            slot: info.slot,
            block_time: info.block_time,
        }
    }
}

/// `getSignaturesForAsset` result page
#[derive(Debug, Deserialize)]
pub struct AssetSignaturesPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub items: Vec<AssetSignatureItem>,
}

/// DAS returns `[signature, type]` pairs; some deployments return objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AssetSignatureItem {
    Pair(String, String),
    Object {
        signature: String,
        #[serde(default)]
        slot: Option<u64>,
        #[serde(default, rename = "blockTime")]
        block_time: Option<i64>,
    },
}

impl From<AssetSignatureItem> for TransactionSignature {
    fn from(item: AssetSignatureItem) -> Self {
        match item {
            AssetSignatureItem::Pair(signature, _kind) => TransactionSignature::new(signature),
            AssetSignatureItem::Object {
                signature,
                slot,
                block_time,
            } => Self {
                signature,
                slot,
                block_time,
            },
        }
    }
}

/// `getTransaction` with `jsonParsed` encoding, reduced to what burn
/// classification reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub block_time: Option<i64>,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    #[serde(default)]
    pub transaction: Option<TransactionBody>,
}

impl ParsedTransaction {
    /// Top-level instructions, if the body carried any
    pub fn instructions(&self) -> Option<&[Instruction]> {
        self.transaction
            .as_ref()
            .and_then(|tx| tx.message.as_ref())
            .map(|message| message.instructions.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default)]
    pub message: Option<TransactionMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMessage {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// An instruction is either decoded by the RPC node or left raw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    Parsed(ParsedInstruction),
    Raw(RawInstruction),
}

impl Instruction {
    pub fn as_parsed(&self) -> Option<&ParsedInstruction> {
        match self {
            Instruction::Parsed(parsed) => Some(parsed),
            Instruction::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    pub parsed: Value,
}

impl ParsedInstruction {
    /// Decoded instruction name, e.g. `burn` or `transferChecked`
    pub fn instruction_type(&self) -> Option<&str> {
        self.parsed.get("type").and_then(Value::as_str)
    }

    pub fn info(&self) -> Option<&Value> {
        self.parsed.get("info")
    }

    pub fn info_str(&self, key: &str) -> Option<&str> {
        self.info().and_then(|info| info.get(key)).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_asset_items_accept_pairs_and_objects() {
        let page: AssetSignaturesPage = serde_json::from_value(json!({
            "total": 2,
            "limit": 1000,
            "page": 1,
            "items": [
                ["5h6xBEauJ3PK6SWCZ1PGjBvj8vDdWG3KpwATGy1ARAXF", "Burn"],
                {"signature": "3Q9x...", "slot": 12, "blockTime": 1700000000}
            ]
        }))
        .unwrap();

        let signatures: Vec<TransactionSignature> =
            page.items.into_iter().map(Into::into).collect();
        assert_eq!(signatures[0].signature, "5h6xBEauJ3PK6SWCZ1PGjBvj8vDdWG3KpwATGy1ARAXF");
        assert_eq!(signatures[0].block_time, None);
        assert_eq!(signatures[1].slot, Some(12));
        assert_eq!(signatures[1].block_time, Some(1_700_000_000));
    }

    #[test]
    fn test_parsed_transaction_shape() {
        let tx: ParsedTransaction = serde_json::from_value(json!({
            "slot": 250000000,
            "blockTime": 1700000100,
            "meta": {"err": null, "fee": 5000},
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "instructions": [
                        {
                            "program": "spl-token",
                            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                            "parsed": {"type": "burn", "info": {"mint": "M", "amount": "100"}}
                        },
                        {
                            "programId": "ComputeBudget111111111111111111111111111111",
                            "accounts": [],
                            "data": "3DTZbgwsozUF"
                        }
                    ]
                }
            }
        }))
        .unwrap();

        assert!(tx.meta.as_ref().unwrap().err.is_none());
        let instructions = tx.instructions().unwrap();
        assert_eq!(instructions.len(), 2);
        let parsed = instructions[0].as_parsed().unwrap();
        assert_eq!(parsed.instruction_type(), Some("burn"));
        assert_eq!(parsed.info_str("amount"), Some("100"));
        assert!(instructions[1].as_parsed().is_none());
    }

    #[test]
    fn test_failed_and_metaless_transactions_deserialize() {
        let failed: ParsedTransaction = serde_json::from_value(json!({
            "meta": {"err": {"InstructionError": [0, "Custom"]}}
        }))
        .unwrap();
        assert!(failed.meta.as_ref().unwrap().err.is_some());

        let bare: ParsedTransaction = serde_json::from_value(json!({})).unwrap();
        assert!(bare.meta.is_none());
        assert!(bare.instructions().is_none());
    }
}
