// Ledger access for burn discovery: a Helius-flavoured JSON-RPC client, the
// `LedgerSource` seam it implements, and the paginated, rate-limited fetcher
// built on top of that seam.

pub mod client;
pub mod fetcher;
pub mod source;
pub mod types;

pub use client::{SolanaClient, SolanaClientConfig};
pub use fetcher::{FetcherConfig, LedgerFetcher, PageCursor, SignaturePage, SignatureScope};
pub use source::LedgerSource;
pub use types::{
    Instruction, ParsedInstruction, ParsedTransaction, TransactionBody, TransactionMessage,
    TransactionMeta, TransactionSignature,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolanaClientError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SolanaClientError>;
