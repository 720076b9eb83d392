//! Chain network access.
//!
//! The transaction pipeline needs two things from the chain: fresh context
//! headers for a new transaction, and a way to push a signed one.
//! [`HttpNetwork`] talks to a node's HTTP chain API; tests and embedders can
//! supply any other [`Network`].

mod http;

pub use http::{BlockInfo, ChainInfo, HttpNetwork};

use crate::error::WriteApiResult;
use crate::transaction::types::{SignedTransaction, TransactionHeaders};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the node reported after accepting a transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PushReceipt {
    /// Id assigned by the node, when reported.
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// The node's processing trace, passed through untouched.
    #[serde(default)]
    pub processed: Value,
}

/// Chain access used by the transaction finalizer.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetches the context headers for a transaction that expires
    /// `expire_in_seconds` after the current head block.
    async fn create_transaction(&self, expire_in_seconds: u64)
        -> WriteApiResult<TransactionHeaders>;

    /// Submits a signed transaction.
    async fn push_transaction(&self, transaction: &SignedTransaction)
        -> WriteApiResult<PushReceipt>;
}
