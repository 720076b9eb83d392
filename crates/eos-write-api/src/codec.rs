//! Canonical transaction serialization.

use crate::error::{WriteApiError, WriteApiResult};
use crate::transaction::types::Transaction;

/// Turns a transaction into the exact bytes that get signed, and back.
///
/// `decode(encode(tx))` must equal `tx`, and re-encoding the decoded value
/// must produce identical bytes.
pub trait Codec: Send + Sync {
    /// Serializes a transaction.
    fn encode(&self, transaction: &Transaction) -> WriteApiResult<Vec<u8>>;

    /// Deserializes a transaction.
    fn decode(&self, bytes: &[u8]) -> WriteApiResult<Transaction>;
}

/// BCS encoding of [`Transaction`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BcsCodec;

impl Codec for BcsCodec {
    fn encode(&self, transaction: &Transaction) -> WriteApiResult<Vec<u8>> {
        bcs::to_bytes(transaction).map_err(WriteApiError::codec)
    }

    fn decode(&self, bytes: &[u8]) -> WriteApiResult<Transaction> {
        bcs::from_bytes(bytes).map_err(WriteApiError::codec)
    }
}
