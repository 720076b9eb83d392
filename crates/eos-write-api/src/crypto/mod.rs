//! Signing capabilities.
//!
//! Signing is split in two. A [`SignPrimitive`] knows how to turn bytes and a
//! private key into one signature. A [`SignProvider`] decides which keys sign
//! a given transaction (local keys, a wallet, a remote service) and hands
//! back any number of pending results, each of which may carry one or many
//! signatures.

mod local;
mod secp256k1;

pub use local::LocalSigner;
pub use secp256k1::{PrivateKey, SECP256K1_PRIVATE_KEY_LENGTH, Secp256k1Sign};

use crate::error::WriteApiResult;
use crate::transaction::types::Transaction;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::fmt;

/// Low-level signing: bytes plus a key in, encoded signature out.
pub trait SignPrimitive: Send + Sync {
    /// Signs `buf` with `key`.
    fn sign(&self, buf: &[u8], key: &PrivateKey) -> WriteApiResult<String>;
}

/// What a sign provider is asked to sign.
#[derive(Clone, Copy)]
pub struct SignRequest<'a> {
    /// The decoded canonical transaction.
    pub transaction: &'a Transaction,
    /// Chain id bytes followed by the canonical transaction bytes.
    pub buf: &'a [u8],
    /// The configured signing primitive.
    pub sign: &'a dyn SignPrimitive,
    /// Call settings keys the pipeline does not interpret.
    pub extra: &'a Map<String, Value>,
}

impl fmt::Debug for SignRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignRequest")
            .field("transaction", self.transaction)
            .field("buf", &hex::encode(self.buf))
            .field("extra", self.extra)
            .finish_non_exhaustive()
    }
}

/// One provider result: a single signature or several.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureSet {
    /// A single signature.
    One(String),
    /// Several signatures, kept in order.
    Many(Vec<String>),
}

impl SignatureSet {
    /// Flattens the set into its signatures.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(signature) => vec![signature],
            Self::Many(signatures) => signatures,
        }
    }
}

impl From<String> for SignatureSet {
    fn from(signature: String) -> Self {
        Self::One(signature)
    }
}

impl From<Vec<String>> for SignatureSet {
    fn from(signatures: Vec<String>) -> Self {
        Self::Many(signatures)
    }
}

/// A signature result that is not yet available.
pub type PendingSignature<'a> = BoxFuture<'a, WriteApiResult<SignatureSet>>;

/// Produces the signatures for a transaction.
///
/// The pending results are awaited concurrently and flattened in the order
/// they were returned.
pub trait SignProvider: Send + Sync {
    /// Starts signing the request.
    fn sign<'a>(&'a self, request: SignRequest<'a>) -> Vec<PendingSignature<'a>>;
}
