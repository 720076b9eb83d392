//! Chain identifier.

use crate::error::{WriteApiError, WriteApiResult};
use std::fmt;
use std::str::FromStr;

/// Identifies the network a transaction is signed for.
///
/// The raw bytes are prepended to the canonical transaction bytes before
/// signing, so a signature is only valid on one chain.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChainId(Vec<u8>);

impl ChainId {
    /// Parses a hex-encoded chain id (with or without `0x` prefix).
    pub fn from_hex(hex_str: &str) -> WriteApiResult<Self> {
        let hex_str = hex_str
            .strip_prefix("0x")
            .or_else(|| hex_str.strip_prefix("0X"))
            .unwrap_or(hex_str);
        if hex_str.is_empty() {
            return Err(WriteApiError::config("chain id cannot be empty"));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| WriteApiError::config(format!("chain id is not valid hex: {e}")))?;
        Ok(Self(bytes))
    }

    /// Returns the raw chain id bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the chain id as lower-case hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.to_hex())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ChainId {
    type Err = WriteApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
