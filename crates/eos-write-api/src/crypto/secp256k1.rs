//! Secp256k1 keys and the default signing primitive.

use super::SignPrimitive;
use crate::error::{WriteApiError, WriteApiResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Secp256k1 private key length in bytes.
pub const SECP256K1_PRIVATE_KEY_LENGTH: usize = 32;

/// Offset added to the recovery id for compressed-key signatures.
const COMPRESSED_RECOVERY_OFFSET: u8 = 31;

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey {
    inner: libsecp256k1::SecretKey,
}

impl PrivateKey {
    /// Creates a private key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> WriteApiResult<Self> {
        if bytes.len() != SECP256K1_PRIVATE_KEY_LENGTH {
            return Err(WriteApiError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                SECP256K1_PRIVATE_KEY_LENGTH,
                bytes.len()
            )));
        }
        let inner = libsecp256k1::SecretKey::parse_slice(bytes)
            .map_err(|e| WriteApiError::InvalidPrivateKey(format!("{e:?}")))?;
        Ok(Self { inner })
    }

    /// Creates a private key from a hex string, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> WriteApiResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| WriteApiError::InvalidPrivateKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the compressed public key, hex encoded.
    pub fn public_key_hex(&self) -> String {
        let public = libsecp256k1::PublicKey::from_secret_key(&self.inner);
        hex::encode(public.serialize_compressed())
    }

    pub(crate) fn secret(&self) -> &libsecp256k1::SecretKey {
        &self.inner
    }
}

impl FromStr for PrivateKey {
    type Err = WriteApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.public_key_hex())
    }
}

/// SHA-256 then recoverable secp256k1 ECDSA.
///
/// The signature is hex of `recovery_id + 31` followed by the 64-byte
/// compact `r || s`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Sign;

impl SignPrimitive for Secp256k1Sign {
    fn sign(&self, buf: &[u8], key: &PrivateKey) -> WriteApiResult<String> {
        let digest = Sha256::digest(buf);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&digest);
        let message = libsecp256k1::Message::parse(&hash);
        let (signature, recovery_id) = libsecp256k1::sign(&message, key.secret());

        let mut out = Vec::with_capacity(65);
        out.push(recovery_id.serialize() + COMPRESSED_RECOVERY_OFFSET);
        out.extend_from_slice(&signature.serialize());
        Ok(hex::encode(out))
    }
}
