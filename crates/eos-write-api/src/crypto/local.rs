use super::{PendingSignature, PrivateKey, SignProvider, SignRequest, SignatureSet};
use crate::error::WriteApiResult;
use futures::FutureExt;

/// Signs with a fixed set of in-memory keys, one signature per key.
#[derive(Clone, Debug, Default)]
pub struct LocalSigner {
    keys: Vec<PrivateKey>,
}

impl LocalSigner {
    /// Creates a signer over the given keys.
    pub fn new(keys: Vec<PrivateKey>) -> Self {
        Self { keys }
    }

    /// Creates a signer from hex-encoded keys.
    pub fn from_hex_keys<I, S>(keys: I) -> WriteApiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| PrivateKey::from_hex(k.as_ref()))
            .collect::<WriteApiResult<Vec<_>>>()?;
        Ok(Self::new(keys))
    }

    /// Adds a key.
    #[must_use]
    pub fn with_key(mut self, key: PrivateKey) -> Self {
        self.keys.push(key);
        self
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the signer holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SignProvider for LocalSigner {
    fn sign<'a>(&'a self, request: SignRequest<'a>) -> Vec<PendingSignature<'a>> {
        self.keys
            .iter()
            .map(|key| {
                async move { request.sign.sign(request.buf, key).map(SignatureSet::One) }.boxed()
            })
            .collect()
    }
}
