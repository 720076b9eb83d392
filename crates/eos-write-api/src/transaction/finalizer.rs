//! Turning a request into a signed, and optionally submitted, transaction.
//!
//! Validation and the signer check run synchronously when the transaction is
//! started, so argument and configuration mistakes surface from the call
//! itself. Everything after the first network round trip is reported through
//! the returned [`PendingTransaction`].

use super::options::TransactionOptions;
use super::types::{RawTransaction, SignedTransaction, Transaction, TransactionRequest};
use crate::crypto::{SignRequest, SignatureSet};
use crate::error::{WriteApiError, WriteApiResult};
use crate::write_api::{Inner, WriteApi};
use futures::future::{BoxFuture, try_join_all};
use futures::FutureExt;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, error, info};

/// Where a transaction is in the finalization pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FinalizeStage {
    /// Request validated and accepted.
    ReceivedRequest,
    /// Chain context headers fetched.
    ContextFetched,
    /// Shorthand resolved and canonical bytes produced.
    Serialized,
    /// Signatures collected.
    Signed,
    /// Signing disabled for this transaction.
    SignSkipped,
    /// Pushed to the network.
    Submitted,
    /// Broadcast disabled for this transaction.
    BroadcastSkipped,
    /// Result delivered.
    Completed,
    /// A stage failed.
    Failed,
}

impl FinalizeStage {
    /// Returns the stage name as it appears in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceivedRequest => "received_request",
            Self::ContextFetched => "context_fetched",
            Self::Serialized => "serialized",
            Self::Signed => "signed",
            Self::SignSkipped => "sign_skipped",
            Self::Submitted => "submitted",
            Self::BroadcastSkipped => "broadcast_skipped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FinalizeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction on its way through the pipeline.
///
/// Await it for the signed transaction, or hand it a callback with
/// [`on_complete`](Self::on_complete). Dropping it abandons the transaction.
#[must_use = "a pending transaction does nothing unless awaited or given a callback"]
pub struct PendingTransaction {
    inner: BoxFuture<'static, WriteApiResult<SignedTransaction>>,
}

impl PendingTransaction {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = WriteApiResult<SignedTransaction>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// Drives the transaction on the current Tokio runtime and passes the
    /// outcome to `callback`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if called outside a Tokio runtime.
    pub fn on_complete<C>(self, callback: C) -> WriteApiResult<()>
    where
        C: FnOnce(WriteApiResult<SignedTransaction>) + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            WriteApiError::config("callback completion requires a running Tokio runtime")
        })?;
        handle.spawn(async move { callback(self.await) });
        Ok(())
    }
}

impl Future for PendingTransaction {
    type Output = WriteApiResult<SignedTransaction>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction").finish_non_exhaustive()
    }
}

/// Validates a request and starts finalizing it.
///
/// # Errors
///
/// Returns a validation error for a malformed request, or a configuration
/// error if signing is requested without a sign provider.
pub(crate) fn start(
    api: &WriteApi,
    mut request: TransactionRequest,
    options: TransactionOptions,
) -> WriteApiResult<PendingTransaction> {
    request.validate()?;
    ensure_signer(api, &options)?;
    debug!(
        stage = %FinalizeStage::ReceivedRequest,
        messages = request.messages.len(),
        broadcast = options.broadcast,
        sign = options.sign,
        extra = ?options.extra.keys().collect::<Vec<_>>(),
        "finalizing transaction"
    );

    let inner = api.inner();
    Ok(PendingTransaction::new(async move {
        let result = finalize(&inner, request, options).await;
        match &result {
            Ok(signed) => debug!(
                stage = %FinalizeStage::Completed,
                signatures = signed.signatures.len(),
                "transaction complete"
            ),
            Err(e) => debug!(
                stage = %FinalizeStage::Failed,
                error = %e.sanitized_message(),
                "transaction failed"
            ),
        }
        result
    }))
}

/// Fails if `options` ask for signing and no sign provider is configured.
pub(crate) fn ensure_signer(api: &WriteApi, options: &TransactionOptions) -> WriteApiResult<()> {
    if options.sign && api.config().sign_provider().is_none() {
        return Err(WriteApiError::config(
            "expecting a sign provider (disable signing with sign: false)",
        ));
    }
    Ok(())
}

async fn finalize(
    inner: &Inner,
    request: TransactionRequest,
    options: TransactionOptions,
) -> WriteApiResult<SignedTransaction> {
    let headers = inner
        .network
        .create_transaction(options.expire_in_seconds)
        .await?;
    debug!(
        stage = %FinalizeStage::ContextFetched,
        ref_block_num = headers.ref_block_num,
        expiration = %headers.expiration,
        "context fetched"
    );

    let raw = RawTransaction::new(headers, request);
    let resolved = inner.registry.resolve_transaction(raw)?;
    let buf = inner.codec.encode(&resolved)?;
    // sign and broadcast what the bytes decode to, not the pre-encoding value
    let transaction = inner.codec.decode(&buf)?;
    debug!(stage = %FinalizeStage::Serialized, bytes = buf.len(), "transaction serialized");

    let signatures = if options.sign {
        let signatures = sign(inner, &transaction, &buf, &options.extra).await?;
        debug!(stage = %FinalizeStage::Signed, signatures = signatures.len(), "transaction signed");
        signatures
    } else {
        debug!(stage = %FinalizeStage::SignSkipped, "signing disabled");
        Vec::new()
    };
    let signed = SignedTransaction {
        transaction,
        signatures,
    };

    if !options.broadcast {
        debug!(stage = %FinalizeStage::BroadcastSkipped, "broadcast disabled");
        return Ok(signed);
    }

    match inner.network.push_transaction(&signed).await {
        Ok(receipt) => {
            info!(
                stage = %FinalizeStage::Submitted,
                transaction_id = receipt.transaction_id.as_deref().unwrap_or("unknown"),
                "transaction submitted"
            );
            Ok(signed)
        }
        Err(e) => {
            let digest = hex::encode(Sha256::digest(&buf));
            error!(
                stage = %FinalizeStage::Failed,
                digest = %digest,
                error = %e.sanitized_message(),
                "push_transaction failed"
            );
            Err(WriteApiError::Network {
                message: e.to_string(),
                digest: Some(digest),
            })
        }
    }
}

async fn sign(
    inner: &Inner,
    transaction: &Transaction,
    buf: &[u8],
    extra: &Map<String, Value>,
) -> WriteApiResult<Vec<String>> {
    let provider = inner
        .config
        .sign_provider()
        .ok_or_else(|| WriteApiError::config("expecting a sign provider"))?;

    let mut sign_buf = Vec::with_capacity(inner.chain_id.as_bytes().len() + buf.len());
    sign_buf.extend_from_slice(inner.chain_id.as_bytes());
    sign_buf.extend_from_slice(buf);

    let request = SignRequest {
        transaction,
        buf: &sign_buf,
        sign: inner.config.sign_primitive().as_ref(),
        extra,
    };
    let sets = try_join_all(provider.sign(request))
        .await
        .map_err(|e| match e {
            WriteApiError::Signing(_) => e,
            other => WriteApiError::signing(other.to_string()),
        })?;

    let signatures: Vec<String> = sets.into_iter().flat_map(SignatureSet::into_vec).collect();
    if signatures.is_empty() {
        return Err(WriteApiError::signing("sign provider returned no signatures"));
    }
    if signatures.iter().any(|s| s.trim().is_empty()) {
        return Err(WriteApiError::signing("sign provider returned an empty signature"));
    }
    Ok(signatures)
}
