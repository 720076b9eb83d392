//! Multi-action atomic transactions.
//!
//! A batch routine receives a [`MessageCollector`] and calls actions on it
//! the same way it would call them on the write API. Instead of being
//! submitted, each call is built into a fragment. Once the routine finishes,
//! the fragments merge into one request: scopes unioned and sorted, messages
//! concatenated in call order. That request is then finalized once, so either
//! every action lands or none does.
//!
//! # Example
//!
//! ```rust,no_run
//! use eos_write_api::{CallArgs, CallSettings, TransactionInput, WriteApi};
//!
//! # async fn run(api: WriteApi) -> eos_write_api::WriteApiResult<()> {
//! let transfer = |to: &str, quantity: &str| {
//!     CallArgs::new().arg("alice").arg(to).arg(quantity).arg("")
//! };
//! let input = TransactionInput::batch(move |collector| async move {
//!     collector.call("transfer", transfer("bob", "1.0000 EOS"))?;
//!     collector.call("transfer", transfer("carol", "2.0000 EOS"))?;
//!     Ok(())
//! });
//! let signed = api.transaction(input, CallSettings::new())?.await?;
//! assert_eq!(signed.transaction.messages.len(), 2);
//! # Ok(())
//! # }
//! ```

use super::action::{Dispatch, dispatch_action};
use super::args::{CallArgs, Completion};
use super::options::OptionOverrides;
use super::types::{ActionFragment, TransactionRequest, sorted_scope};
use crate::error::{WriteApiError, WriteApiResult};
use crate::write_api::WriteApi;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A caller-supplied routine that fills a batch.
pub type BatchRoutine =
    Box<dyn FnOnce(MessageCollector) -> BoxFuture<'static, WriteApiResult<()>> + Send + 'static>;

/// What to finalize: a ready request or a batch routine.
pub enum TransactionInput {
    /// A request with scope and messages already assembled.
    Request(TransactionRequest),
    /// A routine that builds the messages through a [`MessageCollector`].
    Batch(BatchRoutine),
}

impl TransactionInput {
    /// Wraps an async batch routine.
    pub fn batch<F, Fut>(routine: F) -> Self
    where
        F: FnOnce(MessageCollector) -> Fut + Send + 'static,
        Fut: Future<Output = WriteApiResult<()>> + Send + 'static,
    {
        Self::Batch(Box::new(move |collector| routine(collector).boxed()))
    }

    /// Parses a request from JSON (`{"scope": [...], "messages": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns a validation error if the request is malformed.
    pub fn from_value(value: Value) -> WriteApiResult<Self> {
        TransactionRequest::from_value(value).map(Self::Request)
    }
}

impl From<TransactionRequest> for TransactionInput {
    fn from(request: TransactionRequest) -> Self {
        Self::Request(request)
    }
}

impl From<ActionFragment> for TransactionInput {
    fn from(fragment: ActionFragment) -> Self {
        Self::Request(fragment.into())
    }
}

impl fmt::Debug for TransactionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(request) => f.debug_tuple("Request").field(request).finish(),
            Self::Batch(_) => f.write_str("Batch(..)"),
        }
    }
}

#[derive(Debug, Default)]
struct CollectorState {
    fragments: Vec<ActionFragment>,
    failure: Option<String>,
}

/// Collects the actions of a batch.
///
/// Cloning is cheap; clones share the same fragment list.
#[derive(Clone)]
pub struct MessageCollector {
    api: WriteApi,
    state: Arc<Mutex<CollectorState>>,
}

impl MessageCollector {
    pub(crate) fn new(api: WriteApi) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(CollectorState::default())),
        }
    }

    /// Builds an action into the batch.
    ///
    /// Arguments are normalized exactly as for a direct call, but nothing is
    /// signed or submitted here. A failure is returned and also recorded, so
    /// the batch fails even if the routine ignores the error.
    ///
    /// # Errors
    ///
    /// Returns the same argument and validation errors a direct call would.
    pub fn call(&self, name: &str, args: impl Into<CallArgs>) -> WriteApiResult<()> {
        let result = dispatch_action(
            &self.api,
            name,
            args.into(),
            Completion::Future,
            &OptionOverrides::collecting(),
        )
        .and_then(Dispatch::into_fragment);

        let mut state = self.lock();
        match result {
            Ok(fragment) => {
                state.fragments.push(fragment);
                Ok(())
            }
            Err(error) => {
                if state.failure.is_none() {
                    state.failure = Some(format!("{name}: {error}"));
                }
                Err(error)
            }
        }
    }

    /// Number of actions collected so far.
    pub fn len(&self) -> usize {
        self.lock().fragments.len()
    }

    /// Returns true if nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges the collected fragments into one request.
    pub(crate) fn merge(&self) -> WriteApiResult<TransactionRequest> {
        let mut state = self.lock();
        if let Some(failure) = state.failure.take() {
            return Err(WriteApiError::Batch(failure));
        }
        if state.fragments.is_empty() {
            return Err(WriteApiError::validation(
                "multi-message transaction has no messages",
            ));
        }

        let fragments = std::mem::take(&mut state.fragments);
        let mut scope = Vec::new();
        let mut messages = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            scope.extend(fragment.scope);
            messages.extend(fragment.messages);
        }
        let request = TransactionRequest {
            scope: sorted_scope(scope),
            readscope: Vec::new(),
            messages,
        };
        debug!(
            messages = request.messages.len(),
            scope = ?request.scope,
            "merged batch"
        );
        Ok(request)
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        // a poisoned lock still holds consistent state: every update is a single push or set
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for MessageCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCollector")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

/// Runs a batch routine and merges what it collected.
pub(crate) async fn collect(api: WriteApi, routine: BatchRoutine) -> WriteApiResult<TransactionRequest> {
    let collector = MessageCollector::new(api);
    routine(collector.clone()).await?;
    collector.merge()
}
