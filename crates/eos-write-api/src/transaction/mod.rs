//! Transaction building, batching and finalization.
//!
//! - [`types`] - requests, headers and the canonical transaction
//! - [`options`] - per-call settings and their defaults
//! - [`args`] - call arguments and how they are normalized
//! - [`batch`] - multi-action atomic transactions
//! - [`finalizer`] - context fetch, serialization, signing and submission

pub mod args;
pub mod batch;
pub mod finalizer;
pub mod options;
pub mod types;

pub(crate) mod action;

pub use args::{CallArgs, TransactionCallback};
pub use batch::{BatchRoutine, MessageCollector, TransactionInput};
pub use finalizer::{FinalizeStage, PendingTransaction};
pub use options::{CallSettings, TransactionOptions};
pub use types::{
    ActionFragment, Message, PackedMessage, RawTransaction, SignedTransaction, Transaction,
    TransactionHeaders, TransactionRequest,
};
