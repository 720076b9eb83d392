//! # EOS write API
//!
//! Builds, batches, signs and submits contract actions.
//!
//! Every action type in the schema becomes a callable method. A call turns
//! its arguments into a message, derives scope and authorization from the
//! account fields, fetches chain context, serializes the transaction to its
//! canonical bytes, collects signatures from the configured sign provider and
//! pushes the result to a node.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eos_write_api::{CallArgs, LocalSigner, WriteApi, WriteApiConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let signer = LocalSigner::from_hex_keys([std::env::var("EOS_KEY")?])?;
//!     let api = WriteApi::new(
//!         WriteApiConfig::local()
//!             .with_chain_id(std::env::var("EOS_CHAIN_ID")?)
//!             .with_sign_provider(Arc::new(signer)),
//!     )?;
//!
//!     // Print how to call an action
//!     println!("{}", api.usage("transfer")?);
//!
//!     let signed = api
//!         .action("transfer")?
//!         .call(CallArgs::new().arg("alice").arg("bob").arg("1.0000 EOS").arg(""))?
//!         .await?;
//!     println!("{:?}", signed.transaction.scope);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Endpoint, chain id, signing and default options
//! - [`schema`] - Action definitions and usage text
//! - [`transaction`] - Argument handling, batching and finalization
//! - [`crypto`] - Sign providers and the secp256k1 primitive
//! - [`network`] - Chain context and submission
//! - [`codec`] - Canonical transaction bytes
//! - [`types`] - Core chain types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod network;
pub mod retry;
pub mod schema;
pub mod transaction;
pub mod types;

mod write_api;

// Re-export main entry points
pub use config::WriteApiConfig;
pub use error::{WriteApiError, WriteApiResult};
pub use write_api::{ActionMethod, WriteApi, WriteApiBuilder};

// Re-export commonly used types
pub use crypto::{LocalSigner, PrivateKey, SignProvider};
pub use transaction::{
    CallArgs, CallSettings, MessageCollector, PendingTransaction, SignedTransaction,
    TransactionInput, TransactionRequest,
};
pub use types::{AccountName, Asset, ChainId, PermissionLevel};

#[cfg(test)]
mod tests;
