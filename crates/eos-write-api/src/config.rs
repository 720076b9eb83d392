//! Write API configuration.
//!
//! A [`WriteApiConfig`] is an immutable value handed to the constructor. It
//! names the chain (its id is part of every signed payload), where the HTTP
//! network lives, which contract account actions are addressed to, and how
//! transactions are signed.
//!
//! # Example
//!
//! ```rust
//! use eos_write_api::{LocalSigner, WriteApiConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let signer = LocalSigner::from_hex_keys([
//!     "0101010101010101010101010101010101010101010101010101010101010101",
//! ])
//! .unwrap();
//!
//! let config = WriteApiConfig::custom("http://127.0.0.1:8888")
//!     .unwrap()
//!     .with_chain_id("00000000000000000000000000000000")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_sign_provider(Arc::new(signer));
//! assert!(config.chain_id().is_ok());
//! ```

use crate::crypto::{Secp256k1Sign, SignPrimitive, SignProvider};
use crate::error::{WriteApiError, WriteApiResult};
use crate::retry::RetryConfig;
use crate::transaction::options::TransactionOptions;
use crate::types::{AccountName, ChainId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The contract account actions are addressed to by default.
pub const DEFAULT_CONTRACT: &str = "eos";

const LOCAL_HTTP_ENDPOINT: &str = "http://127.0.0.1:8888";

/// Configuration for a [`WriteApi`](crate::WriteApi).
#[derive(Clone)]
pub struct WriteApiConfig {
    pub(crate) chain_id: Option<String>,
    pub(crate) http_endpoint: Url,
    pub(crate) timeout: Duration,
    pub(crate) retry_config: RetryConfig,
    pub(crate) contract: String,
    pub(crate) transaction_options: TransactionOptions,
    pub(crate) sign_provider: Option<Arc<dyn SignProvider>>,
    pub(crate) sign_primitive: Arc<dyn SignPrimitive>,
}

impl WriteApiConfig {
    /// Configuration for a node on the local machine (`http://127.0.0.1:8888`).
    ///
    /// The chain id still has to be set with [`with_chain_id`](Self::with_chain_id).
    pub fn local() -> Self {
        Self {
            chain_id: None,
            http_endpoint: Url::parse(LOCAL_HTTP_ENDPOINT).expect("valid local URL"),
            timeout: Duration::from_secs(10),
            retry_config: RetryConfig::local(),
            contract: DEFAULT_CONTRACT.to_string(),
            transaction_options: TransactionOptions::default(),
            sign_provider: None,
            sign_primitive: Arc::new(Secp256k1Sign),
        }
    }

    /// Configuration for the node at `http_endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse.
    pub fn custom(http_endpoint: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            http_endpoint: Url::parse(http_endpoint)?,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
            ..Self::local()
        })
    }

    /// Sets the chain id (hex).
    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration for context fetches.
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Disables retries.
    pub fn without_retry(mut self) -> Self {
        self.retry_config = RetryConfig::no_retry();
        self
    }

    /// Sets the contract account actions are addressed to.
    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = contract.into();
        self
    }

    /// Sets the transaction defaults that per-call settings override.
    pub fn with_transaction_options(mut self, options: TransactionOptions) -> Self {
        self.transaction_options = options;
        self
    }

    /// Sets the sign provider. Required unless every call passes `sign: false`.
    pub fn with_sign_provider(mut self, provider: Arc<dyn SignProvider>) -> Self {
        self.sign_provider = Some(provider);
        self
    }

    /// Replaces the low-level signing primitive handed to the sign provider.
    pub fn with_sign_primitive(mut self, primitive: Arc<dyn SignPrimitive>) -> Self {
        self.sign_primitive = primitive;
        self
    }

    /// Returns the parsed chain id.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no chain id was set or it is not hex.
    pub fn chain_id(&self) -> WriteApiResult<ChainId> {
        let raw = self
            .chain_id
            .as_deref()
            .ok_or_else(|| WriteApiError::config("chain id is required"))?;
        ChainId::from_hex(raw)
    }

    /// Returns the contract account.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the contract is not a valid account name.
    pub fn contract(&self) -> WriteApiResult<AccountName> {
        AccountName::new(self.contract.as_str())
            .map_err(|e| WriteApiError::config(format!("invalid contract account: {e}")))
    }

    /// Returns the HTTP endpoint.
    pub fn http_endpoint(&self) -> &Url {
        &self.http_endpoint
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Returns the transaction defaults.
    pub fn transaction_options(&self) -> &TransactionOptions {
        &self.transaction_options
    }

    /// Returns the sign provider, if one is configured.
    pub fn sign_provider(&self) -> Option<&Arc<dyn SignProvider>> {
        self.sign_provider.as_ref()
    }

    /// Returns the signing primitive.
    pub fn sign_primitive(&self) -> &Arc<dyn SignPrimitive> {
        &self.sign_primitive
    }
}

impl Default for WriteApiConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl fmt::Debug for WriteApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteApiConfig")
            .field("chain_id", &self.chain_id)
            .field("http_endpoint", &self.http_endpoint.as_str())
            .field("timeout", &self.timeout)
            .field("retry_config", &self.retry_config)
            .field("contract", &self.contract)
            .field("transaction_options", &self.transaction_options)
            .field("sign_provider", &self.sign_provider.is_some())
            .finish_non_exhaustive()
    }
}
