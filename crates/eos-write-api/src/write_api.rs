//! Main write API entry point.
//!
//! [`WriteApi`] exposes one callable method per action type in the schema,
//! plus [`transaction`](WriteApi::transaction) for pre-built requests and
//! multi-action batches.

use crate::codec::{BcsCodec, Codec};
use crate::config::WriteApiConfig;
use crate::error::{WriteApiError, WriteApiResult};
use crate::network::{HttpNetwork, Network};
use crate::schema::{ActionDefinition, Schema, SchemaRegistry, usage};
use crate::transaction::action::{Dispatch, dispatch_action};
use crate::transaction::args::{CallArgs, Completion};
use crate::transaction::batch::{self, TransactionInput};
use crate::transaction::finalizer::{self, PendingTransaction};
use crate::transaction::options::{CallSettings, OptionOverrides};
use crate::transaction::types::SignedTransaction;
use crate::types::{AccountName, ChainId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type name reserved for [`WriteApi::transaction`].
const RESERVED_TRANSACTION_NAME: &str = "transaction";

/// Shared, immutable state behind every [`WriteApi`] clone.
pub(crate) struct Inner {
    pub(crate) config: WriteApiConfig,
    pub(crate) chain_id: ChainId,
    pub(crate) contract: AccountName,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) registry: Arc<dyn SchemaRegistry>,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) actions: BTreeMap<String, ActionDefinition>,
}

/// Builds, batches, signs and submits transactions.
///
/// Cloning is cheap; clones share configuration and collaborators.
///
/// # Example
///
/// ```rust,no_run
/// use eos_write_api::{CallArgs, LocalSigner, WriteApi, WriteApiConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let signer = LocalSigner::from_hex_keys([
///         "0101010101010101010101010101010101010101010101010101010101010101",
///     ])?;
///     let config = WriteApiConfig::local()
///         .with_chain_id("00000000000000000000000000000000")
///         .with_sign_provider(Arc::new(signer));
///     let api = WriteApi::new(config)?;
///
///     let signed = api
///         .action("transfer")?
///         .call(CallArgs::new().arg("alice").arg("bob").arg("1.0000 EOS").arg(""))?
///         .await?;
///     println!("{} signature(s)", signed.signatures.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct WriteApi {
    inner: Arc<Inner>,
}

impl WriteApi {
    /// Creates a write API with the default collaborators: the HTTP network
    /// at the configured endpoint, the built-in schema and the BCS codec.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the chain id or contract is missing
    /// or invalid, or an error if the HTTP client fails to build.
    pub fn new(config: WriteApiConfig) -> WriteApiResult<Self> {
        Self::builder(config).build()
    }

    /// Starts a builder for custom collaborators.
    pub fn builder(config: WriteApiConfig) -> WriteApiBuilder {
        WriteApiBuilder {
            config,
            network: None,
            registry: None,
            codec: None,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &WriteApiConfig {
        &self.inner.config
    }

    /// Returns the chain id.
    pub fn chain_id(&self) -> &ChainId {
        &self.inner.chain_id
    }

    /// Returns the contract account actions are addressed to.
    pub fn contract(&self) -> &AccountName {
        &self.inner.contract
    }

    /// Names of the callable actions, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.inner.actions.keys().map(String::as_str)
    }

    /// Looks up a callable action's definition.
    pub fn definition(&self, name: &str) -> Option<&ActionDefinition> {
        self.inner.actions.get(name)
    }

    /// Returns the method for an action.
    ///
    /// # Errors
    ///
    /// Returns [`WriteApiError::UnknownAction`] if no such action exists.
    pub fn action(&self, name: &str) -> WriteApiResult<ActionMethod> {
        if !self.inner.actions.contains_key(name) {
            return Err(WriteApiError::UnknownAction(name.to_string()));
        }
        Ok(ActionMethod {
            api: self.clone(),
            name: name.to_string(),
        })
    }

    /// Describes how to call an action.
    ///
    /// # Errors
    ///
    /// Returns [`WriteApiError::UnknownAction`] if the schema has no such type.
    pub fn usage(&self, name: &str) -> WriteApiResult<String> {
        usage::usage(self.inner.registry.as_ref(), name)
    }

    /// Finalizes a request or a batch.
    ///
    /// For a batch, the routine runs once against a
    /// [`MessageCollector`](crate::transaction::batch::MessageCollector) and
    /// the collected actions are submitted as one transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed request and a configuration
    /// error if signing is requested without a sign provider. Later failures
    /// arrive through the returned future.
    pub fn transaction(
        &self,
        input: impl Into<TransactionInput>,
        settings: CallSettings,
    ) -> WriteApiResult<PendingTransaction> {
        let options = settings.resolve(
            self.config().transaction_options(),
            &OptionOverrides::default(),
        );
        match input.into() {
            TransactionInput::Request(request) => finalizer::start(self, request, options),
            TransactionInput::Batch(routine) => {
                finalizer::ensure_signer(self, &options)?;
                debug!("starting multi-message transaction");
                let api = self.clone();
                Ok(PendingTransaction::new(async move {
                    let request = batch::collect(api.clone(), routine).await?;
                    finalizer::start(&api, request, options)?.await
                }))
            }
        }
    }

    /// Like [`transaction`](Self::transaction), delivering the outcome to
    /// `callback` instead of a future.
    ///
    /// # Errors
    ///
    /// Returns the same synchronous errors as `transaction`, or a
    /// configuration error outside a Tokio runtime.
    pub fn transaction_with_callback<C>(
        &self,
        input: impl Into<TransactionInput>,
        settings: CallSettings,
        callback: C,
    ) -> WriteApiResult<()>
    where
        C: FnOnce(WriteApiResult<SignedTransaction>) + Send + 'static,
    {
        self.transaction(input, settings)?.on_complete(callback)
    }

    pub(crate) fn inner(&self) -> Arc<Inner> {
        self.inner.clone()
    }
}

impl fmt::Debug for WriteApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteApi")
            .field("chain_id", &self.inner.chain_id)
            .field("contract", &self.inner.contract)
            .field("actions", &self.inner.actions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`WriteApi`] with custom collaborators.
pub struct WriteApiBuilder {
    config: WriteApiConfig,
    network: Option<Arc<dyn Network>>,
    registry: Option<Arc<dyn SchemaRegistry>>,
    codec: Option<Arc<dyn Codec>>,
}

impl WriteApiBuilder {
    /// Uses `network` instead of the HTTP network.
    #[must_use]
    pub fn with_network(mut self, network: Arc<dyn Network>) -> Self {
        self.network = Some(network);
        self
    }

    /// Uses `registry` instead of the built-in schema.
    #[must_use]
    pub fn with_schema(mut self, registry: Arc<dyn SchemaRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses `codec` instead of BCS.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Builds the write API.
    ///
    /// Only types whose names start with a lower-case letter become actions.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the chain id or contract is missing
    /// or invalid, or the built-in schema or HTTP client fails to load.
    pub fn build(self) -> WriteApiResult<WriteApi> {
        let chain_id = self.config.chain_id()?;
        let contract = self.config.contract()?;
        let network = match self.network {
            Some(network) => network,
            None => Arc::new(HttpNetwork::new(&self.config)?),
        };
        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(Schema::builtin()?),
        };
        let codec = self.codec.unwrap_or_else(|| Arc::new(BcsCodec));

        let mut actions = BTreeMap::new();
        for definition in registry.definitions() {
            if !definition.is_action() {
                continue;
            }
            if definition.name == RESERVED_TRANSACTION_NAME {
                warn!(
                    action = RESERVED_TRANSACTION_NAME,
                    "schema type conflicts with the transaction method; skipping"
                );
                continue;
            }
            actions.insert(definition.name.clone(), definition);
        }
        debug!(actions = actions.len(), chain_id = %chain_id, "write api ready");

        Ok(WriteApi {
            inner: Arc::new(Inner {
                config: self.config,
                chain_id,
                contract,
                network,
                registry,
                codec,
                actions,
            }),
        })
    }
}

impl fmt::Debug for WriteApiBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteApiBuilder")
            .field("config", &self.config)
            .field("network", &self.network.is_some())
            .field("registry", &self.registry.is_some())
            .field("codec", &self.codec.is_some())
            .finish()
    }
}

/// A callable action.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run(api: eos_write_api::WriteApi) -> eos_write_api::WriteApiResult<()> {
/// use eos_write_api::CallArgs;
/// use serde_json::json;
///
/// let transfer = api.action("transfer")?;
/// let signed = transfer
///     .call(CallArgs::named(json!({
///         "from": "alice", "to": "bob", "quantity": "1.0000 EOS", "memo": ""
///     })))?
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ActionMethod {
    api: WriteApi,
    name: String,
}

impl ActionMethod {
    /// The action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action's definition.
    pub fn definition(&self) -> Option<&ActionDefinition> {
        self.api.definition(&self.name)
    }

    /// Describes how to call this action.
    ///
    /// # Errors
    ///
    /// Returns [`WriteApiError::UnknownAction`] if the schema has no such type.
    pub fn usage(&self) -> WriteApiResult<String> {
        self.api.usage(&self.name)
    }

    /// Calls the action; the outcome arrives through the returned future.
    ///
    /// # Errors
    ///
    /// With no arguments, returns [`WriteApiError::Usage`] carrying the usage
    /// text. Otherwise returns argument, validation and configuration errors.
    pub fn call(&self, args: impl Into<CallArgs>) -> WriteApiResult<PendingTransaction> {
        match dispatch_action(
            &self.api,
            &self.name,
            args.into(),
            Completion::Future,
            &OptionOverrides::default(),
        )? {
            Dispatch::Pending(pending) => Ok(pending),
            Dispatch::Detached | Dispatch::Fragment(_) => Err(WriteApiError::Internal(format!(
                "{} did not produce a pending transaction",
                self.name
            ))),
        }
    }

    /// Calls the action; the outcome goes to `callback`.
    ///
    /// # Errors
    ///
    /// Returns the same synchronous errors as [`call`](Self::call), or a
    /// configuration error outside a Tokio runtime. These never reach the
    /// callback.
    pub fn call_with_callback<C>(&self, args: impl Into<CallArgs>, callback: C) -> WriteApiResult<()>
    where
        C: FnOnce(WriteApiResult<SignedTransaction>) + Send + 'static,
    {
        match dispatch_action(
            &self.api,
            &self.name,
            args.into(),
            Completion::Callback(Box::new(callback)),
            &OptionOverrides::default(),
        )? {
            Dispatch::Detached => Ok(()),
            Dispatch::Pending(_) | Dispatch::Fragment(_) => Err(WriteApiError::Internal(format!(
                "{} did not hand its result to the callback",
                self.name
            ))),
        }
    }
}
