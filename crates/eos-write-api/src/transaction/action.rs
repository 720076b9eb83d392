//! Building a single action into a transaction fragment.

use super::args::{CallArgs, Completion, NormalizedCall, normalize};
use super::finalizer::{self, PendingTransaction};
use super::options::OptionOverrides;
use super::types::{ActionFragment, Message, TransactionRequest, sorted_scope};
use crate::error::{WriteApiError, WriteApiResult};
use crate::schema::ActionDefinition;
use crate::types::{AccountName, PermissionLevel};
use crate::write_api::WriteApi;
use serde_json::Value;
use tracing::debug;

/// Action names containing this do not put their second account in scope.
///
/// The second account of `newaccount` does not exist yet.
const NO_SECOND_SCOPE_MARKER: &str = "newaccount";

/// What dispatching an action produced.
pub(crate) enum Dispatch {
    /// Submitted; the result arrives through this future.
    Pending(PendingTransaction),
    /// Submitted; the result goes to the caller's callback.
    Detached,
    /// Built only, for a batch.
    Fragment(ActionFragment),
}

impl Dispatch {
    /// The fragment built in collecting mode.
    pub(crate) fn into_fragment(self) -> WriteApiResult<ActionFragment> {
        match self {
            Self::Fragment(fragment) => Ok(fragment),
            Self::Pending(_) | Self::Detached => Err(WriteApiError::Internal(
                "action was submitted instead of collected".to_string(),
            )),
        }
    }
}

/// Builds the fragment for a normalized call.
///
/// Without a scope override, the first declared field supplies scope and an
/// `active` authorization when it is an account name, and the second
/// declared field joins the scope when it is one too (except for
/// `newaccount`-like actions). A scope override replaces the derived scope
/// and disables authorization derivation. An explicit authorization setting
/// always wins.
pub(crate) fn build_fragment(
    contract: &AccountName,
    definition: &ActionDefinition,
    call: NormalizedCall,
) -> WriteApiResult<ActionFragment> {
    let NormalizedCall { params, settings } = call;

    let (scope, derived_authorization) = match settings.scope {
        Some(scope) => (scope, Vec::new()),
        None => derive_scope(definition, &params)?,
    };
    let authorization = settings.authorization.unwrap_or(derived_authorization);

    Ok(ActionFragment {
        scope: sorted_scope(scope),
        messages: vec![Message {
            code: contract.clone(),
            type_name: definition.name.clone(),
            authorization,
            data: Value::Object(params),
        }],
    })
}

fn derive_scope(
    definition: &ActionDefinition,
    params: &serde_json::Map<String, Value>,
) -> WriteApiResult<(Vec<AccountName>, Vec<PermissionLevel>)> {
    let mut scope = Vec::new();
    let mut authorization = Vec::new();
    let mut fields = definition.fields.iter();

    if let Some(first) = fields.next().filter(|f| f.field_type.is_account()) {
        let account = account_param(params, &first.name)?;
        scope.push(account.clone());
        authorization.push(PermissionLevel::active(account));
    }

    if !definition.name.contains(NO_SECOND_SCOPE_MARKER) {
        if let Some(second) = fields.next().filter(|f| f.field_type.is_account()) {
            scope.push(account_param(params, &second.name)?);
        }
    }

    Ok((scope, authorization))
}

fn account_param(params: &serde_json::Map<String, Value>, field: &str) -> WriteApiResult<AccountName> {
    let value = params
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| WriteApiError::argument(format!("'{field}' should be an account name")))?;
    AccountName::new(value)
}

/// Runs one action call through the pipeline.
pub(crate) fn dispatch_action(
    api: &WriteApi,
    name: &str,
    args: CallArgs,
    completion: Completion,
    overrides: &OptionOverrides,
) -> WriteApiResult<Dispatch> {
    let definition = api
        .definition(name)
        .ok_or_else(|| WriteApiError::UnknownAction(name.to_string()))?;

    if args.is_empty() {
        return Err(WriteApiError::Usage(api.usage(name)?));
    }

    if overrides.no_callback && completion.is_callback() {
        return Err(WriteApiError::config(
            "callbacks are not supported inside a multi-message transaction",
        ));
    }

    let call = normalize(definition, args)?;
    let options = call
        .settings
        .resolve(api.config().transaction_options(), overrides);
    let fragment = build_fragment(api.contract(), definition, call)?;
    debug!(
        action = %definition.name,
        scope = ?fragment.scope,
        message_only = overrides.message_only,
        "built action"
    );

    if overrides.message_only {
        return Ok(Dispatch::Fragment(fragment));
    }

    let pending = finalizer::start(api, TransactionRequest::from(fragment), options)?;
    match completion {
        Completion::Future => Ok(Dispatch::Pending(pending)),
        Completion::Callback(callback) => {
            pending.on_complete(callback)?;
            Ok(Dispatch::Detached)
        }
    }
}
