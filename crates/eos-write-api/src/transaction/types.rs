//! Transaction types.
//!
//! A transaction moves through three shapes:
//!
//! - [`TransactionRequest`]: scope plus shorthand messages, as built by the
//!   action builder or supplied directly by a caller.
//! - [`RawTransaction`]: the request merged with the chain context headers,
//!   still in shorthand form (message data as JSON).
//! - [`Transaction`]: the canonical form with packed message data. This is
//!   what the codec serializes and what gets signed. [`SignedTransaction`]
//!   adds the signatures.

use crate::error::{WriteApiError, WriteApiResult};
use crate::types::{AccountName, PermissionLevel, TimePointSec, hex_bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// One action invocation in shorthand form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The contract account that implements the action.
    pub code: AccountName,
    /// The action type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Who must sign for this action.
    pub authorization: Vec<PermissionLevel>,
    /// Action fields by name.
    pub data: Value,
}

/// The scope and single message produced by building one action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionFragment {
    /// Accounts the action touches, sorted and deduplicated.
    pub scope: Vec<AccountName>,
    /// Exactly one message.
    pub messages: Vec<Message>,
}

impl ActionFragment {
    /// Returns the fragment's message.
    pub fn message(&self) -> Option<&Message> {
        self.messages.first()
    }
}

impl From<ActionFragment> for TransactionRequest {
    fn from(fragment: ActionFragment) -> Self {
        Self {
            scope: fragment.scope,
            readscope: Vec::new(),
            messages: fragment.messages,
        }
    }
}

/// A transaction as requested by the caller, before chain context is known.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Accounts whose state the transaction writes.
    pub scope: Vec<AccountName>,
    /// Accounts whose state the transaction only reads.
    #[serde(default, alias = "read_scope")]
    pub readscope: Vec<AccountName>,
    /// The messages, in execution order.
    pub messages: Vec<Message>,
}

impl TransactionRequest {
    /// Parses a request from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `scope` or `messages` is not an array,
    /// any message lacks an authorization list, or a field fails to parse.
    pub fn from_value(value: Value) -> WriteApiResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            WriteApiError::validation("first transaction argument should be an object")
        })?;
        if !object.get("scope").is_some_and(Value::is_array) {
            return Err(WriteApiError::validation("expecting scope array"));
        }
        let messages = object
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| WriteApiError::validation("expecting messages array"))?;
        for message in messages {
            let has_authorization = message
                .get("authorization")
                .and_then(Value::as_array)
                .is_some_and(|auth| !auth.is_empty());
            if !has_authorization {
                return Err(WriteApiError::validation(format!(
                    "expecting message.authorization array: {message}"
                )));
            }
        }
        serde_json::from_value(value)
            .map_err(|e| WriteApiError::validation(format!("malformed transaction: {e}")))
    }

    /// Checks the request invariants and normalizes the scope order.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any message has an empty authorization.
    pub fn validate(&mut self) -> WriteApiResult<()> {
        if let Some(message) = self.messages.iter().find(|m| m.authorization.is_empty()) {
            return Err(WriteApiError::validation(format!(
                "expecting message.authorization array for '{}'",
                message.type_name
            )));
        }
        self.scope = sorted_scope(std::mem::take(&mut self.scope));
        self.readscope = sorted_scope(std::mem::take(&mut self.readscope));
        Ok(())
    }
}

/// Sorts and deduplicates a scope.
pub(crate) fn sorted_scope<I>(accounts: I) -> Vec<AccountName>
where
    I: IntoIterator<Item = AccountName>,
{
    accounts
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Chain context for a new transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeaders {
    /// Low 16 bits of the reference block number.
    pub ref_block_num: u16,
    /// Prefix of the reference block id.
    pub ref_block_prefix: u32,
    /// When the transaction stops being valid.
    pub expiration: TimePointSec,
}

/// A transaction with chain context, message data still in shorthand form.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RawTransaction {
    /// Low 16 bits of the reference block number.
    pub ref_block_num: u16,
    /// Prefix of the reference block id.
    pub ref_block_prefix: u32,
    /// Expiration time.
    pub expiration: TimePointSec,
    /// Write scope.
    pub scope: Vec<AccountName>,
    /// Read scope.
    pub read_scope: Vec<AccountName>,
    /// Shorthand messages.
    pub messages: Vec<Message>,
}

impl RawTransaction {
    /// Merges a request into the context headers.
    pub fn new(headers: TransactionHeaders, request: TransactionRequest) -> Self {
        Self {
            ref_block_num: headers.ref_block_num,
            ref_block_prefix: headers.ref_block_prefix,
            expiration: headers.expiration,
            scope: request.scope,
            read_scope: request.readscope,
            messages: request.messages,
        }
    }
}

/// A message with its data packed to bytes by the schema registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedMessage {
    /// The contract account.
    pub code: AccountName,
    /// The action type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Who must sign for this action.
    pub authorization: Vec<PermissionLevel>,
    /// Packed action fields.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// The canonical unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Low 16 bits of the reference block number.
    pub ref_block_num: u16,
    /// Prefix of the reference block id.
    pub ref_block_prefix: u32,
    /// Expiration time.
    pub expiration: TimePointSec,
    /// Write scope, sorted.
    pub scope: Vec<AccountName>,
    /// Read scope, sorted.
    pub read_scope: Vec<AccountName>,
    /// Messages in execution order.
    pub messages: Vec<PackedMessage>,
}

/// A transaction together with its signatures.
///
/// Serializes to JSON as the transaction fields plus `signatures`, the shape
/// the chain's push endpoint accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// The canonical transaction that was signed.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Signatures in the order the sign provider produced them.
    pub signatures: Vec<String>,
}

impl SignedTransaction {
    /// Wraps a transaction with no signatures.
    pub fn unsigned(transaction: Transaction) -> Self {
        Self {
            transaction,
            signatures: Vec::new(),
        }
    }

    /// Returns true if no signing pass added signatures.
    pub fn is_unsigned(&self) -> bool {
        self.signatures.is_empty()
    }
}
