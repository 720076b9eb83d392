//! Per-call settings and the transaction options they resolve to.

use crate::error::{WriteApiError, WriteApiResult};
use crate::types::{AccountName, PermissionLevel};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Seconds a new transaction stays valid unless the caller says otherwise.
pub const DEFAULT_EXPIRE_IN_SECONDS: u64 = 60;

/// Fully resolved options for one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptions {
    /// Expiration, relative to the head block time.
    pub expire_in_seconds: u64,
    /// Submit the transaction after signing.
    pub broadcast: bool,
    /// Run the signing pass.
    pub sign: bool,
    /// Pass-through keys, handed to the sign provider untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            expire_in_seconds: DEFAULT_EXPIRE_IN_SECONDS,
            broadcast: true,
            sign: true,
            extra: Map::new(),
        }
    }
}

/// Settings supplied with a call.
///
/// Every field is optional; unset fields fall back to the configured
/// [`TransactionOptions`]. Unrecognized keys are kept in `extra` and merged
/// over the configured pass-through keys.
///
/// # Example
///
/// ```rust
/// use eos_write_api::CallSettings;
///
/// let settings = CallSettings::new().with_broadcast(false).with_expire_in_seconds(30);
/// assert_eq!(settings.broadcast, Some(false));
///
/// let from_json = CallSettings::from_value(serde_json::json!({"sign": false})).unwrap();
/// assert_eq!(from_json.sign, Some(false));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSettings {
    /// Expiration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_in_seconds: Option<u64>,
    /// Submit after signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<bool>,
    /// Run the signing pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<bool>,
    /// Replaces the derived scope of an action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<AccountName>>,
    /// Authorization used together with a `scope` override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Vec<PermissionLevel>>,
    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallSettings {
    /// Empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from a call argument.
    ///
    /// An object is read as settings; a boolean is shorthand for
    /// `{broadcast: value}`.
    ///
    /// # Errors
    ///
    /// Returns an argument error for any other value, or an object whose
    /// recognized keys have the wrong type.
    pub fn from_value(value: Value) -> WriteApiResult<Self> {
        match value {
            Value::Bool(broadcast) => Ok(Self::new().with_broadcast(broadcast)),
            value @ Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| WriteApiError::argument(format!("invalid settings: {e}"))),
            other => Err(WriteApiError::argument(format!(
                "settings should be an object or a boolean, got {other}"
            ))),
        }
    }

    /// Sets the expiration.
    #[must_use]
    pub fn with_expire_in_seconds(mut self, seconds: u64) -> Self {
        self.expire_in_seconds = Some(seconds);
        self
    }

    /// Sets whether to submit.
    #[must_use]
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    /// Sets whether to sign.
    #[must_use]
    pub fn with_sign(mut self, sign: bool) -> Self {
        self.sign = Some(sign);
        self
    }

    /// Overrides the derived scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Vec<AccountName>) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Sets the authorization used with a scope override.
    #[must_use]
    pub fn with_authorization(mut self, authorization: Vec<PermissionLevel>) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Resolves these settings over `defaults`; internal overrides win last.
    ///
    /// Pass-through keys are merged, caller keys replacing configured ones.
    pub(crate) fn resolve(
        &self,
        defaults: &TransactionOptions,
        overrides: &OptionOverrides,
    ) -> TransactionOptions {
        TransactionOptions {
            expire_in_seconds: self.expire_in_seconds.unwrap_or(defaults.expire_in_seconds),
            broadcast: overrides
                .broadcast
                .or(self.broadcast)
                .unwrap_or(defaults.broadcast),
            sign: self.sign.unwrap_or(defaults.sign),
            extra: defaults
                .extra
                .iter()
                .chain(&self.extra)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl From<bool> for CallSettings {
    fn from(broadcast: bool) -> Self {
        Self::new().with_broadcast(broadcast)
    }
}

/// Internal call mode used while collecting batch members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OptionOverrides {
    /// Forces the broadcast option.
    pub(crate) broadcast: Option<bool>,
    /// Hand the built fragment back instead of finalizing it.
    pub(crate) message_only: bool,
    /// Reject callback completion.
    pub(crate) no_callback: bool,
}

impl OptionOverrides {
    /// The mode batch members are built in.
    pub(crate) fn collecting() -> Self {
        Self {
            broadcast: Some(false),
            message_only: true,
            no_callback: true,
        }
    }
}
