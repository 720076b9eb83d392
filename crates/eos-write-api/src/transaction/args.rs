//! Call arguments and their normalization.
//!
//! An action can be called three ways:
//!
//! - positionally, one value per declared field: `transfer("alice", "bob", "1.0000 EOS", "")`
//! - by name, with a single object: `transfer({"from": "alice", ...})`
//! - either of the above followed by settings, an object or a boolean
//!   meaning `{broadcast: value}`
//!
//! Normalization turns any of these into a `NormalizedCall` whose params
//! follow the declared field order.

use super::options::CallSettings;
use super::types::SignedTransaction;
use crate::error::{WriteApiError, WriteApiResult};
use crate::schema::ActionDefinition;
use serde_json::{Map, Value};
use std::fmt;

/// Completion callback for the callback entry points.
pub type TransactionCallback = Box<dyn FnOnce(WriteApiResult<SignedTransaction>) + Send + 'static>;

/// Arguments to an action call.
///
/// # Example
///
/// ```rust
/// use eos_write_api::{CallArgs, CallSettings};
/// use serde_json::json;
///
/// let positional = CallArgs::new()
///     .arg("alice")
///     .arg("bob")
///     .arg("1.0000 EOS")
///     .arg("")
///     .settings(CallSettings::new().with_broadcast(false));
/// assert_eq!(positional.len(), 5);
///
/// let named = CallArgs::named(json!({"from": "alice", "to": "bob"}));
/// assert_eq!(named.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallArgs {
    values: Vec<Value>,
    settings: Option<CallSettings>,
}

impl CallArgs {
    /// No arguments. Calling an action with no arguments reports its usage.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single object supplying the params by name.
    pub fn named(params: Value) -> Self {
        Self::new().arg(params)
    }

    /// Appends a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Attaches typed settings.
    ///
    /// Typed settings are always taken as settings, whatever the argument
    /// count. A trailing object or boolean passed with [`arg`](Self::arg) is
    /// only taken as settings when the argument count calls for it.
    #[must_use]
    pub fn settings(mut self, settings: CallSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Number of arguments, settings included.
    pub fn len(&self) -> usize {
        self.values.len() + usize::from(self.settings.is_some())
    }

    /// Returns true if there are no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for CallArgs {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values,
            settings: None,
        }
    }
}

impl FromIterator<Value> for CallArgs {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// How a call's result is delivered.
pub(crate) enum Completion {
    /// Through the returned future.
    Future,
    /// Through a callback; the call itself returns nothing.
    Callback(TransactionCallback),
}

impl Completion {
    pub(crate) fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Future => f.write_str("Future"),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// A call in canonical form.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NormalizedCall {
    /// Field values keyed by field name, in declared order.
    pub(crate) params: Map<String, Value>,
    /// Caller settings.
    pub(crate) settings: CallSettings,
}

/// Normalizes `args` against `definition`.
///
/// The caller handles the empty argument list (usage) before getting here.
pub(crate) fn normalize(
    definition: &ActionDefinition,
    args: CallArgs,
) -> WriteApiResult<NormalizedCall> {
    let CallArgs {
        mut values,
        settings,
    } = args;
    let expected = definition.fields.len();

    let settings = match settings {
        Some(settings) => settings,
        None if trailing_settings(&values, expected) => match values.pop() {
            Some(value) => CallSettings::from_value(value)?,
            None => CallSettings::default(),
        },
        None => CallSettings::default(),
    };

    let params = match values.as_slice() {
        [Value::Object(named)] => named_params(definition, named)?,
        _ => positional_params(definition, values)?,
    };

    Ok(NormalizedCall { params, settings })
}

fn trailing_settings(values: &[Value], expected: usize) -> bool {
    let by_count = values.len() == expected + 1;
    let after_named = values.len() == 2 && values[0].is_object();
    (by_count || after_named) && matches!(values.last(), Some(Value::Object(_) | Value::Bool(_)))
}

fn named_params(
    definition: &ActionDefinition,
    named: &Map<String, Value>,
) -> WriteApiResult<Map<String, Value>> {
    if let Some(extra) = named.keys().find(|k| definition.field(k).is_none()) {
        return Err(WriteApiError::argument(format!(
            "{} has no parameter named '{extra}', expecting {}",
            definition.name,
            definition.signature()
        )));
    }
    definition
        .fields
        .iter()
        .map(|field| {
            named
                .get(&field.name)
                .map(|value| (field.name.clone(), value.clone()))
                .ok_or_else(|| {
                    WriteApiError::argument(format!(
                        "{} is missing parameter '{}', expecting {}",
                        definition.name,
                        field.name,
                        definition.signature()
                    ))
                })
        })
        .collect()
}

fn positional_params(
    definition: &ActionDefinition,
    values: Vec<Value>,
) -> WriteApiResult<Map<String, Value>> {
    let expected = definition.fields.len();
    if values.len() != expected {
        return Err(WriteApiError::argument(format!(
            "{} is expecting {expected} parameters but {} were provided: {}",
            definition.name,
            values.len(),
            definition.signature()
        )));
    }
    Ok(definition
        .field_names()
        .map(str::to_string)
        .zip(values)
        .collect())
}
