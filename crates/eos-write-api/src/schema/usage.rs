//! Human-readable action descriptions, shown when an action is called with
//! no arguments.

use super::SchemaRegistry;
use crate::error::{WriteApiError, WriteApiResult};
use serde_json::Value;

/// Describes how to call an action.
///
/// The text has three parts: the action name, `USAGE` followed by the
/// definition as pretty-printed JSON, and `EXAMPLE STRUCTURE` followed by
/// default-populated data.
///
/// # Errors
///
/// Returns [`WriteApiError::UnknownAction`] if the registry has no such type.
pub fn usage(registry: &dyn SchemaRegistry, name: &str) -> WriteApiResult<String> {
    let definition = registry
        .definition(name)
        .ok_or_else(|| WriteApiError::UnknownAction(name.to_string()))?;
    let example = registry.example(name).unwrap_or(Value::Null);
    Ok(format!(
        "{name}\n\nUSAGE\n{}\n\nEXAMPLE STRUCTURE\n{}",
        serde_json::to_string_pretty(&definition.to_json())?,
        serde_json::to_string_pretty(&example)?,
    ))
}
