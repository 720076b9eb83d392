//! Action definitions and shorthand resolution.
//!
//! A schema maps type names to their ordered field lists. The write API asks
//! the registry for the lower-case action types it should expose and, at
//! finalization time, to pack each message's JSON data into bytes.
//!
//! # Example
//!
//! ```rust
//! use eos_write_api::schema::{Schema, SchemaRegistry};
//!
//! let schema = Schema::builtin().unwrap();
//! let transfer = schema.definition("transfer").unwrap();
//! assert_eq!(transfer.signature(), "transfer(from, to, quantity, memo, [settings])");
//! ```

mod field;
pub mod usage;

pub use field::FieldType;

use crate::error::{WriteApiError, WriteApiResult};
use crate::transaction::types::{Message, PackedMessage, RawTransaction, Transaction};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const BUILTIN_SCHEMA: &str = include_str!("default_schema.json");

/// One declared field of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Declared type name, as written in the schema.
    pub type_name: String,
    /// Parsed type.
    pub field_type: FieldType,
}

impl FieldDefinition {
    /// Creates a field definition from its name and declared type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            field_type: FieldType::parse(&type_name),
            type_name,
        }
    }
}

/// A named type with ordered fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionDefinition {
    /// Type name.
    pub name: String,
    /// Fields in declared order.
    pub fields: Vec<FieldDefinition>,
}

impl ActionDefinition {
    /// Creates a definition from `(field, type)` pairs.
    pub fn new<N, T>(name: impl Into<String>, fields: impl IntoIterator<Item = (N, T)>) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(n, t)| FieldDefinition::new(n, t))
                .collect(),
        }
    }

    /// Returns the field names in declared order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if this type can be called as an action.
    ///
    /// Only types whose names start with a lower-case letter are actions;
    /// capitalized names are helper structures.
    pub fn is_action(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_lowercase())
    }

    /// The call shape, e.g. `transfer(from, to, quantity, memo, [settings])`.
    pub fn signature(&self) -> String {
        let mut params: Vec<&str> = self.field_names().collect();
        params.push("[settings]");
        format!("{}({})", self.name, params.join(", "))
    }

    /// The definition as it appears in a JSON schema document.
    pub fn to_json(&self) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), Value::from(f.type_name.clone())))
            .collect();
        serde_json::json!({ "fields": fields })
    }

    /// Default-populated data for this type, nested structures expanded
    /// through `registry`.
    pub fn example<R>(&self, registry: &R) -> Value
    where
        R: SchemaRegistry + ?Sized,
    {
        self.example_at(registry, 0)
    }

    pub(crate) fn example_at<R>(&self, registry: &R, depth: usize) -> Value
    where
        R: SchemaRegistry + ?Sized,
    {
        Value::Object(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.field_type.default_at(registry, depth)))
                .collect(),
        )
    }

    /// Packs a message's shorthand data into bytes, fields in declared order.
    ///
    /// Fields that name other structures are packed the same way, with their
    /// definitions taken from `registry`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `data` is not an object, a declared field
    /// is missing, an undeclared key is present, or a value does not fit its
    /// declared type.
    pub fn pack<R>(&self, data: &Value, registry: &R) -> WriteApiResult<Vec<u8>>
    where
        R: SchemaRegistry + ?Sized,
    {
        self.pack_at(data, registry, 0)
    }

    pub(crate) fn pack_at<R>(
        &self,
        data: &Value,
        registry: &R,
        depth: usize,
    ) -> WriteApiResult<Vec<u8>>
    where
        R: SchemaRegistry + ?Sized,
    {
        let object = data.as_object().ok_or_else(|| {
            WriteApiError::validation(format!("{} data should be an object", self.name))
        })?;
        if let Some(extra) = object.keys().find(|k| self.field(k).is_none()) {
            return Err(WriteApiError::validation(format!(
                "{} has no field named '{extra}'",
                self.name
            )));
        }
        let mut packed = Vec::new();
        for field in &self.fields {
            let value = object.get(&field.name).ok_or_else(|| {
                WriteApiError::validation(format!("{} is missing '{}'", self.name, field.name))
            })?;
            let bytes = field.field_type.pack_at(value, registry, depth).map_err(|e| {
                WriteApiError::validation(format!("{}.{}: {e}", self.name, field.name))
            })?;
            packed.extend(bytes);
        }
        Ok(packed)
    }
}

/// Source of action definitions and shorthand resolution.
pub trait SchemaRegistry: Send + Sync {
    /// All known type definitions, actions and helper structures alike.
    fn definitions(&self) -> Vec<ActionDefinition>;

    /// Looks up one definition by type name.
    fn definition(&self, name: &str) -> Option<ActionDefinition>;

    /// Packs every message's data, producing the canonical transaction.
    ///
    /// Message data given as a hex string is taken as already packed.
    fn resolve_transaction(&self, raw: RawTransaction) -> WriteApiResult<Transaction> {
        let messages = raw
            .messages
            .into_iter()
            .map(|message| self.resolve_message(message))
            .collect::<WriteApiResult<Vec<_>>>()?;
        Ok(Transaction {
            ref_block_num: raw.ref_block_num,
            ref_block_prefix: raw.ref_block_prefix,
            expiration: raw.expiration,
            scope: raw.scope,
            read_scope: raw.read_scope,
            messages,
        })
    }

    /// Packs one message's data.
    fn resolve_message(&self, message: Message) -> WriteApiResult<PackedMessage> {
        let data = match &message.data {
            Value::String(packed) => hex::decode(packed.trim_start_matches("0x"))?,
            data => self
                .definition(&message.type_name)
                .ok_or_else(|| WriteApiError::UnknownAction(message.type_name.clone()))?
                .pack(data, self)?,
        };
        Ok(PackedMessage {
            code: message.code,
            type_name: message.type_name,
            authorization: message.authorization,
            data,
        })
    }

    /// Default-populated data for a type, if known.
    fn example(&self, name: &str) -> Option<Value> {
        self.definition(name).map(|d| d.example(self))
    }
}

/// A schema loaded from a JSON document.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    definitions: BTreeMap<String, ActionDefinition>,
}

impl Schema {
    /// Parses a schema document of the form
    /// `{"transfer": {"fields": {"from": "AccountName", ...}}, ...}`.
    ///
    /// Field order is the order fields appear in the document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is not valid JSON or
    /// does not have the expected shape.
    pub fn from_json(json: &str) -> WriteApiResult<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| WriteApiError::config(format!("invalid schema document: {e}")))?;
        let types = document
            .as_object()
            .ok_or_else(|| WriteApiError::config("schema document should be an object"))?;

        let mut definitions = BTreeMap::new();
        for (name, body) in types {
            let fields = body
                .get("fields")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    WriteApiError::config(format!("schema type '{name}' has no fields object"))
                })?;
            let fields = fields
                .iter()
                .map(|(field, ty)| {
                    ty.as_str().map(|ty| (field.clone(), ty.to_string())).ok_or_else(|| {
                        WriteApiError::config(format!(
                            "schema field '{name}.{field}' should name a type"
                        ))
                    })
                })
                .collect::<WriteApiResult<Vec<_>>>()?;
            definitions.insert(name.clone(), ActionDefinition::new(name.clone(), fields));
        }
        Ok(Self { definitions })
    }

    /// The schema bundled with the crate, covering the system contract.
    pub fn builtin() -> WriteApiResult<Self> {
        Self::from_json(BUILTIN_SCHEMA)
    }

    /// Adds or replaces a definition.
    #[must_use]
    pub fn with_definition(mut self, definition: ActionDefinition) -> Self {
        self.definitions.insert(definition.name.clone(), definition);
        self
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the schema holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl SchemaRegistry for Schema {
    fn definitions(&self) -> Vec<ActionDefinition> {
        self.definitions.values().cloned().collect()
    }

    fn definition(&self, name: &str) -> Option<ActionDefinition> {
        self.definitions.get(name).cloned()
    }
}
