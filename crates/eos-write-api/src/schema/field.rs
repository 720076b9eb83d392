//! Declared field types and how shorthand values pack to bytes.

use super::SchemaRegistry;
use crate::error::{WriteApiError, WriteApiResult};
use crate::types::{AccountName, Asset};
use serde::Serialize;
use serde_json::Value;

/// The type of an action field, parsed from its declared type name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// An account identifier. Drives scope and authorization derivation.
    AccountName,
    /// Any other 64-bit name (permission names and the like).
    Name,
    /// A token quantity such as `"1.0000 EOS"`.
    Asset,
    /// Boolean.
    Bool,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Signed 64-bit integer.
    Int64,
    /// Hex-encoded bytes.
    Bytes,
    /// UTF-8 text.
    String,
    /// A public key in its text form.
    PublicKey,
    /// A sequence, declared as `T[]`.
    Array(Box<FieldType>),
    /// A structure defined by the schema registry, packed field by field.
    Struct(String),
}

/// How deep structures may nest inside one another.
pub(crate) const MAX_NESTING_DEPTH: usize = 16;

impl FieldType {
    /// Parses a declared type name.
    pub fn parse(type_name: &str) -> Self {
        if let Some(element) = type_name.strip_suffix("[]") {
            return Self::Array(Box::new(Self::parse(element)));
        }
        match type_name {
            "AccountName" | "account_name" => Self::AccountName,
            "Name" | "name" | "PermissionName" | "permission_name" => Self::Name,
            "Asset" | "asset" => Self::Asset,
            "Bool" | "bool" => Self::Bool,
            "UInt8" | "uint8" => Self::UInt8,
            "UInt16" | "uint16" => Self::UInt16,
            "UInt32" | "uint32" => Self::UInt32,
            "UInt64" | "uint64" => Self::UInt64,
            "Int64" | "int64" => Self::Int64,
            "Bytes" | "bytes" => Self::Bytes,
            "String" | "string" => Self::String,
            "PublicKey" | "public_key" => Self::PublicKey,
            other => Self::Struct(other.to_string()),
        }
    }

    /// Returns true if values of this type are account identifiers.
    pub fn is_account(&self) -> bool {
        matches!(self, Self::AccountName)
    }

    /// The value shown for this type in usage examples.
    ///
    /// Structures are expanded through `registry`; arrays are empty.
    pub fn default_value<R>(&self, registry: &R) -> Value
    where
        R: SchemaRegistry + ?Sized,
    {
        self.default_at(registry, 0)
    }

    pub(crate) fn default_at<R>(&self, registry: &R, depth: usize) -> Value
    where
        R: SchemaRegistry + ?Sized,
    {
        match self {
            Self::AccountName | Self::Name | Self::Bytes | Self::String | Self::PublicKey => {
                Value::from("")
            }
            Self::Asset => Value::from("0.0000 EOS"),
            Self::Bool => Value::from(false),
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 | Self::Int64 => {
                Value::from(0)
            }
            Self::Array(_) => Value::Array(Vec::new()),
            Self::Struct(name) if depth < MAX_NESTING_DEPTH => registry
                .definition(name)
                .map_or(Value::Null, |d| d.example_at(registry, depth + 1)),
            Self::Struct(_) => Value::Null,
        }
    }

    /// Packs a shorthand JSON value into its binary form.
    ///
    /// Numbers may be given as JSON numbers or numeric strings. Structures
    /// are looked up in `registry` and packed in their declared field order;
    /// arrays are packed as a length followed by each element.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the value does not fit the type or names
    /// a structure the registry does not define.
    pub fn pack<R>(&self, value: &Value, registry: &R) -> WriteApiResult<Vec<u8>>
    where
        R: SchemaRegistry + ?Sized,
    {
        self.pack_at(value, registry, 0)
    }

    pub(crate) fn pack_at<R>(
        &self,
        value: &Value,
        registry: &R,
        depth: usize,
    ) -> WriteApiResult<Vec<u8>>
    where
        R: SchemaRegistry + ?Sized,
    {
        match self {
            Self::AccountName | Self::Name => {
                let name = AccountName::new(expect_str(value, "name")?)?;
                to_bcs(&name)
            }
            Self::Asset => {
                let asset: Asset = expect_str(value, "asset")?.parse()?;
                to_bcs(&asset)
            }
            Self::Bool => match value {
                Value::Bool(b) => to_bcs(b),
                Value::String(s) if s == "true" || s == "false" => to_bcs(&(s == "true")),
                _ => Err(mismatch(value, "bool")),
            },
            Self::UInt8 => to_bcs(&narrow::<u8>(unsigned(value)?, value)?),
            Self::UInt16 => to_bcs(&narrow::<u16>(unsigned(value)?, value)?),
            Self::UInt32 => to_bcs(&narrow::<u32>(unsigned(value)?, value)?),
            Self::UInt64 => to_bcs(&unsigned(value)?),
            Self::Int64 => {
                let n = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                };
                to_bcs(&n.ok_or_else(|| mismatch(value, "int64"))?)
            }
            Self::Bytes => {
                let text = expect_str(value, "hex bytes")?;
                let bytes = hex::decode(text.trim_start_matches("0x"))?;
                to_bcs(&serde_bytes::Bytes::new(&bytes))
            }
            Self::String | Self::PublicKey => to_bcs(&expect_str(value, "string")?),
            Self::Array(element) => {
                let items = value.as_array().ok_or_else(|| mismatch(value, "array"))?;
                let mut packed = uleb128(items.len());
                for item in items {
                    packed.extend(element.pack_at(item, registry, depth)?);
                }
                Ok(packed)
            }
            Self::Struct(name) => {
                if depth >= MAX_NESTING_DEPTH {
                    return Err(WriteApiError::validation(format!(
                        "{name} nests deeper than {MAX_NESTING_DEPTH} levels"
                    )));
                }
                registry
                    .definition(name)
                    .ok_or_else(|| WriteApiError::validation(format!("unknown type '{name}'")))?
                    .pack_at(value, registry, depth + 1)
            }
        }
    }
}

fn expect_str<'a>(value: &'a Value, expected: &str) -> WriteApiResult<&'a str> {
    value.as_str().ok_or_else(|| mismatch(value, expected))
}

fn unsigned(value: &Value) -> WriteApiResult<u64> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    n.ok_or_else(|| mismatch(value, "unsigned integer"))
}

fn narrow<T: TryFrom<u64>>(n: u64, value: &Value) -> WriteApiResult<T> {
    T::try_from(n).map_err(|_| WriteApiError::validation(format!("{value} is out of range")))
}

fn mismatch(value: &Value, expected: &str) -> WriteApiError {
    WriteApiError::validation(format!("expecting {expected}, got {value}"))
}

/// Sequence length prefix, as BCS writes it.
fn uleb128(len: usize) -> Vec<u8> {
    let mut value = len as u64;
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

fn to_bcs<T: Serialize + ?Sized>(value: &T) -> WriteApiResult<Vec<u8>> {
    bcs::to_bytes(value).map_err(WriteApiError::codec)
}
