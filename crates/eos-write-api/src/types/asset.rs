//! Token quantities.
//!
//! An [`Asset`] is written in shorthand as `"1.0000 EOS"`: the number of
//! digits after the decimal point is the symbol's precision.

use crate::error::{WriteApiError, WriteApiResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The maximum length of a symbol code.
pub const MAX_SYMBOL_LENGTH: usize = 7;

/// A token symbol: precision plus an upper-case code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    /// Creates a symbol, validating the code.
    pub fn new(precision: u8, code: impl Into<String>) -> WriteApiResult<Self> {
        let code = code.into();
        if code.is_empty() || code.len() > MAX_SYMBOL_LENGTH {
            return Err(WriteApiError::InvalidAsset(format!(
                "symbol '{code}' must be 1 to {MAX_SYMBOL_LENGTH} characters"
            )));
        }
        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(WriteApiError::InvalidAsset(format!(
                "symbol '{code}' must be upper-case A-Z"
            )));
        }
        if precision > 18 {
            return Err(WriteApiError::InvalidAsset(format!(
                "precision {precision} is larger than 18"
            )));
        }
        Ok(Self { precision, code })
    }

    /// Returns the decimal precision.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the symbol code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Packs the symbol: precision in the low byte, code bytes above it.
    pub fn to_u64(&self) -> u64 {
        self.code
            .bytes()
            .enumerate()
            .fold(u64::from(self.precision), |value, (i, b)| {
                value | (u64::from(b) << (8 * (i + 1)))
            })
    }

    /// Unpacks a symbol.
    pub fn from_u64(value: u64) -> WriteApiResult<Self> {
        let precision = (value & 0xff) as u8;
        let code: String = (1..=MAX_SYMBOL_LENGTH)
            .map(|i| ((value >> (8 * i)) & 0xff) as u8)
            .take_while(|b| *b != 0)
            .map(char::from)
            .collect();
        Self::new(precision, code)
    }
}

/// A signed token amount in the smallest unit of its symbol.
///
/// # Example
///
/// ```rust
/// use eos_write_api::Asset;
///
/// let asset: Asset = "1.0000 EOS".parse().unwrap();
/// assert_eq!(asset.amount(), 10_000);
/// assert_eq!(asset.symbol().precision(), 4);
/// assert_eq!(asset.to_string(), "1.0000 EOS");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    /// Creates an asset from a raw amount and symbol.
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// Returns the raw amount.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns the symbol.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }
}

impl FromStr for Asset {
    type Err = WriteApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WriteApiError::InvalidAsset(format!("expecting 'amount SYMBOL', got '{s}'"));
        let (quantity, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, quantity) = match quantity.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, quantity),
        };
        let (whole, fraction) = quantity.split_once('.').unwrap_or((quantity, ""));
        if whole.is_empty() || !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let precision = u8::try_from(fraction.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(precision, code.trim())?;
        let digits = format!("{whole}{fraction}");
        let magnitude: i64 = digits
            .parse()
            .map_err(|_| WriteApiError::InvalidAsset(format!("amount out of range in '{s}'")))?;
        let amount = if negative { -magnitude } else { magnitude };
        Ok(Self { amount, symbol })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let digits = format!("{:0>width$}", self.amount.unsigned_abs(), width = precision + 1);
        let (whole, fraction) = digits.split_at(digits.len() - precision);
        if precision == 0 {
            write!(f, "{sign}{whole} {}", self.symbol.code)
        } else {
            write!(f, "{sign}{whole}.{fraction} {}", self.symbol.code)
        }
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            (self.amount, self.symbol.to_u64()).serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let (amount, symbol) = <(i64, u64)>::deserialize(deserializer)?;
            let symbol = Symbol::from_u64(symbol).map_err(serde::de::Error::custom)?;
            Ok(Self { amount, symbol })
        }
    }
}
