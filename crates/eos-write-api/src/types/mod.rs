//! Core chain types.
//!
//! Account names, permission levels, assets, timestamps and chain ids. Each
//! serializes as text in JSON and in its packed binary form through the codec.

mod asset;
mod chain_id;
mod name;
mod timestamp;

pub(crate) mod hex_bytes;

pub use asset::{Asset, MAX_SYMBOL_LENGTH, Symbol};
pub use chain_id::ChainId;
pub use name::{AccountName, MAX_NAME_LENGTH, PermissionLevel};
pub use timestamp::TimePointSec;
