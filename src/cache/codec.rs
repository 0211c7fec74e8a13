// Wire encoding for cached results
// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a result as JSON text for the store.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a stored value. Fails with `Serialization` on malformed or
/// mistyped input.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}
