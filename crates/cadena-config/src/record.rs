//! The stored shape of a chain.
//!
//! ```json
//! {
//!   "id": "2D7C0612-5D96-489B-8DD6-CAFBB3AA0F4F",
//!   "name": "Example queue 1",
//!   "volume": 1,
//!   "lastOpenedFile": "file:///Users/me/loop.wav",
//!   "banks": [{"type": "reverb", "preset": "2", "wetDryMix": "23.410406", "bypass": "Off"}, ...]
//! }
//! ```
//!
//! Bank values are always strings, numbers included.
//!
//! Reading is lenient: each record is parsed on its own, so one malformed
//! record cannot take the rest of the collection down with it.

use std::collections::BTreeMap;

use cadena_core::ChainId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// One slot as a flat string map. The `"type"` key selects which other keys
/// are meaningful.
pub type BankMap = BTreeMap<String, String>;

/// A chain as stored in the saved blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Durable chain id.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Player volume, 0..=1.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Source file as a `file://` URL.
    #[serde(
        rename = "lastOpenedFile",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_opened_file: Option<String>,

    /// Slot contents in order.
    #[serde(default)]
    pub banks: Vec<BankMap>,
}

fn default_volume() -> f32 {
    1.0
}

/// Parses a saved blob.
///
/// Only a blob that is not a JSON array is an error. Elements that are not
/// objects are skipped; fields of the wrong type fall back to their
/// defaults.
pub fn parse_records(blob: &[u8]) -> Result<Vec<ChainRecord>, ConfigError> {
    let Value::Array(items) = serde_json::from_slice::<Value>(blob)? else {
        return Err(ConfigError::NotAChainList);
    };
    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let record = ChainRecord::from_value(item);
            if record.is_none() {
                tracing::warn!("saved chain #{} is not an object, skipping", position + 1);
            }
            record
        })
        .collect())
}

impl ChainRecord {
    /// Reads one record from loosely typed JSON. Returns `None` unless
    /// `value` is an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let id = match object.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                let id = ChainId::generate().as_str().to_string();
                tracing::warn!("saved chain without a usable id, assigning {id}");
                id
            }
        };

        let name = match object.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                tracing::warn!("chain {id}: name {other} is not a string");
                scalar_text(other).unwrap_or_default()
            }
            None => String::new(),
        };

        let volume = match object.get("volume") {
            None => default_volume(),
            Some(raw) => {
                let parsed = match raw {
                    Value::Number(n) => n.as_f64().map(|v| v as f32),
                    Value::String(s) => s.trim().parse::<f32>().ok(),
                    _ => None,
                };
                match parsed.filter(|v| v.is_finite()) {
                    Some(volume) => volume,
                    None => {
                        tracing::warn!("chain {id}: unusable volume {raw}, using full volume");
                        default_volume()
                    }
                }
            }
        };

        let last_opened_file = match object.get("lastOpenedFile") {
            Some(Value::String(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        };

        let banks = match object.get("banks") {
            Some(Value::Array(banks)) => banks.iter().map(bank_from_value).collect(),
            Some(other) => {
                tracing::warn!("chain {id}: banks {other} is not a list");
                Vec::new()
            }
            None => Vec::new(),
        };

        Some(Self {
            id,
            name,
            volume,
            last_opened_file,
            banks,
        })
    }
}

/// Reads one bank, turning numbers and booleans into the stored string
/// form. Anything else is dropped, which makes the codec use its default.
fn bank_from_value(value: &Value) -> BankMap {
    let Some(object) = value.as_object() else {
        tracing::warn!("bank {value} is not an object, using an empty slot");
        return BankMap::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| {
            let text = scalar_text(value);
            if text.is_none() {
                tracing::warn!("bank value {key} = {value} is not a scalar, ignoring it");
            }
            Some((key.clone(), text?))
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("On".to_string()),
        Value::Bool(false) => Some("Off".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
