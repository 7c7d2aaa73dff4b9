//! Wire types for the inventory API.
//!
//! # Design
//! `Inventory` is a transparent carrier for the server's JSON schema; the
//! client validates nothing. Every field defaults when absent or `null`, so
//! partial server payloads still decode. `quantity` is kept as text because
//! the service formats it as a string ("10.5") while some payloads carry a
//! bare number; both decode into the same `String`.

use serde::{Deserialize, Deserializer, Serialize};

/// A single inventory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inventory {
    /// Server-assigned; omitted from request bodies while zero.
    #[serde(skip_serializing_if = "is_unassigned", deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub quantity: String,
    #[serde(deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub place: String,
    #[serde(deserialize_with = "null_as_default")]
    pub etc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub group_tag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    /// ISO-8601, server-assigned.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub created_at: String,
    /// ISO-8601, server-assigned.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub updated_at: String,
}

fn is_unassigned(id: &i64) -> bool {
    *id == 0
}

/// `null` decodes to the field's zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quantity {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Quantity::deserialize(deserializer)? {
        Quantity::Text(text) => text,
        Quantity::Number(number) => number.to_string(),
        Quantity::Null(()) => String::new(),
    })
}
