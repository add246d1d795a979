//! Domain types of the gateway: request payloads, payment titles and the native
//! engine ports.

pub mod ports;
pub mod request;
pub mod titulo;

use serde::{Deserialize, Deserializer};

/// Accepts a JSON string or number and keeps its textual form.
///
/// Client payloads send bank codes and document numbers either way.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Text(text) => text,
        Lenient::Integer(value) => value.to_string(),
        Lenient::Float(value) => value.to_string(),
    })
}

pub(crate) fn optional_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(value)| value))
}
