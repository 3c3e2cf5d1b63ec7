// Wire module - helpers shared by every reply family

pub mod rpc_error;
pub mod xml;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Read;

use crate::error::{ConvertError, Result};

pub use rpc_error::RpcError;

/// Marker for an empty element whose presence is the whole signal.
///
/// Devices report flags such as `<probe-success/>` or `<selected-next-hop/>`
/// as self-closing tags. Fields holding a marker are `Option<Presence>`:
/// `None` when the tag is absent, `Some(Presence)` when it is there. The
/// content is never inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence;

impl Serialize for Presence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for Presence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Presence)
    }
}

/// Displays the wrapped value, or nothing when it is absent
pub struct OrEmpty<'a, T>(pub &'a Option<T>);

impl<T: fmt::Display> fmt::Display for OrEmpty<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => value.fmt(f),
            None => Ok(()),
        }
    }
}

pub fn shown<T>(value: &Option<T>) -> OrEmpty<'_, T> {
    OrEmpty(value)
}

/// Format a microsecond count as milliseconds with exactly three decimals (4635 -> "4.635")
pub fn format_ms_fixed(micros: u64) -> String {
    format!("{}.{:03}", micros / 1000, micros % 1000)
}

/// Format a microsecond count as milliseconds with trailing zeros dropped (12850 -> "12.85")
pub fn format_ms_trimmed(micros: u64) -> String {
    let whole = micros / 1000;
    let frac = micros % 1000;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:03}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Reads an optional string, treating `""` the same as a missing key
pub(crate) fn non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Compact JSON in field declaration order; failures are reported, never swallowed
pub(crate) fn json_bytes<T: Serialize>(context: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ConvertError::malformed(context, e))
}

pub(crate) fn json_record<T: DeserializeOwned>(context: &str, input: &[u8]) -> Result<T> {
    serde_json::from_slice(input).map_err(|e| ConvertError::malformed(context, e))
}

pub(crate) fn read_all(reader: &mut dyn Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
