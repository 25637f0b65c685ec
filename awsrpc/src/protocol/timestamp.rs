//! Serde helpers serializing timestamps as `YYYY-MM-DDThh:mm:ssZ`.

use awsrpc_core::time::{format_timestamp, parse_rfc3339, DateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a timestamp in UTC with second precision.
pub fn serialize<S: Serializer>(t: &DateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(*t))
}

/// Deserialize an RFC 3339 timestamp.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime, D::Error> {
    let s = String::deserialize(d)?;
    parse_rfc3339(&s).map_err(D::Error::custom)
}

/// Helpers for `Option<DateTime>` members.
pub mod option {
    use super::*;

    /// Serialize an optional timestamp.
    pub fn serialize<S: Serializer>(t: &Option<DateTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(v) => s.serialize_some(&format_timestamp(*v)),
            None => s.serialize_none(),
        }
    }

    /// Deserialize an optional RFC 3339 timestamp.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| parse_rfc3339(&s).map_err(D::Error::custom))
            .transpose()
    }
}
