//! Serde helpers serializing bytes as standard base64.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct PutInput {
//!     #[serde(rename = "Data", with = "awsrpc::protocol::blob")]
//!     data: Vec<u8>,
//! }
//! ```

use awsrpc_core::hash::{base64_decode, base64_encode};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize bytes as a base64 string.
pub fn serialize<T, S>(bytes: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]> + ?Sized,
    S: Serializer,
{
    s.serialize_str(&base64_encode(bytes.as_ref()))
}

/// Deserialize bytes from a base64 string.
pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    base64_decode(&s).map_err(D::Error::custom)
}

/// Helpers for `Option<Vec<u8>>` members.
pub mod option {
    use super::*;

    /// Serialize optional bytes as a base64 string.
    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(v) => s.serialize_some(&base64_encode(v)),
            None => s.serialize_none(),
        }
    }

    /// Deserialize optional bytes from a base64 string.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| base64_decode(&s).map_err(D::Error::custom))
            .transpose()
    }
}
