use awsrpc_core::{Error, Result};
use serde_json::{Number, Value};

/// Convert a scalar parameter into its wire text.
///
/// Strings pass through, booleans become `true`/`false` and numbers their
/// shortest decimal form without exponent. Blobs and timestamps reach this
/// point as strings already, see [`super::blob`] and [`super::timestamp`].
/// `null` means the member is absent. Objects and lists are unsupported.
pub fn to_text(name: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.clone())),
        Value::Bool(v) => Ok(Some(v.to_string())),
        Value::Number(v) => Ok(Some(number_to_text(v))),
        Value::Array(_) | Value::Object(_) => Err(Error::unsupported(format!(
            "unsupported value for member {name}: expected a scalar"
        ))
        .with_context(format!("member: {name}"))),
    }
}

fn number_to_text(n: &Number) -> String {
    if let Some(v) = n.as_i64() {
        v.to_string()
    } else if let Some(v) = n.as_u64() {
        v.to_string()
    } else if let Some(v) = n.as_f64() {
        v.to_string()
    } else {
        n.to_string()
    }
}
