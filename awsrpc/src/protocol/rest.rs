use super::to_text;
use crate::{Location, PayloadKind, RequestContext};
use awsrpc_aws_v4::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};
use awsrpc_core::hash::base64_decode;
use awsrpc_core::utils::clean_path_keep_trailing_slash;
use awsrpc_core::{Body, Error, Result};
use http::{HeaderName, HeaderValue};
use percent_encoding::utf8_percent_encode;
use serde_json::Value;
use std::collections::BTreeMap;

/// Place the members bound to headers, path and query string, and the raw
/// payload member if it is a blob or a string.
///
/// `{name}` placeholders escape `/`, `{name+}` placeholders keep it. The
/// final path is cleaned, keeping a trailing slash.
pub(crate) fn build(rctx: &mut RequestContext) -> Result<()> {
    let op = rctx.operation().clone();
    let params = rctx.params();

    let (template_path, template_query) = op.split_path();
    let mut path = template_path.to_string();
    let mut query: BTreeMap<String, String> = form_urlencoded::parse(template_query.as_bytes())
        .into_owned()
        .collect();
    let mut headers = Vec::new();

    for (member, location) in &op.locations {
        let Some(value) = params.get(member) else {
            continue;
        };
        let Some(text) = to_text(member, value)? else {
            continue;
        };

        match location {
            Location::Header(name) => {
                let name = HeaderName::try_from(name.as_str())?;
                headers.push((name, HeaderValue::from_str(&text)?));
            }
            Location::Uri(name) => {
                let segment = utf8_percent_encode(&text, &AWS_QUERY_ENCODE_SET).to_string();
                path = path.replace(&format!("{{{name}}}"), &segment);
                let greedy = utf8_percent_encode(&text, &AWS_URI_ENCODE_SET).to_string();
                path = path.replace(&format!("{{{name}+}}"), &greedy);
            }
            Location::Querystring(name) => {
                query.insert(name.clone(), text);
            }
        }
    }

    if let Some(start) = path.find('{') {
        let end = path[start..].find('}').map_or(path.len(), |v| start + v + 1);
        return Err(
            Error::request_invalid("missing value for uri parameter")
                .with_context(format!("parameter: {}", &path[start..end]))
                .with_context(format!("operation: {}", op.name)),
        );
    }

    let body = match &op.payload {
        Some(payload) if payload.kind != PayloadKind::Structure => {
            raw_payload(&payload.member, payload.kind, params.get(&payload.member))?
        }
        _ => None,
    };

    let path = clean_path_keep_trailing_slash(&path);
    let query = query
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    rctx.set_uri(&path, &query)?;

    let req = rctx.http_request_mut();
    for (name, value) in headers {
        req.headers_mut().append(name, value);
    }
    if let Some(body) = body {
        *req.body_mut() = body;
    }
    Ok(())
}

/// Members placed outside the body.
pub(crate) fn is_bound(rctx: &RequestContext, member: &str) -> bool {
    let op = rctx.operation();
    op.locations.contains_key(member) || op.payload.as_ref().is_some_and(|v| v.member == member)
}

fn raw_payload(member: &str, kind: PayloadKind, value: Option<&Value>) -> Result<Option<Body>> {
    let body = match (kind, value) {
        (_, None | Some(Value::Null)) => return Ok(None),
        (PayloadKind::Blob, Some(Value::String(v))) => Body::from(base64_decode(v)?),
        (PayloadKind::Blob, Some(Value::Array(items))) => Body::from(bytes_from_array(items)?),
        (PayloadKind::String, Some(Value::String(v))) => Body::from(v.clone()),
        _ => {
            return Err(Error::payload_type("unknown payload type")
                .with_context(format!("member: {member}")))
        }
    };
    Ok(Some(body))
}

/// Bytes serialized without the blob helper arrive as a list of numbers.
fn bytes_from_array(items: &[Value]) -> Result<Vec<u8>> {
    items
        .iter()
        .map(|v| {
            v.as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| Error::payload_type("unknown payload type: expected bytes"))
        })
        .collect()
}
