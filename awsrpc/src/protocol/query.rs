use super::{response_body, to_text, Codec};
use crate::{Format, RequestContext};
use awsrpc_core::{ApiError, Body, Error, Result};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Codec of the form encoded query protocol.
///
/// The body carries `Action`, `Version` and the flattened parameters, sorted
/// by key. Responses and errors are XML.
#[derive(Debug, Clone)]
pub struct QueryCodec {
    api_version: String,
}

impl QueryCodec {
    /// Create a codec sending `api_version` as `Version`.
    pub fn new(api_version: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
        }
    }
}

impl Codec for QueryCodec {
    fn build(&self, rctx: &mut RequestContext) -> Result<()> {
        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), rctx.operation().name.clone());
        params.insert("Version".to_string(), self.api_version.clone());
        flatten("", rctx.params(), &mut params)?;

        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&params)
            .finish();

        let req = rctx.http_request_mut();
        req.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        *req.body_mut() = Body::from(body);
        Ok(())
    }

    fn unmarshal(&self, rctx: &mut RequestContext) -> Result<()> {
        let body = response_body(rctx)?;
        rctx.decode_output(Format::Xml, &body)
    }

    fn unmarshal_error(&self, resp: &http::Response<Bytes>) -> Result<ApiError> {
        decode_xml_error(resp.body())
    }
}

/// Flatten a parameter tree into query keys.
///
/// Object members join their parent with `.`, list elements use
/// `.member.N` counting from 1. A list at the top level uses bare `N`.
/// `null` members are skipped.
pub fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, String>) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Object(members) => {
            for (name, member) in members {
                let key = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                flatten(&key, member, out)?;
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                let key = if prefix.is_empty() {
                    (idx + 1).to_string()
                } else {
                    format!("{prefix}.member.{}", idx + 1)
                };
                flatten(&key, item, out)?;
            }
        }
        scalar => {
            if prefix.is_empty() {
                return Err(Error::unsupported(
                    "query parameters must be a structure or a list",
                ));
            }
            if let Some(text) = to_text(prefix, scalar)? {
                out.insert(prefix.to_string(), text);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlErrorDetail {
    #[serde(rename = "Type")]
    error_type: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
}

/// Either `ErrorResponse/Error/{Type,Code,Message}` with a top level
/// `RequestId`, or a bare `Error/{Code,Message,RequestId}` document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct XmlErrorBody {
    #[serde(rename = "Error")]
    error: Option<XmlErrorDetail>,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "RequestId")]
    request_id: String,
}

/// Decode an XML error body.
pub(crate) fn decode_xml_error(body: &[u8]) -> Result<ApiError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::decode("error body is not valid UTF-8").with_source(e))?;
    let body: XmlErrorBody = quick_xml::de::from_str(text)
        .map_err(|e| Error::decode("failed to decode XML error body").with_source(e))?;

    let api = match body.error {
        Some(detail) => ApiError {
            code: detail.code,
            error_type: detail.error_type,
            message: detail.message,
            request_id: body.request_id,
            ..Default::default()
        },
        None => ApiError {
            code: body.code,
            message: body.message,
            request_id: body.request_id,
            ..Default::default()
        },
    };
    if api.code.is_empty() && api.message.is_empty() {
        return Err(Error::decode("XML error body carries no error"));
    }
    Ok(api)
}
