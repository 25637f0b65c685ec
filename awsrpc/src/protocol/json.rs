use super::{response_body, Codec};
use crate::{Format, RequestContext};
use awsrpc_core::{ApiError, Body, Error, Result};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderValue;
use serde::Deserialize;
use serde_json::Value;

/// Codec of the JSON protocol.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    target_prefix: String,
    content_type: String,
}

impl JsonCodec {
    /// Create a codec. `target_prefix` is joined with the operation name into
    /// `X-Amz-Target`; `json_version` selects `application/x-amz-json-{version}`.
    pub fn new(target_prefix: &str, json_version: &str) -> Self {
        Self {
            target_prefix: target_prefix.to_string(),
            content_type: format!("application/x-amz-json-{json_version}"),
        }
    }
}

impl Codec for JsonCodec {
    fn build(&self, rctx: &mut RequestContext) -> Result<()> {
        let body = match rctx.params() {
            Value::Null => b"{}".to_vec(),
            params => serde_json::to_vec(params).map_err(|e| {
                Error::unsupported("failed to encode JSON body").with_source(e)
            })?,
        };
        let target = if self.target_prefix.is_empty() {
            None
        } else {
            Some(format!("{}.{}", self.target_prefix, rctx.operation().name))
        };

        let req = rctx.http_request_mut();
        if let Some(target) = target {
            req.headers_mut()
                .insert("x-amz-target", HeaderValue::from_str(&target)?);
        }
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_str(&self.content_type)?);
        *req.body_mut() = Body::from(body);
        Ok(())
    }

    fn unmarshal(&self, rctx: &mut RequestContext) -> Result<()> {
        let body = response_body(rctx)?;
        rctx.decode_output(Format::Json, &body)
    }

    fn unmarshal_error(&self, resp: &http::Response<Bytes>) -> Result<ApiError> {
        let body: JsonErrorBody = serde_json::from_slice(resp.body())
            .map_err(|e| Error::decode("failed to decode JSON error body").with_source(e))?;

        let mut error_type = body.error_type;
        if error_type.is_empty() {
            // Some services only name the error in this header, as `Code:detail`.
            if let Some(v) = resp
                .headers()
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
            {
                error_type = v.split(':').next().unwrap_or_default().to_string();
            }
        }

        let code = error_type
            .rsplit('#')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(ApiError {
            code,
            error_type,
            message: body.message,
            ..Default::default()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonErrorBody {
    #[serde(rename = "__type")]
    error_type: String,
    #[serde(alias = "Message")]
    message: String,
}
