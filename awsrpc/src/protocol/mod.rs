//! Wire protocol codecs.
//!
//! A [`Codec`] places the serialized parameters of a call into the outgoing
//! request and decodes the response into either the typed output or an
//! [`ApiError`]. Parameters are walked as a `serde_json::Value` tree; the
//! operation descriptor tells where each member goes.

use crate::{RequestContext, ServiceConfig};
use awsrpc_core::{ApiError, Result};
use bytes::Bytes;
use std::fmt::Debug;
use std::sync::Arc;

pub mod blob;
pub mod timestamp;

mod scalar;
pub use scalar::to_text;

mod query;
pub use query::flatten;
pub use query::QueryCodec;

mod json;
pub use json::JsonCodec;

mod rest;

mod xml;
pub(crate) use xml::decode_xml;

mod restxml;
pub use restxml::RestXmlCodec;

/// Wire protocol spoken by a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    /// Form encoded parameters, XML responses.
    #[default]
    Query,
    /// JSON bodies with an `X-Amz-Target` header.
    Json,
    /// Members in headers, path and query; XML or raw payload bodies.
    RestXml,
}

impl Protocol {
    /// Create the codec for this protocol.
    pub fn codec(self, config: &ServiceConfig) -> Arc<dyn Codec> {
        match self {
            Protocol::Query => Arc::new(QueryCodec::new(&config.api_version)),
            Protocol::Json => Arc::new(JsonCodec::new(
                &config.target_prefix,
                &config.json_version,
            )),
            Protocol::RestXml => Arc::new(RestXmlCodec),
        }
    }
}

/// Translates parameters to requests and responses to results.
pub trait Codec: Debug + Send + Sync + 'static {
    /// Place the parameters into the outgoing request.
    fn build(&self, rctx: &mut RequestContext) -> Result<()>;

    /// Decode a successful response into the typed output.
    fn unmarshal(&self, rctx: &mut RequestContext) -> Result<()>;

    /// Decode an error response.
    fn unmarshal_error(&self, resp: &http::Response<Bytes>) -> Result<ApiError>;
}

/// Body of the response received for the current attempt.
fn response_body(rctx: &RequestContext) -> Result<Bytes> {
    rctx.http_response()
        .map(|v| v.body().clone())
        .ok_or_else(|| awsrpc_core::Error::unexpected("no response to unmarshal"))
}
