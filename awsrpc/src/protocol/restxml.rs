use super::query::decode_xml_error;
use super::xml::encode_xml;
use super::{response_body, rest, Codec};
use crate::{Format, Payload, PayloadKind, RequestContext};
use awsrpc_core::{ApiError, Body, Error, Result};
use bytes::Bytes;
use serde_json::{Map, Value};

/// Codec of the REST protocol with XML bodies.
///
/// Members bound to headers, path or query string are placed by location.
/// A structure payload member is serialized as XML under its own name;
/// without a payload member the remaining members form the body under
/// `{Operation}Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestXmlCodec;

impl Codec for RestXmlCodec {
    fn build(&self, rctx: &mut RequestContext) -> Result<()> {
        rest::build(rctx)?;

        let op = rctx.operation();
        let xml = match &op.payload {
            Some(Payload {
                member,
                kind: PayloadKind::Structure,
            }) => match rctx.params().get(member) {
                None | Some(Value::Null) => None,
                Some(value @ Value::Object(_)) => Some(encode_xml(member, value)?),
                Some(_) => {
                    return Err(Error::payload_type("unknown payload type")
                        .with_context(format!("member: {member}")))
                }
            },
            Some(_) => None,
            None => {
                let members: Map<String, Value> = rctx
                    .params()
                    .as_object()
                    .map(|params| {
                        params
                            .iter()
                            .filter(|(k, v)| !v.is_null() && !rest::is_bound(rctx, k))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect()
                    })
                    .unwrap_or_default();
                if members.is_empty() {
                    None
                } else {
                    let root = format!("{}Request", op.name);
                    Some(encode_xml(&root, &Value::Object(members))?)
                }
            }
        };

        if let Some(xml) = xml {
            *rctx.http_request_mut().body_mut() = Body::from(xml);
        }
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
