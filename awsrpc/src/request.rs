use crate::protocol::decode_xml;
use crate::OperationDescriptor;
use awsrpc_core::time::{now, DateTime};
use awsrpc_core::{Body, Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::time::{Duration, Instant};

/// Body format of a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// XML document.
    Xml,
    /// JSON document.
    Json,
}

type OutputDecoder = fn(Format, &[u8]) -> Result<Box<dyn Any + Send>>;

fn decode_output<O>(format: Format, body: &[u8]) -> Result<Box<dyn Any + Send>>
where
    O: DeserializeOwned + Send + 'static,
{
    // Callers discarding the output skip decoding.
    if TypeId::of::<O>() == TypeId::of::<()>() {
        return Ok(Box::new(()));
    }

    let output: O = if body.iter().all(u8::is_ascii_whitespace) {
        decode_empty()?
    } else {
        match format {
            Format::Json => serde_json::from_slice(body).map_err(|e| {
                Error::decode("failed to decode JSON response body").with_source(e)
            })?,
            Format::Xml => decode_xml(body)?,
        }
    };
    Ok(Box::new(output))
}

/// An empty body decodes into `()`, `None` or a structure of defaults.
fn decode_empty<O: DeserializeOwned>() -> Result<O> {
    serde_json::from_value(Value::Null)
        .or_else(|_| serde_json::from_value(Value::Object(Default::default())))
        .map_err(|e| Error::decode("response body is empty").with_source(e))
}

/// Mutable state of one API call as it moves through the pipeline.
///
/// The outgoing request is rebuilt from the operation descriptor at the
/// start of every attempt. The error slot, once set, stops the current
/// phase; only the after-retry stage clears it.
pub struct RequestContext {
    operation: OperationDescriptor,
    endpoint: String,
    params: Value,

    http_request: http::Request<Body>,
    http_response: Option<http::Response<Bytes>>,
    request_id: Option<String>,

    decoder: OutputDecoder,
    output: Option<Box<dyn Any + Send>>,

    error: Option<Error>,
    retry_count: u32,
    time: DateTime,
    started: Instant,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("operation", &self.operation.name)
            .field("endpoint", &self.endpoint)
            .field("method", self.http_request.method())
            .field("uri", self.http_request.uri())
            .field("status", &self.http_response.as_ref().map(|v| v.status()))
            .field("request_id", &self.request_id)
            .field("error", &self.error)
            .field("retry_count", &self.retry_count)
            .field("time", &self.time)
            .finish()
    }
}

impl RequestContext {
    /// Create the context of a call whose successful response decodes into `O`.
    pub fn new<O>(operation: OperationDescriptor, endpoint: &str, params: Value) -> Result<Self>
    where
        O: DeserializeOwned + Send + 'static,
    {
        let mut rctx = Self {
            operation,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            params,
            http_request: http::Request::new(Body::empty()),
            http_response: None,
            request_id: None,
            decoder: decode_output::<O>,
            output: None,
            error: None,
            retry_count: 0,
            time: now(),
            started: Instant::now(),
        };
        rctx.reset_request()?;
        Ok(rctx)
    }

    /// Replace the outgoing request by a fresh one built from the descriptor
    /// and drop any response of a previous attempt.
    ///
    /// The URI is `endpoint + path template`; templates with placeholders
    /// start at `/` until a codec substitutes them.
    pub fn reset_request(&mut self) -> Result<()> {
        let mut req = http::Request::new(Body::empty());
        *req.method_mut() = self.operation.http_method.clone();
        self.http_request = req;
        self.http_response = None;
        self.request_id = None;

        let (path, query) = self.operation.split_path();
        let path = if path.contains('{') { "/" } else { path };
        let (path, query) = (path.to_string(), query.to_string());
        self.set_uri(&path, &query)
    }

    /// Point the outgoing request at `endpoint + path`, with `query` appended
    /// when not empty.
    pub fn set_uri(&mut self, path: &str, query: &str) -> Result<()> {
        let mut uri = self.endpoint.clone();
        if !path.starts_with('/') {
            uri.push('/');
        }
        uri.push_str(path);
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(query);
        }

        *self.http_request.uri_mut() = uri.parse().map_err(|e| {
            Error::request_invalid("request uri is invalid")
                .with_source(e)
                .with_context(format!("uri: {uri}"))
        })?;
        Ok(())
    }

    /// The operation being called.
    pub fn operation(&self) -> &OperationDescriptor {
        &self.operation
    }

    /// The resolved endpoint, without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The serialized input parameters.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// The outgoing request of the current attempt.
    pub fn http_request(&self) -> &http::Request<Body> {
        &self.http_request
    }

    /// Mutable access to the outgoing request of the current attempt.
    pub fn http_request_mut(&mut self) -> &mut http::Request<Body> {
        &mut self.http_request
    }

    /// The response of the current attempt, once received.
    pub fn http_response(&self) -> Option<&http::Response<Bytes>> {
        self.http_response.as_ref()
    }

    /// Record the response of the current attempt.
    pub fn set_http_response(&mut self, resp: http::Response<Bytes>) {
        self.http_response = Some(resp);
    }

    /// The request id reported by the service in response headers.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Record the request id reported by the service.
    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.request_id = Some(id.into());
    }

    /// The pending error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Set the pending error.
    pub fn set_error(&mut self, err: Error) {
        self.error = Some(err);
    }

    /// Clear the pending error so the call is attempted again.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Take the pending error out of the context.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Number of retries performed so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub(crate) fn increment_retry_count(&mut self) {
        self.retry_count += 1;
    }

    /// Creation time of the call.
    pub fn time(&self) -> DateTime {
        self.time
    }

    /// Time spent since the call was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Decode `body` into the typed output slot.
    pub fn decode_output(&mut self, format: Format, body: &[u8]) -> Result<()> {
        self.output = Some((self.decoder)(format, body)?);
        Ok(())
    }

    /// Whether an output has been decoded.
    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Take the decoded output.
    pub fn take_output<O: 'static>(&mut self) -> Result<O> {
        let output = self
            .output
            .take()
            .ok_or_else(|| Error::unexpected("no output has been decoded"))?;
        output
            .downcast::<O>()
            .map(|v| *v)
            .map_err(|_| Error::unexpected("decoded output has a different type"))
    }
}
