use super::{BackoffPolicy, RetryPolicy, Stage};
use crate::protocol::Codec;
use crate::RequestContext;
use async_trait::async_trait;
use awsrpc_core::utils::Redact;
use awsrpc_core::{ApiError, Context, Error, Result, Signer, SigningCredential};
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::{HeaderMap, HeaderValue};
use log::debug;
use std::fmt::Write;
use std::sync::Arc;

/// Sets the `User-Agent` header.
#[derive(Debug, Clone)]
pub struct UserAgent {
    user_agent: String,
}

impl UserAgent {
    /// Name of this stage.
    pub const NAME: &'static str = "UserAgent";

    /// Create the stage with the header value to send.
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl Stage for UserAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let value = HeaderValue::from_str(&self.user_agent)?;
        rctx.http_request_mut().headers_mut().insert(USER_AGENT, value);
        Ok(())
    }
}

/// Places the parameters into the request through the protocol codec.
#[derive(Debug, Clone)]
pub struct Build {
    codec: Arc<dyn Codec>,
}

impl Build {
    /// Name of this stage.
    pub const NAME: &'static str = "Build";

    /// Create the stage.
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl Stage for Build {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        self.codec.build(rctx)
    }
}

/// Sets `Content-Length` from the buffered body when it is absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentLength;

impl ContentLength {
    /// Name of this stage.
    pub const NAME: &'static str = "ContentLength";
}

#[async_trait]
impl Stage for ContentLength {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let req = rctx.http_request_mut();
        if req.headers().contains_key(CONTENT_LENGTH) {
            return Ok(());
        }

        let len = req.body_mut().buffer()?.len();
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(len));
        Ok(())
    }
}

/// Authenticates the request with a [`Signer`].
#[derive(Debug, Clone)]
pub struct Sign<K: SigningCredential> {
    signer: Signer<K>,
}

impl<K: SigningCredential> Sign<K> {
    /// Name of this stage.
    pub const NAME: &'static str = "Sign";

    /// Create the stage.
    pub fn new(signer: Signer<K>) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl<K: SigningCredential> Stage for Sign<K> {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        self.signer.sign(rctx.http_request_mut()).await
    }
}

fn dump_headers(out: &mut String, headers: &HeaderMap) -> std::fmt::Result {
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<binary>");
        let name = name.as_str();
        if name == "authorization" || name == "x-amz-security-token" {
            writeln!(out, "{name}: {:?}", Redact::from(value))?;
        } else {
            writeln!(out, "{name}: {value}")?;
        }
    }
    Ok(())
}

/// Logs the signed request at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDump;

impl RequestDump {
    /// Name of this stage.
    pub const NAME: &'static str = "RequestDump";
}

#[async_trait]
impl Stage for RequestDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let req = rctx.http_request();
        let mut out = String::new();
        writeln!(out, "{} {} {:?}", req.method(), req.uri(), req.version())?;
        dump_headers(&mut out, req.headers())?;
        match req.body().len() {
            Some(len) => write!(out, "<{len} bytes body>")?,
            None => write!(out, "<stream body>")?,
        }

        debug!("---[ REQUEST {} ]---\n{out}", rctx.operation().name);
        Ok(())
    }
}

/// Delivers the request through the context's [`awsrpc_core::HttpSend`].
#[derive(Debug, Clone)]
pub struct SendRequest {
    ctx: Context,
}

impl SendRequest {
    /// Name of this stage.
    pub const NAME: &'static str = "Send";

    /// Response headers carrying the service request id.
    const REQUEST_ID_HEADERS: [&'static str; 2] = ["x-amzn-requestid", "x-amz-request-id"];

    /// Create the stage.
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Stage for SendRequest {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let req = rctx.http_request_mut();
        let body = req.body_mut().buffer()?;

        let mut out = http::Request::new(body);
        *out.method_mut() = req.method().clone();
        *out.uri_mut() = req.uri().clone();
        *out.version_mut() = req.version();
        *out.headers_mut() = req.headers().clone();

        let resp = self.ctx.http_send(out).await?;

        let request_id = Self::REQUEST_ID_HEADERS
            .iter()
            .find_map(|name| resp.headers().get(*name))
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        if let Some(id) = request_id {
            rctx.set_request_id(id);
        }
        rctx.set_http_response(resp);
        Ok(())
    }
}

/// Logs the received response at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDump;

impl ResponseDump {
    /// Name of this stage.
    pub const NAME: &'static str = "ResponseDump";
}

#[async_trait]
impl Stage for ResponseDump {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let Some(resp) = rctx.http_response() else {
            return Ok(());
        };

        let mut out = String::new();
        writeln!(out, "{:?} {}", resp.version(), resp.status())?;
        dump_headers(&mut out, resp.headers())?;
        write!(out, "<{} bytes body>", resp.body().len())?;

        debug!("---[ RESPONSE {} ]---\n{out}", rctx.operation().name);
        Ok(())
    }
}

/// Turns responses with status 400 or above into service errors.
///
/// The codec decodes the error body. Bodies it cannot decode still produce
/// an [`ApiError`] carrying the status and the raw text. The retry policy
/// marks the error retryable and the backoff policy sets its delay.
#[derive(Debug, Clone)]
pub struct ValidateResponse {
    codec: Arc<dyn Codec>,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
}

impl ValidateResponse {
    /// Name of this stage.
    pub const NAME: &'static str = "ValidateResponse";

    /// Create the stage.
    pub fn new(
        codec: Arc<dyn Codec>,
        retry_policy: Arc<dyn RetryPolicy>,
        backoff_policy: Arc<dyn BackoffPolicy>,
    ) -> Self {
        Self {
            codec,
            retry_policy,
            backoff_policy,
        }
    }
}

#[async_trait]
impl Stage for ValidateResponse {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let Some(resp) = rctx.http_response() else {
            return Err(Error::unexpected("no response to validate"));
        };
        let status = resp.status().as_u16();
        if status < 400 {
            return Ok(());
        }

        let mut api = match self.codec.unmarshal_error(resp) {
            Ok(api) => api,
            Err(err) => {
                debug!("failed to decode error response with status {status}: {err}");
                ApiError {
                    message: String::from_utf8_lossy(resp.body()).trim().to_string(),
                    ..Default::default()
                }
            }
        };
        api.status = status;
        if api.request_id.is_empty() {
            if let Some(id) = rctx.request_id() {
                api.request_id = id.to_string();
            }
        }

        api.retry_count = rctx.retry_count();
        api.retryable = self.retry_policy.is_retryable(&api);
        if api.retryable {
            api.retry_delay = self.backoff_policy.delay(rctx.retry_count());
        }

        debug!(
            "{}: service returned {status} {} (retryable: {})",
            rctx.operation().name,
            api.code,
            api.retryable
        );
        Err(Error::service(api))
    }
}

/// Clears retryable errors while retries remain and waits for their delay.
#[derive(Debug, Clone, Copy)]
pub struct AfterRetry {
    max_retries: u32,
}

impl AfterRetry {
    /// Name of this stage.
    pub const NAME: &'static str = "AfterRetry";

    /// Create the stage allowing at most `max_retries` retries.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

#[async_trait]
impl Stage for AfterRetry {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let Some(err) = rctx.error() else {
            return Ok(());
        };
        if !err.is_retryable() {
            return Ok(());
        }
        if rctx.retry_count() >= self.max_retries {
            debug!(
                "{}: giving up after {} retries",
                rctx.operation().name,
                rctx.retry_count()
            );
            return Ok(());
        }

        let delay = err.api_error().map(|v| v.retry_delay).unwrap_or_default();
        debug!(
            "{}: retrying after {delay:?}, {} retries performed",
            rctx.operation().name,
            rctx.retry_count()
        );
        rctx.increment_retry_count();
        rctx.clear_error();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// Decodes the successful response through the protocol codec.
#[derive(Debug, Clone)]
pub struct Unmarshal {
    codec: Arc<dyn Codec>,
}

impl Unmarshal {
    /// Name of this stage.
    pub const NAME: &'static str = "Unmarshal";

    /// Create the stage.
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl Stage for Unmarshal {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        self.codec.unmarshal(rctx)
    }
}
