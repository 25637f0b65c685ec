use crate::pipeline::{
    AfterRetry, BackoffPolicy, Build, ContentLength, DefaultRetryPolicy, ExponentialBackoff,
    Handlers, Phase, RequestDump, ResponseDump, RetryPolicy, SendRequest, Sign, Unmarshal,
    UserAgent, ValidateResponse,
};
use crate::params::to_params;
use crate::protocol::Codec;
use crate::{OperationDescriptor, RequestContext, ServiceConfig};
use awsrpc_aws_v4::{Credential, RequestSigner};
use awsrpc_core::{Context, ProvideCredential, Result, Signer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Client of one AWS service.
///
/// A client owns the handlers every call runs through. The default
/// handlers are:
///
/// - Build: [`UserAgent`], [`Build`], [`ContentLength`]
/// - Sign: [`Sign`], then [`RequestDump`] when `debug` is set
/// - Send: [`SendRequest`], then [`ResponseDump`] when `debug` is set
/// - ValidateResponse: [`ValidateResponse`]
/// - AfterRetry: [`AfterRetry`]
/// - Unmarshal: [`Unmarshal`]
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Context,
    config: Arc<ServiceConfig>,
    codec: Arc<dyn Codec>,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
    handlers: Handlers,
}

impl Client {
    /// Create a client signing with credentials from `provider`.
    pub fn new(
        ctx: Context,
        config: ServiceConfig,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        let signer = Signer::new(
            ctx.clone(),
            provider,
            RequestSigner::new(&config.service_name, &config.region),
        );
        Self::with_signer(ctx, config, signer)
    }

    /// Create a client signing with an existing signer.
    pub fn with_signer(ctx: Context, config: ServiceConfig, signer: Signer<Credential>) -> Self {
        let codec = config.protocol.codec(&config);
        let retry_policy: Arc<dyn RetryPolicy> = Arc::new(DefaultRetryPolicy);
        let backoff_policy: Arc<dyn BackoffPolicy> = Arc::new(ExponentialBackoff::default());

        let mut handlers = Handlers::new();
        handlers.push_back(Phase::Build, UserAgent::new(&config.user_agent));
        handlers.push_back(Phase::Build, Build::new(codec.clone()));
        handlers.push_back(Phase::Build, ContentLength);
        handlers.push_back(Phase::Sign, Sign::new(signer));
        handlers.push_back(Phase::Send, SendRequest::new(ctx.clone()));
        if config.debug {
            handlers.push_back(Phase::Sign, RequestDump);
            handlers.push_back(Phase::Send, ResponseDump);
        }
        handlers.push_back(
            Phase::ValidateResponse,
            ValidateResponse::new(codec.clone(), retry_policy.clone(), backoff_policy.clone()),
        );
        handlers.push_back(Phase::AfterRetry, AfterRetry::new(config.max_retries));
        handlers.push_back(Phase::Unmarshal, Unmarshal::new(codec.clone()));

        Self {
            ctx,
            config: Arc::new(config),
            codec,
            retry_policy,
            backoff_policy,
            handlers,
        }
    }

    /// Replace the policy deciding which service errors are retried.
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy) -> Self {
        self.retry_policy = Arc::new(policy);
        self.reinstall_validate_response();
        self
    }

    /// Replace the policy computing delays between attempts.
    pub fn with_backoff_policy(mut self, policy: impl BackoffPolicy) -> Self {
        self.backoff_policy = Arc::new(policy);
        self.reinstall_validate_response();
        self
    }

    fn reinstall_validate_response(&mut self) {
        let stage = ValidateResponse::new(
            self.codec.clone(),
            self.retry_policy.clone(),
            self.backoff_policy.clone(),
        );
        self.handlers
            .replace(Phase::ValidateResponse, ValidateResponse::NAME, stage);
    }

    /// The context of this client.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The service configuration of this client.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The handlers every call runs through.
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Mutable access to the handlers, to add or replace stages.
    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    /// Prepare a call of `op` with `input`, decoding into `O` on success.
    pub fn new_request<I, O>(&self, op: OperationDescriptor, input: &I) -> Result<RequestContext>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned + Send + 'static,
    {
        let params =
            to_params(input).map_err(|e| e.with_context(format!("operation: {}", op.name)))?;
        RequestContext::new::<O>(op, &self.config.endpoint(), params)
    }

    /// Run a prepared call through the handlers.
    pub async fn execute(&self, rctx: &mut RequestContext) -> Result<()> {
        self.handlers.run(rctx).await
    }

    /// Call `op` with `input` and return the decoded output.
    pub async fn send<I, O>(&self, op: OperationDescriptor, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned + Send + 'static,
    {
        let mut rctx = self.new_request::<I, O>(op, input)?;
        self.execute(&mut rctx).await?;
        rctx.take_output()
    }
}
