use crate::protocol::Protocol;
use awsrpc_core::Context;

/// Per-client service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Signing name of the service, for example `iam`.
    pub service_name: String,
    /// Region the client talks to, for example `us-east-1`.
    pub region: String,
    /// Explicit endpoint. `{service_name}.{region}.amazonaws.com` is used
    /// when unset. A scheme is added when the value carries none.
    pub endpoint: Option<String>,
    /// Use `http://` instead of `https://` for endpoints without a scheme.
    pub disable_ssl: bool,
    /// Wire protocol spoken by the service.
    pub protocol: Protocol,
    /// API version sent as `Version` by the query protocol.
    pub api_version: String,
    /// Version suffix of the `application/x-amz-json-*` content type.
    pub json_version: String,
    /// Prefix of the `X-Amz-Target` header sent by the JSON protocol.
    pub target_prefix: String,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Install the request and response dump stages.
    pub debug: bool,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            region: String::new(),
            endpoint: None,
            disable_ssl: false,
            protocol: Protocol::default(),
            api_version: String::new(),
            json_version: "1.0".to_string(),
            target_prefix: String::new(),
            max_retries: 3,
            debug: false,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ServiceConfig {
    /// Fill the region from `AWS_REGION` or `AWS_DEFAULT_REGION` when it is
    /// not set yet.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.region.is_empty() {
            if let Some(region) = ctx.env_var_any(&["AWS_REGION", "AWS_DEFAULT_REGION"]) {
                self.region = region;
            }
        }
        self
    }

    /// Resolve the endpoint URL including its scheme, without a trailing slash.
    pub fn endpoint(&self) -> String {
        let endpoint = match &self.endpoint {
            Some(v) if !v.is_empty() => v.clone(),
            _ => format!("{}.{}.amazonaws.com", self.service_name, self.region),
        };
        let endpoint = endpoint.trim_end_matches('/');

        if endpoint.contains("://") {
            endpoint.to_string()
        } else if self.disable_ssl {
            format!("http://{endpoint}")
        } else {
            format!("https://{endpoint}")
        }
    }
}
