use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use awsrpc_core::time::{now, parse_rfc3339};
use awsrpc_core::{Context, Error, ProvideCredential, Result};
use bytes::Bytes;
use http::Method;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// ImdsCredentialProvider loads credentials of the role attached to an EC2
/// instance from the instance metadata service.
///
/// Two sequential GETs are issued: the first returns the active role name as
/// the first line of its body, the second returns the role credential. The
/// credential is cached until its `Expiration`; the cache lock is held
/// across the refresh so concurrent callers observe one fetch.
#[derive(Debug, Clone, Default)]
pub struct ImdsCredentialProvider {
    endpoint: Option<String>,

    cache: Arc<Mutex<Option<Credential>>>,
}

impl ImdsCredentialProvider {
    /// Create a new `ImdsCredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint for the metadata service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn endpoint(&self, ctx: &Context) -> String {
        self.endpoint
            .clone()
            .or_else(|| ctx.env_var_any(&[AWS_EC2_METADATA_SERVICE_ENDPOINT]))
            .unwrap_or_else(|| DEFAULT_METADATA_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    async fn get(&self, ctx: &Context, url: &str) -> Result<http::Response<String>> {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri(url)
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build instance metadata request")
                    .with_context(format!("url: {url}"))
                    .with_source(e)
            })?;

        ctx.http_send_as_string(req).await
    }

    async fn fetch_role_name(&self, ctx: &Context, base: &str) -> Result<String> {
        let resp = self.get(ctx, base).await.map_err(|e| {
            Error::transport("failed to list instance metadata credentials")
                .with_context(format!("url: {base}"))
                .with_source(e)
        })?;

        let role = resp.body().lines().next().unwrap_or_default().trim();
        if !resp.status().is_success() || role.is_empty() {
            return Err(
                Error::no_default_credentials("unable to find default IAM credentials")
                    .with_context(format!("status: {}", resp.status()))
                    .with_context(format!("url: {base}")),
            );
        }
        Ok(role.to_string())
    }

    async fn fetch_credential(&self, ctx: &Context) -> Result<Credential> {
        let base = format!("{}{METADATA_CREDENTIALS_PATH}", self.endpoint(ctx));
        let role = self.fetch_role_name(ctx, &base).await?;

        let url = format!("{base}{role}");
        let resp = self.get(ctx, &url).await.map_err(|e| {
            Error::transport(format!("failed to get {role} IAM credentials"))
                .with_context(format!("url: {url}"))
                .with_source(e)
        })?;
        if !resp.status().is_success() {
            return Err(
                Error::transport(format!("failed to get {role} IAM credentials"))
                    .with_context(format!("status: {}", resp.status()))
                    .with_context(format!("url: {url}")),
            );
        }

        let content = resp.into_body();
        let body: InstanceRoleCredentials = serde_json::from_str(&content).map_err(|e| {
            Error::decode(format!("failed to decode {role} IAM credentials"))
                .with_context(format!("response_length: {}", content.len()))
                .with_source(e)
        })?;
        if !body.code.is_empty() && body.code != "Success" {
            return Err(Error::credential_unavailable(format!(
                "instance metadata returned error: [{}] {}",
                body.code, body.message
            ))
            .with_context(format!("role: {role}")));
        }

        let expiration = parse_rfc3339(&body.expiration).map_err(|e| {
            Error::decode("failed to parse IAM credential expiration time")
                .with_context(format!("expiration: {}", body.expiration))
                .with_source(e)
        })?;

        Ok(Credential {
            access_key_id: body.access_key_id,
            secret_access_key: body.secret_access_key,
            session_token: Some(body.token),
            expires_in: Some(expiration),
        })
    }
}

#[async_trait]
impl ProvideCredential for ImdsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Self::Credential> {
        let mut cache = self.cache.lock().await;
        if let Some(cred) = cache.as_ref() {
            if !cred.is_expired() {
                debug!("instance metadata credential cache hit");
                return Ok(cred.clone());
            }
        }

        debug!("instance metadata credential cache miss, fetching role credential");
        let cred = self.fetch_credential(ctx).await?;
        if cred.is_expired() {
            return Err(Error::credential_expired(
                "instance metadata returned an expired credential",
            )
            .with_context(format!("expiration: {:?}", cred.expires_in)));
        }

        *cache = Some(cred.clone());
        Ok(cred)
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InstanceRoleCredentials {
    #[serde(alias = "AccessKeyID")]
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: String,

    code: String,
    message: String,
}
