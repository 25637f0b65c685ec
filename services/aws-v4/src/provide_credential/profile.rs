use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use awsrpc_core::time::{now, DateTime};
use awsrpc_core::{Context, Error, ProvideCredential, Result};
use ini::Ini;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// ProfileCredentialProvider loads AWS credentials from the shared credentials file.
///
/// The file is resolved in order:
///
/// 1. The path set via `with_credentials_file()`
/// 2. The `AWS_SHARED_CREDENTIALS_FILE` environment variable
/// 3. `~/.aws/credentials`
///
/// The profile is resolved in order:
///
/// 1. The profile set via `with_profile()`
/// 2. The `AWS_PROFILE` environment variable
/// 3. `default`
///
/// The profile must carry `aws_access_key_id`, `aws_secret_access_key` and
/// `aws_session_token`. A parsed credential is cached for the configured TTL;
/// the cache lock is held across the refresh so only one read runs at a time.
#[derive(Debug, Clone)]
pub struct ProfileCredentialProvider {
    profile: Option<String>,
    credentials_file: Option<String>,
    ttl: Duration,

    cache: Arc<Mutex<Option<(Credential, DateTime)>>>,
}

impl Default for ProfileCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self {
            profile: None,
            credentials_file: None,
            ttl: Duration::from_secs(600),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Set how long a parsed credential stays cached.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn profile(&self, ctx: &Context) -> String {
        self.profile
            .clone()
            .or_else(|| ctx.env_var_any(&[AWS_PROFILE]))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    fn credentials_file(&self, ctx: &Context) -> Result<String> {
        let path = self
            .credentials_file
            .clone()
            .or_else(|| ctx.env_var_any(&[AWS_SHARED_CREDENTIALS_FILE]))
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string());

        ctx.expand_home_dir(&path).ok_or_else(|| {
            Error::config_invalid("failed to expand home dir for credentials file")
                .with_context(format!("path: {path}"))
        })
    }

    async fn load_credential(&self, ctx: &Context) -> Result<Credential> {
        let path = self.credentials_file(ctx)?;
        let profile = self.profile(ctx);

        let content = ctx.file_read_as_string(&path).await.map_err(|e| {
            Error::credential_unavailable("failed to read credentials file")
                .with_context(format!("path: {path}"))
                .with_source(e)
        })?;
        let conf = Ini::load_from_str(&content).map_err(|e| {
            Error::config_invalid("failed to parse credentials file")
                .with_context(format!("path: {path}"))
                .with_source(anyhow::Error::new(e))
        })?;

        let props = conf.section(Some(profile.as_str()));
        let get = |key: &str| -> Result<String> {
            props
                .and_then(|props| props.get(key))
                .map(|v| v.to_string())
                .ok_or_else(|| {
                    Error::profile_incomplete(format!(
                        "profile {profile} in {path} did not contain {key}"
                    ))
                    .with_context(format!("key: {key}"))
                    .with_context(format!("profile: {profile}"))
                    .with_context(format!("path: {path}"))
                })
        };

        Ok(Credential {
            access_key_id: get(PROFILE_ACCESS_KEY_ID)?,
            secret_access_key: get(PROFILE_SECRET_ACCESS_KEY)?,
            session_token: Some(get(PROFILE_SESSION_TOKEN)?),
            expires_in: None,
        })
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Self::Credential> {
        let mut cache = self.cache.lock().await;
        if let Some((cred, expires_at)) = cache.as_ref() {
            if now() < *expires_at {
                debug!("profile credential cache hit");
                return Ok(cred.clone());
            }
        }

        debug!("profile credential cache miss, reading credentials file");
        let cred = self.load_credential(ctx).await?;
        let ttl = chrono::TimeDelta::from_std(self.ttl).map_err(|e| {
            Error::config_invalid("profile credential ttl out of range").with_source(e)
        })?;
        *cache = Some((cred.clone(), now() + ttl));
        Ok(cred)
    }
}
