use crate::{Body, Context, ProvideCredential, Result, SignRequest, SigningCredential};
use std::sync::Arc;

/// Signer pairs one credential provider with one request signer.
///
/// It holds no credential cache of its own: every provider owns its cache
/// and lock, so two signers sharing a provider observe the same refreshes.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideCredential<Credential = K>>,
    builder: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        provider: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            builder: Arc::new(builder),
        }
    }

    /// The context used for credential supply and signing.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Supply a credential and sign the request with it.
    pub async fn sign(&self, req: &mut http::Request<Body>) -> Result<()> {
        let credential = self.provider.provide_credential(&self.ctx).await?;
        self.builder
            .sign_request(&self.ctx, req, &credential)
            .await
    }
}
