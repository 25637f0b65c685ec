use crate::{Body, Context, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// SigningCredential is the trait used by signer as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    fn is_valid(&self) -> bool;
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(ctx) = self else {
            return false;
        };

        ctx.is_valid()
    }
}

/// ProvideCredential supplies the credential used to sign requests.
///
/// Implementations own their cache and refresh policy. A returned credential
/// must never be expired at the instant of return; sources that cannot
/// produce one return an error instead.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Supply a credential from the current context.
    async fn provide_credential(&self, ctx: &Context) -> Result<Self::Credential>;
}

#[async_trait::async_trait]
impl<T: ProvideCredential + ?Sized> ProvideCredential for Arc<T> {
    type Credential = T::Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Self::Credential> {
        self.as_ref().provide_credential(ctx).await
    }
}

/// SignRequest is the trait used by signer to attach authentication to a request.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    type Credential: Send + Sync + Unpin + 'static;

    /// Sign the request in place.
    ///
    /// The body may be buffered while signing; implementations must leave a
    /// body that still yields the full original payload.
    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut http::Request<Body>,
        credential: &Self::Credential,
    ) -> Result<()>;
}
