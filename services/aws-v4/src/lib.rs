//! AWS SigV4 signing and credential providers for awsrpc.
//!
//! This crate implements [AWS Signature Version 4](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
//! header signing together with the credential sources it depends on.
//!
//! ## Credential providers
//!
//! - [`StaticCredentialProvider`]: fixed values.
//! - [`EnvCredentialProvider`]: `AWS_ACCESS_KEY_ID`/`AWS_ACCESS_KEY`,
//!   `AWS_SECRET_ACCESS_KEY`/`AWS_SECRET_KEY` and `AWS_SESSION_TOKEN`, read
//!   once at construction.
//! - [`ProfileCredentialProvider`]: the shared credentials file, cached for a TTL.
//! - [`ImdsCredentialProvider`]: the EC2 instance metadata service, cached
//!   until the credential expires.
//!
//! ## Example
//!
//! ```no_run
//! use awsrpc_aws_v4::{RequestSigner, StaticCredentialProvider};
//! use awsrpc_core::{Body, Context, Signer};
//!
//! # async fn example() -> awsrpc_core::Result<()> {
//! let signer = Signer::new(
//!     Context::new(),
//!     StaticCredentialProvider::new("access_key_id", "secret_access_key"),
//!     RequestSigner::new("iam", "us-east-1"),
//! );
//!
//! let mut req = http::Request::get("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
//!     .body(Body::empty())?;
//! signer.sign(&mut req).await?;
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::AWS_QUERY_ENCODE_SET;
pub use constants::AWS_URI_ENCODE_SET;
pub use constants::X_AMZ_CONTENT_SHA_256;
pub use constants::X_AMZ_DATE;
pub use constants::X_AMZ_SECURITY_TOKEN;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::RequestSigner;
