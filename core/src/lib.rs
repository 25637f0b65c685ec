//! Core components for authenticating and executing AWS API requests.
//!
//! This crate provides the foundational types and traits shared by the
//! credential providers, the SigV4 signer and the request pipeline.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for file reading, HTTP sending, and environment access
//! - **Traits**: Abstract interfaces for credential supply (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: Pairs one credential provider with one request signer
//! - **Body**: An outgoing request body that may be a single-read stream
//!
//! ## Example
//!
//! ```no_run
//! use awsrpc_core::{Body, Context, ProvideCredential, SignRequest, Signer, SigningCredential};
//! use awsrpc_core::Result;
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Self::Credential> {
//!         Ok(MyCredential { key: "my-key".to_string() })
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyRequestSigner;
//!
//! #[async_trait]
//! impl SignRequest for MyRequestSigner {
//!     type Credential = MyCredential;
//!
//!     async fn sign_request(
//!         &self,
//!         _: &Context,
//!         req: &mut http::Request<Body>,
//!         cred: &Self::Credential,
//!     ) -> Result<()> {
//!         req.headers_mut().insert("x-my-key", cred.key.parse()?);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), MyProvider, MyRequestSigner);
//!
//! let mut req = http::Request::new(Body::empty());
//! signer.sign(&mut req).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::FileRead;
pub use context::HttpSend;
pub use context::NoopEnv;
pub use context::NoopFileRead;
pub use context::NoopHttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::ApiError;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;

mod body;
pub use body::Body;

mod api;
pub use api::{ProvideCredential, SignRequest, SigningCredential};
mod signer;
pub use signer::Signer;
