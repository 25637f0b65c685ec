//! Signed, retried and protocol-encoded AWS API requests.
//!
//! `awsrpc` executes one API call as a staged pipeline: the selected protocol
//! codec builds the HTTP request from typed parameters, the SigV4 signer
//! authenticates it, the transport sends it, the response is validated and,
//! on success, decoded into a typed result. Retryable service errors restart
//! the pipeline after a backoff delay.
//!
//! ## Example
//!
//! ```no_run
//! use awsrpc::aws::EnvCredentialProvider;
//! use awsrpc::protocol::Protocol;
//! use awsrpc::{default_context, Client, OperationDescriptor, ServiceConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct ListUsersInput {
//!     #[serde(rename = "MaxItems")]
//!     max_items: i64,
//! }
//!
//! #[derive(Deserialize, Debug)]
//! struct ListUsersOutput {
//!     #[serde(rename = "ListUsersResult")]
//!     result: ListUsersResult,
//! }
//!
//! #[derive(Deserialize, Debug)]
//! struct ListUsersResult {
//!     #[serde(rename = "IsTruncated")]
//!     is_truncated: bool,
//! }
//!
//! # async fn example() -> awsrpc::Result<()> {
//! let ctx = default_context();
//! let config = ServiceConfig {
//!     service_name: "iam".to_string(),
//!     region: "us-east-1".to_string(),
//!     endpoint: Some("iam.amazonaws.com".to_string()),
//!     protocol: Protocol::Query,
//!     api_version: "2010-05-08".to_string(),
//!     ..Default::default()
//! };
//! let provider = EnvCredentialProvider::from_env(&ctx)?;
//! let client = Client::new(ctx, config, provider);
//!
//! let output: ListUsersOutput = client
//!     .send(OperationDescriptor::new("ListUsers"), &ListUsersInput { max_items: 10 })
//!     .await?;
//! println!("{output:?}");
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub use awsrpc_core::*;

/// AWS SigV4 signing and credential providers.
pub mod aws {
    pub use awsrpc_aws_v4::*;
}

mod context;
pub use context::default_context;

mod config;
pub use config::ServiceConfig;

mod operation;
pub use operation::Location;
pub use operation::OperationDescriptor;
pub use operation::Payload;
pub use operation::PayloadKind;

mod params;

mod request;
pub use request::Format;
pub use request::RequestContext;

pub mod pipeline;
pub mod protocol;

mod client;
pub use client::Client;
