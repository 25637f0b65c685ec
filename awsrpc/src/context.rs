use awsrpc_core::{Context, OsEnv};
use awsrpc_file_read_tokio::TokioFileRead;
use awsrpc_http_send_reqwest::ReqwestHttpSend;

/// Create a context wired to the real world.
///
/// - Files are read with `tokio::fs`.
/// - HTTP requests are sent with a default `reqwest::Client`.
/// - The environment is the current process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv)
}
