use crate::mock::{client, config, MockTransport};
use async_trait::async_trait;
use awsrpc::pipeline::{ExponentialBackoff, Phase, SendRequest, Stage};
use awsrpc::protocol::Protocol;
use awsrpc::aws::Credential;
use awsrpc::{
    Client, Context, Error, ErrorKind, OperationDescriptor, ProvideCredential, RequestContext,
    Result,
};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every attempt the way a tracing stage would.
#[derive(Debug, Clone, Default)]
struct Trace {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Stage for Trace {
    fn name(&self) -> &str {
        "Trace"
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        let status = rctx
            .http_response()
            .map(|v| v.status().as_u16())
            .unwrap_or_default();
        self.events
            .lock()
            .expect("lock")
            .push(format!("attempt {} -> {status}", rctx.retry_count()));
        Ok(())
    }
}

/// Answers without touching the network.
#[derive(Debug)]
struct CannedSend;

#[async_trait]
impl Stage for CannedSend {
    fn name(&self) -> &str {
        "CannedSend"
    }

    async fn handle(&self, rctx: &mut RequestContext) -> Result<()> {
        assert!(rctx.http_request().headers().contains_key("authorization"));
        rctx.set_http_response(http::Response::new(Bytes::new()));
        Ok(())
    }
}

#[tokio::test]
async fn test_appended_stage_observes_every_attempt() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(500, "").reply(200, "");
    let mut client = client(config(Protocol::Query), &transport)
        .with_backoff_policy(ExponentialBackoff::new(Duration::ZERO));

    let trace = Trace::default();
    client.handlers_mut().push_back(Phase::Send, trace.clone());
    assert_eq!(
        client.handlers().names(Phase::Send),
        vec!["Send", "ResponseDump", "Trace"]
    );

    client
        .send::<_, ()>(OperationDescriptor::new("ListUsers"), &())
        .await?;

    assert_eq!(
        trace.events.lock().expect("lock").clone(),
        vec!["attempt 0 -> 500", "attempt 1 -> 200"]
    );
    Ok(())
}

#[tokio::test]
async fn test_send_stage_can_be_replaced() -> anyhow::Result<()> {
    let transport = MockTransport::new();
    let mut client = client(config(Protocol::Query), &transport);
    assert!(client
        .handlers_mut()
        .replace(Phase::Send, SendRequest::NAME, CannedSend));

    client
        .send::<_, ()>(OperationDescriptor::new("ListUsers"), &())
        .await?;
    assert_eq!(transport.attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_removing_sign_stage_sends_unsigned_requests() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "");
    let mut client = client(config(Protocol::Query), &transport);
    client.handlers_mut().clear(Phase::Sign);

    client
        .send::<_, ()>(OperationDescriptor::new("ListUsers"), &())
        .await?;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(requests[0].header("user-agent").starts_with("awsrpc/"));
    Ok(())
}

/// Fails like a provider with nothing to offer.
#[derive(Debug)]
struct NoCredentials;

#[async_trait]
impl ProvideCredential for NoCredentials {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Credential> {
        Err(Error::credential_unavailable("no credentials configured"))
    }
}

#[tokio::test]
async fn test_credential_failure_aborts_the_call() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "");
    let ctx = Context::new().with_http_send(transport.clone());
    let client = Client::new(ctx, config(Protocol::Query), NoCredentials);

    let mut rctx = client.new_request::<_, ()>(OperationDescriptor::new("ListUsers"), &())?;
    let err = client
        .execute(&mut rctx)
        .await
        .expect_err("call must fail");

    assert_eq!(err.kind(), ErrorKind::CredentialUnavailable);
    assert_eq!(rctx.retry_count(), 0);
    assert_eq!(transport.attempts(), 0);
    Ok(())
}
