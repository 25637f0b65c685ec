use crate::mock::{client, config, MockTransport};
use awsrpc::pipeline::{ExponentialBackoff, NoRetryPolicy};
use awsrpc::protocol::Protocol;
use awsrpc::{ErrorKind, OperationDescriptor};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq)]
struct GetUserOutput {
    #[serde(rename = "GetUserResult")]
    result: GetUserResult,
}

#[derive(Debug, Deserialize, PartialEq)]
struct GetUserResult {
    #[serde(rename = "User")]
    user: User,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    #[serde(rename = "UserName")]
    user_name: String,
}

const GET_USER_RESPONSE: &str = r#"<GetUserResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">
  <GetUserResult>
    <User>
      <UserName>alice</UserName>
    </User>
  </GetUserResult>
  <ResponseMetadata>
    <RequestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</RequestId>
  </ResponseMetadata>
</GetUserResponse>"#;

#[tokio::test]
async fn test_retries_stop_at_max_retries() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(500, "");
    let client = client(config(Protocol::Query), &transport)
        .with_backoff_policy(ExponentialBackoff::new(Duration::ZERO));

    let mut rctx = client.new_request::<_, ()>(OperationDescriptor::new("GetUser"), &())?;
    let err = client
        .execute(&mut rctx)
        .await
        .expect_err("call must fail");

    assert_eq!(transport.attempts(), 3);
    assert_eq!(rctx.retry_count(), 2);
    assert_eq!(err.kind(), ErrorKind::Service);
    let api = err.api_error().expect("service error");
    assert_eq!(api.status, 500);
    assert!(api.retryable);
    assert_eq!(api.retry_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_retry_then_success() -> anyhow::Result<()> {
    let transport = MockTransport::new()
        .reply(503, "")
        .reply_with_headers(
            400,
            &[("x-amzn-requestid", "req-throttled")],
            "<ErrorResponse><Error><Type>Sender</Type><Code>Throttling</Code><Message>Rate exceeded</Message></Error></ErrorResponse>",
        )
        .reply(200, GET_USER_RESPONSE);
    let client = client(config(Protocol::Query), &transport)
        .with_backoff_policy(ExponentialBackoff::new(Duration::from_millis(1)));

    let output: GetUserOutput = client.send(OperationDescriptor::new("GetUser"), &()).await?;
    assert_eq!(output.result.user.user_name, "alice");

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    for req in &requests {
        assert_eq!(req.body_str(), "Action=GetUser&Version=2010-05-08");
        assert!(req.header("authorization").starts_with("AWS4-HMAC-SHA256 "));
        assert_eq!(req.header("content-length"), "33");
    }
    Ok(())
}

#[tokio::test]
async fn test_non_retryable_error_is_not_retried() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(
        400,
        "<ErrorResponse><Error><Type>Sender</Type><Code>ValidationError</Code><Message>bad</Message></Error><RequestId>r-400</RequestId></ErrorResponse>",
    );
    let client = client(config(Protocol::Query), &transport);

    let err = client
        .send::<_, ()>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");

    assert_eq!(transport.attempts(), 1);
    let api = err.api_error().expect("service error");
    assert_eq!(api.code, "ValidationError");
    assert_eq!(api.request_id, "r-400");
    assert!(!api.retryable);
    Ok(())
}

#[tokio::test]
async fn test_retry_policy_can_be_replaced() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(503, "");
    let client = client(config(Protocol::Query), &transport).with_retry_policy(NoRetryPolicy);

    let err = client
        .send::<_, ()>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");
    assert_eq!(transport.attempts(), 1);
    assert!(!err.is_retryable());
    Ok(())
}

#[tokio::test]
async fn test_zero_max_retries() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(500, "");
    let mut cfg = config(Protocol::Query);
    cfg.max_retries = 0;
    let client = client(cfg, &transport);

    client
        .send::<_, ()>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");
    assert_eq!(transport.attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_decode_failure_is_not_retried() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "<GetUserResponse><GetUserResult>");
    let client = client(config(Protocol::Query), &transport);

    let err = client
        .send::<_, GetUserOutput>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(transport.attempts(), 1);
    Ok(())
}
