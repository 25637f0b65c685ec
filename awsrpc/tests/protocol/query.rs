use crate::mock::{client, config, MockTransport};
use awsrpc::protocol::Protocol;
use awsrpc::OperationDescriptor;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct DeleteUsersInput {
    #[serde(rename = "Names")]
    names: Vec<String>,
    #[serde(rename = "Force")]
    force: bool,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListUsersOutput {
    #[serde(rename = "ListUsersResult")]
    result: ListUsersResult,
}

#[derive(Debug, Deserialize)]
struct ListUsersResult {
    #[serde(rename = "Users")]
    users: Users,
    #[serde(rename = "IsTruncated")]
    is_truncated: bool,
}

#[derive(Debug, Deserialize)]
struct Users {
    #[serde(rename = "member", default)]
    members: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    #[serde(rename = "UserName")]
    user_name: String,
    #[serde(rename = "UserId")]
    user_id: String,
}

#[tokio::test]
async fn test_list_members_are_flattened() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "");
    let client = client(config(Protocol::Query), &transport);

    let input = DeleteUsersInput {
        names: vec!["a".to_string(), "b".to_string()],
        force: true,
        reason: None,
    };
    client
        .send::<_, ()>(OperationDescriptor::new("DeleteUsers"), &input)
        .await?;

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, http::Method::POST);
    assert_eq!(req.uri, "https://iam.amazonaws.com/");
    assert_eq!(req.header("content-type"), "application/x-www-form-urlencoded");
    assert_eq!(
        req.body_str(),
        "Action=DeleteUsers&Force=true&Names.member.1=a&Names.member.2=b&Version=2010-05-08"
    );
    Ok(())
}

#[tokio::test]
async fn test_request_is_signed() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "");
    let client = client(config(Protocol::Query), &transport);

    client
        .send::<_, ()>(OperationDescriptor::new("ListUsers"), &())
        .await?;

    let req = &transport.requests()[0];
    let authorization = req.header("authorization");
    assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
    assert!(authorization.contains("/us-east-1/iam/aws4_request, SignedHeaders="));
    assert!(authorization.contains(
        "SignedHeaders=content-length;content-type;host;user-agent;x-amz-content-sha256;x-amz-date, Signature="
    ));
    assert_eq!(req.header("host"), "iam.amazonaws.com");
    assert_eq!(req.header("x-amz-date").len(), "20150830T123600Z".len());
    Ok(())
}

#[tokio::test]
async fn test_response_is_decoded() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(
        200,
        r#"<ListUsersResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">
   <ListUsersResult>
      <Users>
         <member>
            <UserId>AID2MAB8DPLSRHEXAMPLE</UserId>
            <UserName>Andrew</UserName>
         </member>
         <member>
            <UserId>AIDIODR4TAW7CSEXAMPLE</UserId>
            <UserName>Jackie</UserName>
         </member>
      </Users>
      <IsTruncated>false</IsTruncated>
   </ListUsersResult>
   <ResponseMetadata>
      <RequestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</RequestId>
   </ResponseMetadata>
</ListUsersResponse>"#,
    );
    let client = client(config(Protocol::Query), &transport);

    let output: ListUsersOutput = client
        .send(OperationDescriptor::new("ListUsers"), &())
        .await?;

    assert!(!output.result.is_truncated);
    let names: Vec<_> = output
        .result
        .users
        .members
        .iter()
        .map(|v| (v.user_name.as_str(), v.user_id.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Andrew", "AID2MAB8DPLSRHEXAMPLE"),
            ("Jackie", "AIDIODR4TAW7CSEXAMPLE")
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_error_response_is_decoded() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply_with_headers(
        404,
        &[("x-amzn-requestid", "header-id")],
        r#"<ErrorResponse xmlns="https://iam.amazonaws.com/doc/2010-05-08/">
  <Error>
    <Type>Sender</Type>
    <Code>NoSuchEntity</Code>
    <Message>The user with name bob cannot be found.</Message>
  </Error>
  <RequestId>body-id</RequestId>
</ErrorResponse>"#,
    );
    let client = client(config(Protocol::Query), &transport);

    let err = client
        .send::<_, ()>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");

    let api = err.api_error().expect("service error");
    assert_eq!(api.status, 404);
    assert_eq!(api.code, "NoSuchEntity");
    assert_eq!(api.error_type, "Sender");
    assert_eq!(api.message, "The user with name bob cannot be found.");
    assert_eq!(api.request_id, "body-id");
    assert_eq!(
        err.to_string(),
        "NoSuchEntity: The user with name bob cannot be found. (request id: body-id)"
    );
    Ok(())
}

#[tokio::test]
async fn test_error_request_id_from_header() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply_with_headers(
        403,
        &[("x-amzn-requestid", "header-id")],
        "<Error><Code>AccessDenied</Code><Message>denied</Message></Error>",
    );
    let client = client(config(Protocol::Query), &transport);

    let err = client
        .send::<_, ()>(OperationDescriptor::new("GetUser"), &())
        .await
        .expect_err("call must fail");

    let api = err.api_error().expect("service error");
    assert_eq!(api.status, 403);
    assert_eq!(api.code, "AccessDenied");
    assert_eq!(api.request_id, "header-id");
    assert!(!api.retryable);
    Ok(())
}
