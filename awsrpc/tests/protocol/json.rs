use crate::mock::{client, config, MockTransport};
use awsrpc::protocol::Protocol;
use awsrpc::{OperationDescriptor, ServiceConfig};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct DescribeTableInput {
    #[serde(rename = "TableName")]
    table_name: String,
}

#[derive(Debug, Deserialize)]
struct DescribeTableOutput {
    #[serde(rename = "Table")]
    table: Table,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(rename = "TableName")]
    table_name: String,
    #[serde(rename = "ItemCount")]
    item_count: i64,
}

fn dynamodb() -> ServiceConfig {
    ServiceConfig {
        service_name: "dynamodb".to_string(),
        endpoint: None,
        target_prefix: "DynamoDB_20120810".to_string(),
        json_version: "1.0".to_string(),
        ..config(Protocol::Json)
    }
}

#[tokio::test]
async fn test_json_call() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(
        200,
        r#"{"Table":{"TableName":"users","ItemCount":42,"TableStatus":"ACTIVE"}}"#,
    );
    let client = client(dynamodb(), &transport);

    let output: DescribeTableOutput = client
        .send(
            OperationDescriptor::new("DescribeTable"),
            &DescribeTableInput {
                table_name: "users".to_string(),
            },
        )
        .await?;
    assert_eq!(output.table.table_name, "users");
    assert_eq!(output.table.item_count, 42);

    let req = &transport.requests()[0];
    assert_eq!(req.uri, "https://dynamodb.us-east-1.amazonaws.com/");
    assert_eq!(req.header("x-amz-target"), "DynamoDB_20120810.DescribeTable");
    assert_eq!(req.header("content-type"), "application/x-amz-json-1.0");
    assert_eq!(req.body_str(), r#"{"TableName":"users"}"#);
    assert!(req
        .header("authorization")
        .contains("/us-east-1/dynamodb/aws4_request"));
    Ok(())
}

#[tokio::test]
async fn test_json_error() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(
        400,
        r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
    );
    let client = client(dynamodb(), &transport);

    let err = client
        .send::<_, ()>(
            OperationDescriptor::new("DescribeTable"),
            &DescribeTableInput {
                table_name: "missing".to_string(),
            },
        )
        .await
        .expect_err("call must fail");

    assert_eq!(transport.attempts(), 1);
    let api = err.api_error().expect("service error");
    assert_eq!(api.code, "ResourceNotFoundException");
    assert_eq!(api.message, "Requested resource not found");
    Ok(())
}
