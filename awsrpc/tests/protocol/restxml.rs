use crate::mock::{client, config, MockTransport};
use awsrpc::protocol::{blob, timestamp, Protocol};
use awsrpc::{Location, OperationDescriptor, PayloadKind, ServiceConfig};
use chrono::{DateTime, TimeZone, Utc};
use http::Method;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Grant {
    #[serde(rename = "Grantee")]
    grantee: String,
    #[serde(rename = "Permission")]
    permission: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Configuration {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Limit")]
    limit: i64,
    #[serde(rename = "Quota")]
    quota: u64,
    #[serde(rename = "Ratio")]
    ratio: f64,
    #[serde(rename = "Versioned")]
    versioned: bool,
    #[serde(rename = "Checksum", with = "blob")]
    checksum: Vec<u8>,
    #[serde(rename = "Modified", with = "timestamp")]
    modified: DateTime<Utc>,
    #[serde(rename = "Grant", default)]
    grants: Vec<Grant>,
}

#[derive(Serialize)]
struct PutConfigurationInput<'a> {
    #[serde(rename = "Bucket")]
    bucket: &'a str,
    #[serde(rename = "RequestPayer")]
    request_payer: &'a str,
    #[serde(rename = "Configuration")]
    configuration: &'a Configuration,
}

fn s3() -> ServiceConfig {
    ServiceConfig {
        service_name: "s3".to_string(),
        endpoint: Some("https://s3.us-east-1.amazonaws.com".to_string()),
        ..config(Protocol::RestXml)
    }
}

fn put_configuration() -> OperationDescriptor {
    OperationDescriptor::new("PutConfiguration")
        .with_method(Method::PUT)
        .with_path("/{Bucket}?configuration")
        .with_location("Bucket", Location::Uri("Bucket".to_string()))
        .with_location(
            "RequestPayer",
            Location::Header("x-amz-request-payer".to_string()),
        )
        .with_payload("Configuration", PayloadKind::Structure)
}

#[tokio::test]
async fn test_structure_survives_round_trip() -> anyhow::Result<()> {
    let transport = MockTransport::new().echo();
    let client = client(s3(), &transport);

    let configuration = Configuration {
        name: "logs & <metrics>".to_string(),
        limit: i64::MIN,
        quota: u64::MAX,
        ratio: 1.0 / 3.0,
        versioned: false,
        checksum: vec![0xde, 0xad, 0xbe, 0xef],
        modified: Utc
            .with_ymd_and_hms(2001, 9, 9, 1, 46, 40)
            .single()
            .expect("valid time"),
        grants: vec![
            Grant {
                grantee: "alice".to_string(),
                permission: "READ".to_string(),
            },
            Grant {
                grantee: "bob".to_string(),
                permission: "WRITE".to_string(),
            },
        ],
    };
    let input = PutConfigurationInput {
        bucket: "my-bucket",
        request_payer: "requester",
        configuration: &configuration,
    };

    let output: Configuration = client.send(put_configuration(), &input).await?;
    assert_eq!(output, configuration);
    assert_eq!(output.ratio.to_bits(), configuration.ratio.to_bits());

    let req = &transport.requests()[0];
    assert_eq!(req.method, Method::PUT);
    assert_eq!(
        req.uri,
        "https://s3.us-east-1.amazonaws.com/my-bucket?configuration="
    );
    assert_eq!(req.header("x-amz-request-payer"), "requester");
    assert!(req.body_str().starts_with("<Configuration>"));
    assert!(req
        .header("authorization")
        .contains("/us-east-1/s3/aws4_request"));
    Ok(())
}

#[tokio::test]
async fn test_rest_error() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(
        404,
        "<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message><RequestId>4442587FB7D0A2F9</RequestId></Error>",
    );
    let client = client(s3(), &transport);

    let err = client
        .send::<_, ()>(
            OperationDescriptor::new("DeleteBucket")
                .with_method(Method::DELETE)
                .with_path("/{Bucket}")
                .with_location("Bucket", Location::Uri("Bucket".to_string())),
            &serde_json::json!({"Bucket": "missing"}),
        )
        .await
        .expect_err("call must fail");

    assert_eq!(transport.attempts(), 1);
    let api = err.api_error().expect("service error");
    assert_eq!(api.status, 404);
    assert_eq!(api.code, "NoSuchBucket");
    assert_eq!(api.request_id, "4442587FB7D0A2F9");
    assert_eq!(transport.requests()[0].uri, "https://s3.us-east-1.amazonaws.com/missing");
    Ok(())
}

#[tokio::test]
async fn test_missing_uri_parameter_is_not_sent() -> anyhow::Result<()> {
    let transport = MockTransport::new().reply(200, "");
    let client = client(s3(), &transport);

    let err = client
        .send::<_, ()>(put_configuration(), &serde_json::json!({"RequestPayer": "x"}))
        .await
        .expect_err("call must fail");

    assert_eq!(err.kind(), awsrpc::ErrorKind::RequestInvalid);
    assert_eq!(transport.attempts(), 0);
    Ok(())
}
