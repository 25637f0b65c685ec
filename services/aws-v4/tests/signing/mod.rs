use awsrpc_aws_v4::{RequestSigner, StaticCredentialProvider, X_AMZ_CONTENT_SHA_256};
use awsrpc_core::hash::hex_sha256;
use awsrpc_core::{Body, Context, Signer};
use http::header::AUTHORIZATION;
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn signer() -> Signer<awsrpc_aws_v4::Credential> {
    let _ = env_logger::builder().is_test(true).try_init();

    Signer::new(
        Context::new(),
        StaticCredentialProvider::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        RequestSigner::new("iam", "us-east-1"),
    )
}

fn authorization(req: &http::Request<Body>) -> String {
    req.headers()[AUTHORIZATION]
        .to_str()
        .expect("authorization must be ascii")
        .to_string()
}

#[tokio::test]
async fn test_signature_ignores_header_insertion_order() -> anyhow::Result<()> {
    let signer = signer();

    let mut a = http::Request::post("https://iam.amazonaws.com/")
        .header("x-amz-date", "20150830T123600Z")
        .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
        .header("x-amz-meta-a", "1")
        .body(Body::from("Action=ListUsers&Version=2010-05-08"))?;
    let mut b = http::Request::post("https://iam.amazonaws.com/")
        .header("x-amz-meta-a", "1")
        .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
        .header("x-amz-date", "20150830T123600Z")
        .body(Body::from("Action=ListUsers&Version=2010-05-08"))?;

    signer.sign(&mut a).await?;
    signer.sign(&mut b).await?;

    assert_eq!(authorization(&a), authorization(&b));
    assert!(authorization(&a).contains(
        "SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date;x-amz-meta-a,"
    ));
    Ok(())
}

#[tokio::test]
async fn test_signing_keeps_stream_payload() -> anyhow::Result<()> {
    let signer = signer();
    let payload = b"Action=ListUsers&Version=2010-05-08".to_vec();

    let mut req = http::Request::post("https://iam.amazonaws.com/")
        .header("x-amz-date", "20150830T123600Z")
        .body(Body::from_reader(Cursor::new(payload.clone())))?;
    signer.sign(&mut req).await?;

    assert_eq!(
        req.headers()[X_AMZ_CONTENT_SHA_256],
        hex_sha256(&payload).as_str()
    );
    assert_eq!(req.body_mut().buffer()?.as_ref(), payload.as_slice());
    Ok(())
}

#[tokio::test]
async fn test_http_date_is_normalized() -> anyhow::Result<()> {
    let signer = signer();

    let mut req = http::Request::get("https://iam.amazonaws.com/?Action=ListUsers")
        .header("x-amz-date", "Sun, 30 Aug 2015 12:36:00 GMT")
        .body(Body::empty())?;
    signer.sign(&mut req).await?;

    assert_eq!(req.headers()["x-amz-date"], "20150830T123600Z");
    assert!(authorization(&req).contains("Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request"));
    Ok(())
}
