use async_trait::async_trait;
use awsrpc_aws_v4::ImdsCredentialProvider;
use awsrpc_core::time::{format_timestamp, now};
use awsrpc_core::{Context, Error, ErrorKind, HttpSend, ProvideCredential, Result};
use bytes::Bytes;
use std::sync::{Arc, Mutex};

/// Fake metadata service that records every requested path.
#[derive(Debug, Clone)]
struct MetadataService {
    role_listing: String,
    expiration: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MetadataService {
    fn new(role_listing: &str, expiration: String) -> Self {
        Self {
            role_listing: role_listing.to_string(),
            expiration,
            requests: Arc::default(),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl HttpSend for MetadataService {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let path = req.uri().path().to_string();
        self.requests
            .lock()
            .expect("lock poisoned")
            .push(path.clone());

        let body = match path.as_str() {
            "/latest/meta-data/iam/security-credentials/" => self.role_listing.clone(),
            "/latest/meta-data/iam/security-credentials/web-role" => format!(
                r#"{{
  "Code" : "Success",
  "LastUpdated" : "2024-01-01T00:00:00Z",
  "Type" : "AWS-HMAC",
  "AccessKeyId" : "ASIAEXAMPLE",
  "SecretAccessKey" : "imds_secret_key",
  "Token" : "imds_session_token",
  "Expiration" : "{}"
}}"#,
                self.expiration
            ),
            _ => return Err(Error::transport(format!("unexpected path {path}"))),
        };
        Ok(http::Response::new(Bytes::from(body)))
    }
}

fn context(service: MetadataService) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();
    Context::new().with_http_send(service)
}

#[tokio::test]
async fn test_imds_caches_until_expiration() -> anyhow::Result<()> {
    let expiration = now() + chrono::TimeDelta::seconds(3600);
    let service = MetadataService::new("web-role\nother-role\n", format_timestamp(expiration));
    let ctx = context(service.clone());

    let provider = ImdsCredentialProvider::new().with_endpoint("http://127.0.0.1:1338");

    let cred = provider.provide_credential(&ctx).await?;
    assert_eq!(cred.access_key_id, "ASIAEXAMPLE");
    assert_eq!(cred.secret_access_key, "imds_secret_key");
    assert_eq!(cred.session_token.as_deref(), Some("imds_session_token"));
    assert_eq!(
        cred.expires_in.map(format_timestamp),
        Some(format_timestamp(expiration))
    );

    let again = provider.provide_credential(&ctx).await?;
    assert_eq!(again, cred);

    assert_eq!(
        service.requests(),
        vec![
            "/latest/meta-data/iam/security-credentials/".to_string(),
            "/latest/meta-data/iam/security-credentials/web-role".to_string(),
        ],
        "a cached credential must not trigger a third request"
    );
    Ok(())
}

#[tokio::test]
async fn test_imds_no_role() {
    let service = MetadataService::new("", String::new());
    let ctx = context(service.clone());

    let err = ImdsCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .expect_err("no role must fail");
    assert_eq!(err.kind(), ErrorKind::NoDefaultCredentials);
    assert_eq!(service.requests().len(), 1);
}

#[tokio::test]
async fn test_imds_bad_expiration_is_decode_error() {
    let service = MetadataService::new("web-role", "tomorrow".to_string());
    let ctx = context(service);

    let err = ImdsCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .expect_err("bad expiration must fail");
    assert_eq!(err.kind(), ErrorKind::Decode);
}
