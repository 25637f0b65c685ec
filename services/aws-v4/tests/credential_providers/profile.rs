use super::CountingFileRead;
use awsrpc_aws_v4::ProfileCredentialProvider;
use awsrpc_core::{Context, ErrorKind, ProvideCredential, StaticEnv};
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn credentials_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

fn context(fs: CountingFileRead, path: &NamedTempFile) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();

    Context::new().with_file_read(fs).with_env(StaticEnv {
        home_dir: None,
        envs: HashMap::from([(
            "AWS_SHARED_CREDENTIALS_FILE".to_string(),
            path.path().to_string_lossy().to_string(),
        )]),
    })
}

const CREDENTIALS: &str = r#"[default]
aws_access_key_id = default_access_key
aws_secret_access_key = default_secret_key
aws_session_token = default_session_token

[work]
aws_access_key_id = work_access_key
aws_secret_access_key = work_secret_key
aws_session_token = work_session_token
"#;

#[tokio::test]
async fn test_profile_ttl_caching() -> anyhow::Result<()> {
    let file = credentials_file(CREDENTIALS);
    let fs = CountingFileRead::default();
    let ctx = context(fs.clone(), &file);

    let provider = ProfileCredentialProvider::new().with_ttl(Duration::from_secs(1));

    let first = provider.provide_credential(&ctx).await?;
    let second = provider.provide_credential(&ctx).await?;
    assert_eq!(first, second);
    assert_eq!(first.access_key_id, "default_access_key");
    assert_eq!(fs.reads(), 1, "second call within ttl must hit the cache");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let third = provider.provide_credential(&ctx).await?;
    assert_eq!(third, first);
    assert_eq!(fs.reads(), 2, "call after ttl must re-read the file");
    Ok(())
}

#[tokio::test]
async fn test_profile_refresh_picks_up_new_values() -> anyhow::Result<()> {
    let file = credentials_file(CREDENTIALS);
    let fs = CountingFileRead::default();
    let ctx = context(fs.clone(), &file);

    let provider = ProfileCredentialProvider::new()
        .with_profile("work")
        .with_ttl(Duration::from_millis(100));
    let cred = provider.provide_credential(&ctx).await?;
    assert_eq!(cred.access_key_id, "work_access_key");

    std::fs::write(
        file.path(),
        CREDENTIALS.replace("work_access_key", "rotated_access_key"),
    )?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let cred = provider.provide_credential(&ctx).await?;
    assert_eq!(cred.access_key_id, "rotated_access_key");
    assert_eq!(fs.reads(), 2);
    Ok(())
}

#[tokio::test]
async fn test_profile_concurrent_callers_share_one_refresh() -> anyhow::Result<()> {
    let file = credentials_file(CREDENTIALS);
    let fs = CountingFileRead::default();
    let ctx = context(fs.clone(), &file);

    let provider = ProfileCredentialProvider::new().with_ttl(Duration::from_secs(60));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let provider = provider.clone();
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            provider.provide_credential(&ctx).await
        }));
    }
    for task in tasks {
        let cred = task.await??;
        assert_eq!(cred.access_key_id, "default_access_key");
    }

    assert_eq!(fs.reads(), 1);
    Ok(())
}

#[tokio::test]
async fn test_profile_incomplete() {
    let file = credentials_file(
        "[default]\naws_access_key_id = ak\naws_secret_access_key = sk\n",
    );
    let ctx = context(CountingFileRead::default(), &file);

    let err = ProfileCredentialProvider::new()
        .provide_credential(&ctx)
        .await
        .expect_err("profile without session token must fail");

    assert_eq!(err.kind(), ErrorKind::ProfileIncomplete);
    let msg = err.to_string();
    assert!(msg.contains("aws_session_token"), "{msg}");
    assert!(msg.contains("profile: default"), "{msg}");
    assert!(
        msg.contains(&file.path().to_string_lossy().to_string()),
        "{msg}"
    );
}
