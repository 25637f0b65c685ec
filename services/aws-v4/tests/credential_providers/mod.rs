mod imds;
mod profile;

use async_trait::async_trait;
use awsrpc_core::{Context, FileRead, Result, StaticEnv};
use awsrpc_file_read_tokio::TokioFileRead;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn create_test_context_with_env(envs: HashMap<String, String>) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();

    Context::new()
        .with_file_read(TokioFileRead)
        .with_env(StaticEnv {
            home_dir: None,
            envs,
        })
}

/// FileRead that counts reads before delegating to tokio.
#[derive(Debug, Clone, Default)]
pub struct CountingFileRead {
    reads: Arc<AtomicUsize>,
}

impl CountingFileRead {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileRead for CountingFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        TokioFileRead.file_read(path).await
    }
}
