// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{constants::*, Credential};
use async_trait::async_trait;
use awsrpc_core::{Context, Error, ProvideCredential, Result};

/// EnvCredentialProvider loads AWS credentials from environment variables.
///
/// The environment is read once, when the provider is built:
///
/// - `AWS_ACCESS_KEY_ID`, or the legacy `AWS_ACCESS_KEY`: The AWS access key ID
/// - `AWS_SECRET_ACCESS_KEY`, or the legacy `AWS_SECRET_KEY`: The AWS secret access key
/// - `AWS_SESSION_TOKEN`: The AWS session token (optional)
///
/// Empty values count as missing.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    credential: Credential,
}

impl EnvCredentialProvider {
    /// Build an EnvCredentialProvider from the environment of `ctx`.
    ///
    /// Fails with `CredentialUnavailable` naming the missing field when the
    /// access key id or the secret access key is absent.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let Some(access_key_id) = ctx.env_var_any(&[AWS_ACCESS_KEY_ID, AWS_ACCESS_KEY]) else {
            return Err(Error::credential_unavailable(format!(
                "{AWS_ACCESS_KEY_ID} or {AWS_ACCESS_KEY} not found in environment"
            ))
            .with_context("field: access_key_id"));
        };
        let Some(secret_access_key) = ctx.env_var_any(&[AWS_SECRET_ACCESS_KEY, AWS_SECRET_KEY])
        else {
            return Err(Error::credential_unavailable(format!(
                "{AWS_SECRET_ACCESS_KEY} or {AWS_SECRET_KEY} not found in environment"
            ))
            .with_context("field: secret_access_key"));
        };
        let session_token = ctx.env_var_any(&[AWS_SESSION_TOKEN]);

        Ok(Self {
            credential: Credential {
                access_key_id,
                secret_access_key,
                session_token,
                expires_in: None,
            },
        })
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Self::Credential> {
        Ok(self.credential.clone())
    }
}
