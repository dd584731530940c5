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

use crate::{
    Context, Error, OutboundRequest, ProvideCredential, Result, SignRequest, SignedRequest,
    SigningCredential,
};
use std::sync::Arc;

/// Signer is the main struct used to sign the request.
///
/// The credential is resolved once by [`Signer::load`] and shared read-only
/// between all clones, so a single signer can serve any number of concurrent
/// requests without locking.
#[derive(Clone, Debug)]
pub struct Signer<C: SigningCredential> {
    credential: Arc<C>,
    builder: Arc<dyn SignRequest<Credential = C>>,
}

impl<C: SigningCredential> Signer<C> {
    /// Create a new signer with an already resolved credential.
    pub fn new(credential: C, builder: impl SignRequest<Credential = C>) -> Result<Self> {
        if !credential.is_valid() {
            return Err(Error::credential_missing(
                "access key and secret key must not be empty",
            ));
        }

        Ok(Self {
            credential: Arc::new(credential),
            builder: Arc::new(builder),
        })
    }

    /// Resolve the credential from given provider and create a signer.
    ///
    /// Fails with [`crate::ErrorKind::CredentialMissing`] if the provider
    /// doesn't yield a usable credential.
    pub async fn load(
        ctx: &Context,
        provider: impl ProvideCredential<Credential = C>,
        builder: impl SignRequest<Credential = C>,
    ) -> Result<Self> {
        let credential = provider.provide_credential(ctx).await?.ok_or_else(|| {
            Error::credential_missing(format!("no credential found by {provider:?}"))
        })?;
        log::debug!("signer loaded credential: {credential:?}");

        Self::new(credential, builder)
    }

    /// The credential used by this signer.
    pub fn credential(&self) -> &C {
        &self.credential
    }

    /// Signing request.
    pub fn sign(&self, req: OutboundRequest) -> Result<SignedRequest> {
        log::debug!(
            "signing {} {}{} with builder {:?}",
            req.method,
            req.authority,
            req.path,
            self.builder
        );
        self.builder.sign_request(req, &self.credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, StaticEnv};

    #[derive(Clone, Debug)]
    struct TestCredential {
        key: String,
        secret: String,
    }

    impl SigningCredential for TestCredential {
        fn is_valid(&self) -> bool {
            !self.key.is_empty() && !self.secret.is_empty()
        }
    }

    #[derive(Debug)]
    struct EnvProvider;

    #[async_trait::async_trait]
    impl ProvideCredential for EnvProvider {
        type Credential = TestCredential;

        async fn provide_credential(&self, ctx: &Context) -> Result<Option<TestCredential>> {
            Ok(Some(TestCredential {
                key: ctx.env_var("KEY").unwrap_or_default(),
                secret: ctx.env_var("SECRET").unwrap_or_default(),
            }))
        }
    }

    #[derive(Debug)]
    struct EmptyProvider;

    #[async_trait::async_trait]
    impl ProvideCredential for EmptyProvider {
        type Credential = TestCredential;

        async fn provide_credential(&self, _: &Context) -> Result<Option<TestCredential>> {
            Ok(None)
        }
    }

    #[derive(Debug)]
    struct KeyHeaderBuilder;

    impl SignRequest for KeyHeaderBuilder {
        type Credential = TestCredential;

        fn sign_request(
            &self,
            req: OutboundRequest,
            cred: &TestCredential,
        ) -> Result<SignedRequest> {
            req.with_header("x-key", &cred.key)?.seal()
        }
    }

    #[tokio::test]
    async fn test_load_and_sign() -> Result<()> {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            ("KEY", "AKID"),
            ("SECRET", "SECRET"),
        ]));
        let signer = Signer::load(&ctx, EnvProvider, KeyHeaderBuilder).await?;
        assert_eq!(signer.credential().key, "AKID");

        let signed = signer.sign(OutboundRequest::new("GET", "https://example.com/")?)?;
        assert_eq!(signed.header("x-key"), Some("AKID"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_without_credential() {
        let err = Signer::load(&Context::new(), EmptyProvider, KeyHeaderBuilder)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
    }

    #[tokio::test]
    async fn test_load_with_empty_secret() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([("KEY", "AKID")]));
        let err = Signer::load(&ctx, EnvProvider, KeyHeaderBuilder)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
    }
}
