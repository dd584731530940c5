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

//! Caller token verification.

use async_trait::async_trait;
use bytes::Bytes;
use cesgate_core::Context;
use http::StatusCode;
use serde::Deserialize;

use crate::GatewayError;

/// Header carrying the caller token, both inbound and towards the identity service.
pub const X_AUTH_TOKEN: &str = "x-auth-token";
/// Header naming the token to verify.
pub const X_SUBJECT_TOKEN: &str = "x-subject-token";

/// IdentityProvider resolves a caller token into a user id.
#[async_trait]
pub trait IdentityProvider: std::fmt::Debug + Send + Sync + 'static {
    /// Check the token and return the id of its user.
    async fn check(&self, token: &str) -> Result<String, GatewayError>;
}

/// IamIdentityProvider asks the IAM `auth/tokens` endpoint about the token.
#[derive(Debug, Clone)]
pub struct IamIdentityProvider {
    ctx: Context,
    endpoint: String,
}

#[derive(Deserialize)]
struct TokenResp {
    token: Token,
}

#[derive(Deserialize)]
struct Token {
    user: User,
}

#[derive(Deserialize)]
struct User {
    #[serde(rename = "ID", alias = "id")]
    id: String,
}

impl IamIdentityProvider {
    /// Create a provider sending through `ctx` to the IAM base `endpoint`.
    pub fn new(ctx: Context, endpoint: &str) -> Self {
        Self {
            ctx,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for IamIdentityProvider {
    async fn check(&self, token: &str) -> Result<String, GatewayError> {
        let req = http::Request::get(format!("{}/auth/tokens", self.endpoint))
            .header(X_AUTH_TOKEN, token)
            .header(X_SUBJECT_TOKEN, token)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Bytes::new())
            .map_err(|e| GatewayError::Transport(e.into()))?;

        let resp = self
            .ctx
            .http_send(req)
            .await
            .map_err(|e| GatewayError::Transport(e.into()))?;

        let status = resp.status();
        if status.is_server_error() {
            log::warn!("identity service answered {status}");
            return Err(GatewayError::IdentityUnavailable);
        }
        if status != StatusCode::OK {
            return Err(GatewayError::InvalidToken);
        }

        let body: TokenResp =
            serde_json::from_slice(resp.body()).map_err(GatewayError::IdentityDecode)?;
        Ok(body.token.user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::{HttpSend, Result};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FixedResponse {
        status: u16,
        body: &'static str,
        seen: Arc<parking_lot::Mutex<Vec<http::Request<Bytes>>>>,
    }

    #[async_trait]
    impl HttpSend for FixedResponse {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            self.seen.lock().push(req);
            Ok(http::Response::builder()
                .status(self.status)
                .body(Bytes::from_static(self.body.as_bytes()))?)
        }
    }

    fn provider(status: u16, body: &'static str) -> (IamIdentityProvider, FixedResponse) {
        let http = FixedResponse {
            status,
            body,
            seen: Arc::default(),
        };
        let probe = FixedResponse {
            status,
            body,
            seen: http.seen.clone(),
        };
        let ctx = Context::new().with_http_send(http);
        (IamIdentityProvider::new(ctx, "https://iam.example.com/v3/"), probe)
    }

    #[tokio::test]
    async fn test_check_ok() {
        let (p, probe) = provider(200, r#"{"token":{"user":{"ID":"user-1","name":"x"}}}"#);

        assert_eq!(p.check("tok").await.unwrap(), "user-1");

        let seen = probe.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].uri(), "https://iam.example.com/v3/auth/tokens");
        assert_eq!(seen[0].headers()[X_AUTH_TOKEN], "tok");
        assert_eq!(seen[0].headers()[X_SUBJECT_TOKEN], "tok");
        assert_eq!(seen[0].headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_check_lower_case_id() {
        let (p, _) = provider(200, r#"{"token":{"user":{"id":"user-2"}}}"#);
        assert_eq!(p.check("tok").await.unwrap(), "user-2");
    }

    #[tokio::test]
    async fn test_check_statuses() {
        let (p, _) = provider(401, "");
        assert!(matches!(p.check("tok").await, Err(GatewayError::InvalidToken)));

        let (p, _) = provider(404, "");
        assert!(matches!(p.check("tok").await, Err(GatewayError::InvalidToken)));

        let (p, _) = provider(503, "");
        assert!(matches!(
            p.check("tok").await,
            Err(GatewayError::IdentityUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_check_bad_body() {
        let (p, _) = provider(200, "not json");
        assert!(matches!(
            p.check("tok").await,
            Err(GatewayError::IdentityDecode(_))
        ));
    }
}
