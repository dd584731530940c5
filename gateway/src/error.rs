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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors the gateway answers with a local response.
///
/// Anything the monitoring API actually answered is relayed as is and never
/// becomes a `GatewayError`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No `X-Auth-Token` on a protected route.
    #[error("token is absent")]
    TokenAbsent,
    /// The identity service refused the token.
    #[error("invalid token")]
    InvalidToken,
    /// The identity service answered with a server fault.
    #[error("unable to check token")]
    IdentityUnavailable,
    /// The identity service answer could not be decoded.
    #[error("failed to unmarshal token check response")]
    IdentityDecode(#[source] serde_json::Error),
    /// The inbound path or query can't be turned into a signed request.
    #[error("{0}")]
    InvalidProxyRequest(#[source] cesgate_core::Error),
    /// The outbound request could not be signed.
    #[error("failed to sign request")]
    Signing(#[source] cesgate_core::Error),
    /// A network call didn't produce a response.
    #[error("failed to do http request")]
    Transport(#[source] anyhow::Error),
    /// No response head within the read timeout.
    #[error("request timed out")]
    Timeout,
    /// The dashboard id in the path isn't a number.
    #[error("failed to parse dashboard ID")]
    InvalidDashboardId,
    /// The dashboard body isn't valid JSON.
    #[error("failed to JSON unmarshal dashboard: {0}")]
    InvalidDashboard(#[source] serde_json::Error),
    /// No dashboard with this id for the caller.
    #[error("dashboard not found")]
    DashboardNotFound,
    /// The caller already owns a dashboard with this name.
    #[error("dashboard {0:?} already exists")]
    DashboardConflict(String),
    /// The dashboard store failed.
    #[error("dashboard store failed")]
    Store(#[source] anyhow::Error),
}

impl GatewayError {
    /// Status code answered for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TokenAbsent => StatusCode::FORBIDDEN,
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::InvalidProxyRequest(_)
            | Self::InvalidDashboardId
            | Self::InvalidDashboard(_) => StatusCode::BAD_REQUEST,
            Self::DashboardNotFound => StatusCode::NOT_FOUND,
            Self::DashboardConflict(_) => StatusCode::CONFLICT,
            Self::IdentityUnavailable
            | Self::IdentityDecode(_)
            | Self::Signing(_)
            | Self::Transport(_)
            | Self::Timeout
            | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::dashboard::StoreError> for GatewayError {
    fn from(e: crate::dashboard::StoreError) -> Self {
        match e {
            crate::dashboard::StoreError::Conflict(name) => Self::DashboardConflict(name),
            crate::dashboard::StoreError::Backend(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        // The body only carries the summary, sources stay in the log.
        let body = self.to_string();
        if status.is_server_error() {
            log::error!("request failed: {:?}", anyhow::Error::new(self));
        } else {
            log::debug!("request rejected: {body}");
        }

        if status == StatusCode::NOT_FOUND {
            return status.into_response();
        }
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::Error;

    #[test]
    fn test_status() {
        assert_eq!(GatewayError::TokenAbsent.status(), StatusCode::FORBIDDEN);
        assert_eq!(GatewayError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::IdentityUnavailable.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Signing(Error::credential_missing("secret access key is empty"))
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::InvalidProxyRequest(Error::request_invalid("path is not valid utf-8"))
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GatewayError::Timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(GatewayError::InvalidDashboardId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::DashboardNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            GatewayError::DashboardConflict("cpu".to_string()).status(),
            StatusCode::CONFLICT
        );
    }
}
