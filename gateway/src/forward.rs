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

//! Signed relay to the monitoring API.

use axum::body::Body;
use axum::response::Response;
use cesgate_core::{ErrorKind, OutboundRequest, Signer};
use cesgate_huaweicloud_apig::Credential;
use http::header::CONTENT_TYPE;

use crate::GatewayError;

/// Header marking the deployment stage for the api gateway.
pub const X_STAGE: &str = "x-stage";

/// ProxyForwarder relays monitoring API calls with a signed request.
///
/// The upstream answer is streamed back without looking at its status, so a
/// `404` or `503` from the monitoring API reaches the caller unchanged.
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    base: String,
    stage: String,
    signer: Signer<Credential>,
    client: reqwest::Client,
}

impl ProxyForwarder {
    /// Create a forwarder for the monitoring API at `base`.
    pub fn new(
        base: &str,
        stage: &str,
        signer: Signer<Credential>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            stage: stage.to_string(),
            signer,
            client,
        }
    }

    /// Build the outbound request for an inbound suffix and raw query.
    ///
    /// An empty suffix targets the base itself. The query is kept verbatim.
    pub fn build(
        &self,
        suffix: &str,
        query: Option<&str>,
    ) -> cesgate_core::Result<OutboundRequest> {
        let mut url = self.base.clone();
        if !suffix.is_empty() {
            url.push('/');
            url.push_str(suffix);
        }

        OutboundRequest::new("GET", &url)?
            .with_raw_query(query.unwrap_or_default())
            .with_header(X_STAGE, &self.stage)
    }

    /// Sign and send the request, relaying status, content type and body.
    ///
    /// Dropping the returned response drops the upstream body stream and with
    /// it the connection.
    pub async fn forward(
        &self,
        suffix: &str,
        query: Option<&str>,
    ) -> Result<Response, GatewayError> {
        let req = self.build(suffix, query).map_err(classify)?;
        let signed = self.signer.sign(req).map_err(classify)?;
        log::info!("[ces request] url={}", signed.uri());

        let req = reqwest::Request::try_from(signed.into_http())
            .map_err(|e| GatewayError::Transport(e.into()))?;
        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|e| GatewayError::Transport(e.into()))?;

        let status = resp.status();
        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        log::debug!("[ces response] status={status}");

        let mut out = Response::new(Body::from_stream(resp.bytes_stream()));
        *out.status_mut() = status;
        if let Some(v) = content_type {
            out.headers_mut().insert(CONTENT_TYPE, v);
        }
        Ok(out)
    }
}

/// Invalid requests come from the inbound path or query.
fn classify(err: cesgate_core::Error) -> GatewayError {
    match err.kind() {
        ErrorKind::RequestInvalid => GatewayError::InvalidProxyRequest(err),
        _ => GatewayError::Signing(err),
    }
}
