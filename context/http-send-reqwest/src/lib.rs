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

//! [`HttpSend`] implementation backed by `reqwest`.

use async_trait::async_trait;
use bytes::Bytes;
use cesgate_core::{Error, HttpSend, Result};
use http_body_util::BodyExt;
use reqwest::{Client, Request};

/// ReqwestHttpSend sends requests with a shared [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to build http request").with_source(e))?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::transport("failed to do http request").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport("failed to read http response").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::{Context, ErrorKind};
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_http_send() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/auth/tokens").header("x-auth-token", "tok");
                then.status(200).body("hello");
            })
            .await;

        let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
        let req = http::Request::get(server.url("/v3/auth/tokens"))
            .header("X-Auth-Token", "tok")
            .body(Bytes::new())?;

        let resp = ctx.http_send(req).await?;
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.body(), &Bytes::from_static(b"hello"));
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_http_send_connection_refused() -> Result<()> {
        // Port 1 is reserved and nothing listens there.
        let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
        let req = http::Request::get("http://127.0.0.1:1/").body(Bytes::new())?;

        let err = ctx.http_send(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        Ok(())
    }
}
