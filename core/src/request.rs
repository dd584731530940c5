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

use std::mem;
use std::str::FromStr;

use bytes::Bytes;
use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::{Error, Result};

/// OutboundRequest is a request that has not been signed yet.
///
/// All fields are open for editing. Signing consumes the request and returns a
/// [`SignedRequest`] which can't be edited anymore.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as it will be sent (may contain percent-encoded bytes).
    pub path: String,
    /// HTTP query string without the leading `?`, sent exactly as given.
    pub query: Option<String>,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// HTTP body, empty if the request carries no payload.
    pub body: Bytes,
}

impl OutboundRequest {
    /// Build an outbound request from a method and an absolute url.
    ///
    /// ```
    /// use cesgate_core::OutboundRequest;
    ///
    /// let req = OutboundRequest::new("GET", "https://ces.example.com/V1.0/metrics?from=0&to=10")?;
    /// assert_eq!(req.path, "/V1.0/metrics");
    /// assert_eq!(req.query.as_deref(), Some("from=0&to=10"));
    /// # Ok::<(), cesgate_core::Error>(())
    /// ```
    pub fn new(method: &str, url: &str) -> Result<Self> {
        if method.is_empty() {
            return Err(Error::request_invalid("method must not be empty"));
        }
        let method = Method::from_str(&method.to_ascii_uppercase())?;
        let uri = Uri::from_str(url)?;

        Self::from_uri(method, uri, HeaderMap::new(), Bytes::new())
    }

    /// Build an outbound request from `http::request::Parts` and its body.
    pub fn from_parts(mut parts: http::request::Parts, body: Bytes) -> Result<Self> {
        let uri = mem::take(&mut parts.uri);
        // Take the headers out of the request to avoid copy.
        let headers = mem::take(&mut parts.headers);

        Self::from_uri(parts.method, uri, headers, body)
    }

    fn from_uri(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Result<Self> {
        let uri = uri.into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(OutboundRequest {
            method,
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq.query().filter(|q| !q.is_empty()).map(str::to_string),
            headers,
            body,
        })
    }

    /// Set a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers
            .insert(HeaderName::from_str(name)?, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Replace the query with a raw query string, kept byte for byte.
    ///
    /// An empty string clears the query.
    pub fn with_raw_query(mut self, query: &str) -> Self {
        self.query = (!query.is_empty()).then(|| query.to_string());
        self
    }

    /// Query pairs decoded with `application/x-www-form-urlencoded` rules, in
    /// their original order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match &self.query {
            None => Vec::new(),
            Some(q) => form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    /// Get header names as sorted vector.
    ///
    /// `HeaderMap` always stores names in lower case.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }

    /// Freeze this request after the signature headers have been attached.
    ///
    /// Path and query go to the wire unchanged.
    pub fn seal(self) -> Result<SignedRequest> {
        let paq = match self.query {
            None => self.path,
            Some(q) => format!("{}?{q}", self.path),
        };

        let mut uri_parts = http::uri::Parts::default();
        uri_parts.scheme = Some(self.scheme);
        uri_parts.authority = Some(self.authority);
        uri_parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);

        Ok(SignedRequest {
            method: self.method,
            uri: Uri::from_parts(uri_parts)?,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// SignedRequest is a request carrying its authentication headers.
///
/// It only offers read access; the sole way out is dispatching it.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl SignedRequest {
    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request uri including the signed query.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// All headers, including the ones added while signing.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as str, `None` if absent or not visible ascii.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Convert into an `http::Request` ready to be sent.
    pub fn into_http(self) -> http::Request<Bytes> {
        let mut req = http::Request::new(self.body);
        *req.method_mut() = self.method;
        *req.uri_mut() = self.uri;
        *req.headers_mut() = self.headers;
        req
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_parses_url() -> Result<()> {
        let req = OutboundRequest::new(
            "get",
            "https://ces.example.com/V1.0/metric%20data?b=2&a=1&flag",
        )?;

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.scheme, Scheme::HTTPS);
        assert_eq!(req.authority.as_str(), "ces.example.com");
        assert_eq!(req.path, "/V1.0/metric%20data");
        assert_eq!(req.query.as_deref(), Some("b=2&a=1&flag"));
        assert_eq!(
            req.query_pairs(),
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("flag".to_string(), "".to_string()),
            ]
        );
        assert!(req.body.is_empty());
        Ok(())
    }

    #[test]
    fn test_new_rejects_empty_method() {
        let err = OutboundRequest::new("", "https://ces.example.com/").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_new_rejects_relative_url() {
        let err = OutboundRequest::new("GET", "/V1.0/metrics").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_from_parts_keeps_headers() -> Result<()> {
        let (parts, _) = http::Request::post("http://127.0.0.1:9000/hello?x=1")
            .header("X-Stage", "RELEASE")
            .header("Content-Type", "application/json")
            .body(())?
            .into_parts();

        let req = OutboundRequest::from_parts(parts, Bytes::from_static(b"{}"))?;
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.scheme, Scheme::HTTP);
        assert_eq!(req.query.as_deref(), Some("x=1"));
        assert_eq!(req.headers["x-stage"], "RELEASE");
        assert_eq!(
            req.header_name_to_vec_sorted(),
            vec!["content-type", "x-stage"]
        );
        assert_eq!(req.body, Bytes::from_static(b"{}"));
        Ok(())
    }

    #[test]
    fn test_with_raw_query() -> Result<()> {
        let req = OutboundRequest::new("GET", "https://ces.example.com/V1.0?old=1")?
            .with_raw_query("to=10&from=0&q=a+b");
        assert_eq!(req.query.as_deref(), Some("to=10&from=0&q=a+b"));
        assert_eq!(
            req.query_pairs(),
            vec![
                ("to".to_string(), "10".to_string()),
                ("from".to_string(), "0".to_string()),
                ("q".to_string(), "a b".to_string()),
            ]
        );

        let req = req.with_raw_query("");
        assert_eq!(req.query, None);
        assert!(req.query_pairs().is_empty());
        Ok(())
    }

    #[test]
    fn test_seal_keeps_query_verbatim() -> Result<()> {
        let signed = OutboundRequest::new("GET", "https://ces.example.com/V1.0/metrics")?
            .with_raw_query("to=10&from=0&a=2&a=1&q=a+b")
            .with_header("X-Stage", "RELEASE")?
            .seal()?;

        assert_eq!(
            signed.uri().to_string(),
            "https://ces.example.com/V1.0/metrics?to=10&from=0&a=2&a=1&q=a+b"
        );
        assert_eq!(signed.header("x-stage"), Some("RELEASE"));

        let req = signed.into_http();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.headers()["x-stage"], "RELEASE");
        Ok(())
    }

    #[test]
    fn test_seal_without_query() -> Result<()> {
        let signed = OutboundRequest::new("GET", "https://ces.example.com/V1.0?")?.seal()?;
        assert_eq!(signed.uri().to_string(), "https://ces.example.com/V1.0");
        Ok(())
    }
}
