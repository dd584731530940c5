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

use std::fmt::{self, Display, Write};

use cesgate_core::hash::hex_sha256;
use cesgate_core::{Error, OutboundRequest, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode};

use crate::constants::{URI_ENCODE_SET, X_SDK_CONTENT_SHA256};

/// CanonicalRequest is the normalized form of an [`OutboundRequest`].
///
/// Its [`Display`] output is the exact text hashed into the string to sign:
///
/// ```text
/// GET
/// /V1.0/metrics/
/// from=0&to=10
/// x-sdk-date:20221017T083000Z
/// x-stage:RELEASE
///
/// x-sdk-date;x-stage
/// e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// Upper-case method.
    pub method: String,
    /// Encoded path, always ending in `/`.
    pub uri: String,
    /// Sorted and encoded query pairs.
    pub query: String,
    /// One `name:value\n` line per header value.
    pub headers: String,
    /// Lower-cased header names joined with `;`.
    pub signed_headers: String,
    /// Hex digest of the payload, or the value of `x-sdk-content-sha256`.
    pub payload_hash: String,
}

impl Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        writeln!(f, "{}", self.headers)?;
        writeln!(f, "{}", self.signed_headers)?;
        write!(f, "{}", self.payload_hash)
    }
}

/// CanonicalRequestBuilder turns a request snapshot into a [`CanonicalRequest`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalRequestBuilder;

impl CanonicalRequestBuilder {
    /// Canonicalize the request.
    ///
    /// Fails with [`cesgate_core::ErrorKind::RequestInvalid`] if the method or
    /// path is empty, the path doesn't decode to utf-8, or a header value is
    /// not visible ascii.
    pub fn build(req: &OutboundRequest) -> Result<CanonicalRequest> {
        if req.method.as_str().is_empty() {
            return Err(Error::request_invalid("method must not be empty"));
        }
        if req.path.is_empty() {
            return Err(Error::request_invalid("path must not be empty"));
        }

        let (headers, signed_headers) = canonical_headers(req)?;

        Ok(CanonicalRequest {
            method: req.method.as_str().to_ascii_uppercase(),
            uri: canonical_uri(&req.path)?,
            query: canonical_query(&req.query_pairs()),
            headers,
            signed_headers,
            payload_hash: payload_hash(req)?,
        })
    }
}

fn canonical_uri(path: &str) -> Result<String> {
    let path = percent_decode_str(path).decode_utf8().map_err(|e| {
        Error::request_invalid(format!("path is not valid utf-8: {path}")).with_source(e)
    })?;

    let mut uri = path
        .split('/')
        .map(|seg| utf8_percent_encode(seg, &URI_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/");
    if !uri.ends_with('/') {
        uri.push('/');
    }

    Ok(uri)
}

/// Sort decoded pairs by key then value, then encode both sides.
fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs = query.iter().collect::<Vec<_>>();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, &URI_ENCODE_SET),
                utf8_percent_encode(v, &URI_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_headers(req: &OutboundRequest) -> Result<(String, String)> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut block = String::with_capacity(256);

    let names = req.header_name_to_vec_sorted();
    for name in names.iter() {
        let mut values = req
            .headers
            .get_all(*name)
            .iter()
            .map(|v| v.to_str().map(str::trim))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        values.sort_unstable();

        for value in values {
            writeln!(block, "{name}:{value}")?;
        }
    }

    Ok((block, names.join(";")))
}

fn payload_hash(req: &OutboundRequest) -> Result<String> {
    match req.headers.get(X_SDK_CONTENT_SHA256) {
        Some(v) => Ok(v.to_str()?.to_string()),
        None => Ok(hex_sha256(&req.body)),
    }
}
