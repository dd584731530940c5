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

use http::{header, HeaderValue};
use log::debug;

use cesgate_core::time::{format_iso8601, now, parse_iso8601, DateTime};
use cesgate_core::{Error, OutboundRequest, Result, SignRequest, SignedRequest};

use crate::constants::{ALGORITHM, X_SDK_DATE};
use crate::{CanonicalRequestBuilder, Credential, KeyDerivation, SignatureComputer};

/// RequestSigner that implements the api gateway `SDK-HMAC-SHA256` scheme.
///
/// - [Signature algorithm](https://support.huaweicloud.com/intl/en-us/devg-apisign/api-sign-algorithm.html)
#[derive(Debug, Default)]
pub struct RequestSigner {
    computer: SignatureComputer,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer using direct key derivation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use given key derivation.
    pub fn with_key_derivation(mut self, derivation: KeyDerivation) -> Self {
        self.computer = SignatureComputer::new(derivation);
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Resolve the signing time and make sure the request carries it.
    ///
    /// A parseable `x-sdk-date` already on the request is kept as is.
    fn stamp(&self, req: &mut OutboundRequest) -> Result<DateTime> {
        if let Some(t) = req
            .headers
            .get(X_SDK_DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_iso8601(v).ok())
        {
            return Ok(t);
        }

        let t = self.time.unwrap_or_else(now);
        req.headers
            .insert(X_SDK_DATE, HeaderValue::try_from(format_iso8601(t))?);
        Ok(t)
    }
}

impl SignRequest for RequestSigner {
    type Credential = Credential;

    fn sign_request(&self, mut req: OutboundRequest, cred: &Credential) -> Result<SignedRequest> {
        if cred.access_key_id.is_empty() {
            return Err(Error::credential_missing("access key id is empty"));
        }

        let signing_time = self.stamp(&mut req)?;

        let creq = CanonicalRequestBuilder::build(&req)?;
        let creq_string = creq.to_string();
        debug!("calculated canonical request: {creq_string}");

        let signature = self.computer.compute(cred, &creq_string, signing_time)?;

        let mut authorization = HeaderValue::from_str(&format!(
            "{ALGORITHM} Access={}, SignedHeaders={}, Signature={}",
            cred.access_key_id, creq.signed_headers, signature
        ))
        .map_err(|e| {
            Error::unexpected("access key id is not a valid header value").with_source(e)
        })?;
        authorization.set_sensitive(true);
        req.headers.insert(header::AUTHORIZATION, authorization);

        req.seal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime {
        parse_iso8601("20221017T083000Z").unwrap()
    }

    fn metrics_request() -> Result<OutboundRequest> {
        OutboundRequest::new("GET", "https://ces.example.com/V1.0/metrics?from=0&to=10")?
            .with_header("X-Stage", "RELEASE")
    }

    #[test]
    fn test_sign_reference_vector() -> Result<()> {
        let signer = RequestSigner::new().with_time(fixed_time());
        let signed = signer.sign_request(metrics_request()?, &Credential::new("AKID", "SECRET"))?;

        assert_eq!(signed.header("x-sdk-date"), Some("20221017T083000Z"));
        assert_eq!(
            signed.header("authorization"),
            Some("SDK-HMAC-SHA256 Access=AKID, SignedHeaders=x-sdk-date;x-stage, Signature=0a9a0fcb1a22834f14ea60f6d611b8017df5b240677c6f30983f33bdeffeed19")
        );
        assert!(signed.headers()[header::AUTHORIZATION].is_sensitive());
        assert_eq!(
            signed.uri().to_string(),
            "https://ces.example.com/V1.0/metrics?from=0&to=10"
        );
        assert_eq!(signed.headers().len(), 3);
        Ok(())
    }

    #[test]
    fn test_sign_is_idempotent_under_fixed_clock() -> Result<()> {
        let signer = RequestSigner::new().with_time(fixed_time());
        let cred = Credential::new("AKID", "SECRET");

        let first = signer.sign_request(metrics_request()?, &cred)?;
        let second = signer.sign_request(metrics_request()?, &cred)?;
        assert_eq!(first.headers(), second.headers());
        Ok(())
    }

    #[test]
    fn test_changed_header_changes_signature() -> Result<()> {
        let signer = RequestSigner::new().with_time(fixed_time());
        let cred = Credential::new("AKID", "SECRET");

        let release = signer.sign_request(metrics_request()?, &cred)?;
        let test = signer.sign_request(
            metrics_request()?.with_header("X-Stage", "TEST")?,
            &cred,
        )?;
        assert_ne!(release.header("authorization"), test.header("authorization"));
        Ok(())
    }

    #[test]
    fn test_existing_date_is_honored() -> Result<()> {
        let signer = RequestSigner::new();
        let req = metrics_request()?.with_header("X-Sdk-Date", "20221017T083000Z")?;

        let signed = signer.sign_request(req, &Credential::new("AKID", "SECRET"))?;
        assert_eq!(signed.header("x-sdk-date"), Some("20221017T083000Z"));
        let auth = signed.header("authorization").unwrap_or_default();
        assert!(auth.ends_with("0a9a0fcb1a22834f14ea60f6d611b8017df5b240677c6f30983f33bdeffeed19"));
        Ok(())
    }

    #[test]
    fn test_unparseable_date_is_replaced() -> Result<()> {
        let signer = RequestSigner::new().with_time(fixed_time());
        let req = metrics_request()?.with_header("X-Sdk-Date", "yesterday")?;

        let signed = signer.sign_request(req, &Credential::new("AKID", "SECRET"))?;
        assert_eq!(signed.header("x-sdk-date"), Some("20221017T083000Z"));
        Ok(())
    }

    #[test]
    fn test_sign_without_access_key() -> Result<()> {
        let err = RequestSigner::new()
            .sign_request(metrics_request()?, &Credential::new("", "SECRET"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
        Ok(())
    }

    #[test]
    fn test_sign_without_secret() -> Result<()> {
        let err = RequestSigner::new()
            .sign_request(metrics_request()?, &Credential::new("AKID", ""))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
        Ok(())
    }

    #[test]
    fn test_query_is_sent_verbatim() -> Result<()> {
        let signer = RequestSigner::new().with_time(fixed_time());
        let cred = Credential::new("AKID", "SECRET");
        let req = OutboundRequest::new(
            "GET",
            "https://ces.example.com/V1.0/metrics?to=10&from=0",
        )?
        .with_header("X-Stage", "RELEASE")?;

        let signed = signer.sign_request(req, &cred)?;
        assert_eq!(
            signed.uri().to_string(),
            "https://ces.example.com/V1.0/metrics?to=10&from=0"
        );

        // Canonical form sorts the pairs, so the signature is the sorted one.
        let sorted = signer.sign_request(metrics_request()?, &cred)?;
        assert_eq!(signed.header("authorization"), sorted.header("authorization"));
        Ok(())
    }

    #[test]
    fn test_scoped_key_derivation() -> Result<()> {
        let cred = Credential::new("AKID", "SECRET");
        let direct = RequestSigner::new()
            .with_time(fixed_time())
            .sign_request(metrics_request()?, &cred)?;
        let scoped = RequestSigner::new()
            .with_key_derivation(KeyDerivation::Scoped {
                region: "ru-moscow-1".to_string(),
                service: "ces".to_string(),
            })
            .with_time(fixed_time())
            .sign_request(metrics_request()?, &cred)?;

        let scoped_auth = scoped.header("authorization").unwrap_or_default();
        assert!(scoped_auth.starts_with(
            "SDK-HMAC-SHA256 Access=AKID, SignedHeaders=x-sdk-date;x-stage, Signature="
        ));
        assert_ne!(direct.header("authorization"), Some(scoped_auth));
        assert_eq!(scoped.uri(), direct.uri());
        Ok(())
    }

    #[test]
    fn test_access_key_not_header_safe() -> Result<()> {
        let err = RequestSigner::new()
            .sign_request(metrics_request()?, &Credential::new("AK\nID", "SECRET"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        Ok(())
    }
}
