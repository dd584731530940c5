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

use std::fmt::Write;

use cesgate_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use cesgate_core::time::{format_date, format_iso8601, DateTime};
use cesgate_core::{Error, Result};
use log::debug;

use crate::constants::{ALGORITHM, SCOPE_TERMINATOR};
use crate::Credential;

/// KeyDerivation decides which key signs the string to sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyDerivation {
    /// Sign with the secret access key itself.
    ///
    /// This is what the gateway verifies for `SDK-HMAC-SHA256`.
    #[default]
    Direct,
    /// Derive the key through `date -> region -> service -> sdk_request`
    /// and add the matching scope line to the string to sign.
    Scoped {
        /// Region part of the scope, e.g. `ru-moscow-1`.
        region: String,
        /// Service part of the scope, e.g. `ces`.
        service: String,
    },
}

impl KeyDerivation {
    fn scope(&self, time: DateTime) -> Option<String> {
        match self {
            KeyDerivation::Direct => None,
            KeyDerivation::Scoped { region, service } => Some(format!(
                "{}/{region}/{service}/{SCOPE_TERMINATOR}",
                format_date(time)
            )),
        }
    }

    fn signing_key(&self, secret: &str, time: DateTime) -> Vec<u8> {
        match self {
            KeyDerivation::Direct => secret.as_bytes().to_vec(),
            KeyDerivation::Scoped { region, service } => {
                let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
                let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
                let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
                hmac_sha256(sign_service.as_slice(), SCOPE_TERMINATOR.as_bytes())
            }
        }
    }
}

/// SignatureComputer derives the hex signature of a canonical request.
#[derive(Debug, Clone, Default)]
pub struct SignatureComputer {
    derivation: KeyDerivation,
}

impl SignatureComputer {
    /// Create a computer using given key derivation.
    pub fn new(derivation: KeyDerivation) -> Self {
        Self { derivation }
    }

    /// The key derivation in use.
    pub fn key_derivation(&self) -> &KeyDerivation {
        &self.derivation
    }

    /// Build the string to sign.
    ///
    /// ```text
    /// SDK-HMAC-SHA256
    /// 20221017T083000Z
    /// [20221017/<region>/<service>/sdk_request]
    /// <hex sha256 of canonical request>
    /// ```
    pub fn string_to_sign(&self, canonical_request: &str, time: DateTime) -> Result<String> {
        let mut f = String::new();
        writeln!(f, "{ALGORITHM}")?;
        writeln!(f, "{}", format_iso8601(time))?;
        if let Some(scope) = self.derivation.scope(time) {
            writeln!(f, "{scope}")?;
        }
        write!(f, "{}", hex_sha256(canonical_request.as_bytes()))?;
        Ok(f)
    }

    /// Compute the lower-case hex signature.
    ///
    /// Fails with [`cesgate_core::ErrorKind::CredentialMissing`] if the secret is empty.
    pub fn compute(
        &self,
        cred: &Credential,
        canonical_request: &str,
        time: DateTime,
    ) -> Result<String> {
        if cred.secret_access_key.is_empty() {
            return Err(Error::credential_missing("secret access key is empty"));
        }

        let string_to_sign = self.string_to_sign(canonical_request, time)?;
        debug!("calculated string to sign: {string_to_sign}");

        let key = self.derivation.signing_key(&cred.secret_access_key, time);
        Ok(hex_hmac_sha256(&key, string_to_sign.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::hash::EMPTY_SHA256;
    use cesgate_core::time::parse_iso8601;
    use cesgate_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn fixed_time() -> DateTime {
        parse_iso8601("20221017T083000Z").unwrap()
    }

    fn canonical_request() -> String {
        "GET\n/V1.0/metrics/\nfrom=0&to=10\nx-sdk-date:20221017T083000Z\nx-stage:RELEASE\n\nx-sdk-date;x-stage\n"
            .to_string()
            + EMPTY_SHA256
    }

    #[test]
    fn test_string_to_sign() -> Result<()> {
        let sts =
            SignatureComputer::default().string_to_sign(&canonical_request(), fixed_time())?;
        assert_eq!(
            sts,
            "SDK-HMAC-SHA256\n20221017T083000Z\n15f743fa3a50b270343276bb42efc7bab3d34c758a7514ba07999b8f35417cde"
        );
        Ok(())
    }

    #[test]
    fn test_compute_reference_vector() -> Result<()> {
        let sig = SignatureComputer::default().compute(
            &Credential::new("AKID", "SECRET"),
            &canonical_request(),
            fixed_time(),
        )?;
        assert_eq!(
            sig,
            "0a9a0fcb1a22834f14ea60f6d611b8017df5b240677c6f30983f33bdeffeed19"
        );
        Ok(())
    }

    #[test]
    fn test_compute_empty_secret() {
        let err = SignatureComputer::default()
            .compute(
                &Credential::new("AKID", ""),
                &canonical_request(),
                fixed_time(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
    }

    #[test]
    fn test_scoped_derivation() -> Result<()> {
        let computer = SignatureComputer::new(KeyDerivation::Scoped {
            region: "ru-moscow-1".to_string(),
            service: "ces".to_string(),
        });

        let sts = computer.string_to_sign(&canonical_request(), fixed_time())?;
        assert_eq!(sts.lines().nth(2), Some("20221017/ru-moscow-1/ces/sdk_request"));

        let cred = Credential::new("AKID", "SECRET");
        let scoped = computer.compute(&cred, &canonical_request(), fixed_time())?;
        let again = computer.compute(&cred, &canonical_request(), fixed_time())?;
        let direct =
            SignatureComputer::default().compute(&cred, &canonical_request(), fixed_time())?;

        assert_eq!(scoped, again);
        assert_eq!(scoped.len(), 64);
        assert_ne!(scoped, direct);
        Ok(())
    }
}
