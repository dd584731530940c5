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

use std::fmt::{Debug, Formatter};

use crate::constants::*;
use crate::Credential;
use cesgate_core::{utils::Redact, Context};

/// Config carries the signing keys for the api gateway.
#[derive(Clone, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`SIGNER_KEY`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`SIGNER_SECRET`]
    pub secret_access_key: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .finish()
    }
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set access_key_id
    pub fn with_access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Set secret_access_key
    pub fn with_secret_access_key(mut self, secret_access_key: impl Into<String>) -> Self {
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Fill the unset fields from env.
    ///
    /// Empty env values are treated as absent.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();
        let non_empty = |key: &str| envs.get(key).filter(|v| !v.is_empty()).cloned();

        if self.access_key_id.is_none() {
            self.access_key_id = non_empty(SIGNER_KEY);
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = non_empty(SIGNER_SECRET);
        }

        self
    }

    /// Build a credential if both keys are present.
    pub fn credential(&self) -> Option<Credential> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(ak), Some(sk)) => Some(Credential::new(ak, sk)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::StaticEnv;

    #[test]
    fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (SIGNER_KEY, "AKID"),
            (SIGNER_SECRET, "SECRET"),
        ]));

        let cfg = Config::new().from_env(&ctx);
        assert_eq!(cfg.access_key_id.as_deref(), Some("AKID"));
        assert_eq!(cfg.secret_access_key.as_deref(), Some("SECRET"));

        let cred = cfg.credential().expect("credential must be present");
        assert_eq!(cred.access_key_id, "AKID");
    }

    #[test]
    fn test_explicit_value_wins_over_env() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (SIGNER_KEY, "AKID"),
            (SIGNER_SECRET, "SECRET"),
        ]));

        let cfg = Config::new().with_access_key_id("OTHER").from_env(&ctx);
        assert_eq!(cfg.access_key_id.as_deref(), Some("OTHER"));
        assert_eq!(cfg.secret_access_key.as_deref(), Some("SECRET"));
    }

    #[test]
    fn test_empty_env_is_absent() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (SIGNER_KEY, "AKID"),
            (SIGNER_SECRET, ""),
        ]));

        let cfg = Config::new().from_env(&ctx);
        assert!(cfg.secret_access_key.is_none());
        assert!(cfg.credential().is_none());
    }
}
