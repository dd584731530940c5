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

//! Gateway configuration loaded from env.

use std::net::SocketAddr;
use std::time::Duration;

use cesgate_core::{Context, Error, Result};

/// Env value for the listen address.
pub const CESGATE_LISTEN_ADDR: &str = "CESGATE_LISTEN_ADDR";
/// Env value for the identity service base url.
pub const CESGATE_IAM_ENDPOINT: &str = "CESGATE_IAM_ENDPOINT";
/// Env value for the monitoring API base url.
pub const CESGATE_CES_ENDPOINT: &str = "CESGATE_CES_ENDPOINT";
/// Env value for the `x-stage` header sent upstream.
pub const CESGATE_STAGE: &str = "CESGATE_STAGE";
/// Env value for the read timeout in seconds.
pub const CESGATE_READ_TIMEOUT_SECS: &str = "CESGATE_READ_TIMEOUT_SECS";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:80";
const DEFAULT_IAM_ENDPOINT: &str = "https://iam.ru-moscow-1.hc.sbercloud.ru/v3";
const DEFAULT_CES_ENDPOINT: &str = "https://ces.ru-moscow-1.hc.sbercloud.ru/V1.0";
const DEFAULT_STAGE: &str = "RELEASE";
const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

/// Config carries everything the gateway needs besides the signing keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Identity service base, `/auth/tokens` is appended.
    pub iam_endpoint: String,
    /// Monitoring API base, the proxied suffix is appended.
    pub ces_endpoint: String,
    /// Value of the `x-stage` header.
    pub stage: String,
    /// Budget for producing a response head.
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            ces_endpoint: DEFAULT_CES_ENDPOINT.to_string(),
            stage: DEFAULT_STAGE.to_string(),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load config from env, falling back to defaults for unset values.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let var = |key: &str| ctx.env_var(key).filter(|v| !v.trim().is_empty());

        let listen_addr = var(CESGATE_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        let listen_addr = listen_addr.parse().map_err(|e| {
            Error::config_invalid(format!("invalid {CESGATE_LISTEN_ADDR}: {listen_addr}"))
                .with_source(e)
        })?;

        let read_timeout = match var(CESGATE_READ_TIMEOUT_SECS) {
            None => Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            Some(v) => match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::config_invalid(format!(
                        "invalid {CESGATE_READ_TIMEOUT_SECS}: {v}"
                    )))
                }
            },
        };

        Ok(Self {
            listen_addr,
            iam_endpoint: endpoint(var(CESGATE_IAM_ENDPOINT), DEFAULT_IAM_ENDPOINT)?,
            ces_endpoint: endpoint(var(CESGATE_CES_ENDPOINT), DEFAULT_CES_ENDPOINT)?,
            stage: var(CESGATE_STAGE).unwrap_or_else(|| DEFAULT_STAGE.into()),
            read_timeout,
        })
    }
}

/// Endpoints are stored without trailing `/` so suffixes can be appended.
fn endpoint(value: Option<String>, default: &str) -> Result<String> {
    let value = value.unwrap_or_else(|| default.to_string());
    let value = value.trim().trim_end_matches('/');

    let uri: http::Uri = value.parse().map_err(|e| {
        Error::config_invalid(format!("invalid endpoint: {value}")).with_source(e)
    })?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(Error::config_invalid(format!(
            "endpoint must be an absolute url: {value}"
        )));
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cesgate_core::{ErrorKind, StaticEnv};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() -> Result<()> {
        let cfg = Config::from_env(&Context::new().with_env(StaticEnv::default()))?;
        assert_eq!(cfg, Config::default());
        Ok(())
    }

    #[test]
    fn test_from_env() -> Result<()> {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (CESGATE_LISTEN_ADDR, "127.0.0.1:8080"),
            (CESGATE_IAM_ENDPOINT, "http://127.0.0.1:9000/v3/"),
            (CESGATE_CES_ENDPOINT, "http://127.0.0.1:9001/V1.0"),
            (CESGATE_STAGE, "TEST"),
            (CESGATE_READ_TIMEOUT_SECS, "3"),
        ]));

        let cfg = Config::from_env(&ctx)?;
        assert_eq!(cfg.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.iam_endpoint, "http://127.0.0.1:9000/v3");
        assert_eq!(cfg.ces_endpoint, "http://127.0.0.1:9001/V1.0");
        assert_eq!(cfg.stage, "TEST");
        assert_eq!(cfg.read_timeout, Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            (CESGATE_LISTEN_ADDR, "localhost"),
            (CESGATE_READ_TIMEOUT_SECS, "0"),
            (CESGATE_READ_TIMEOUT_SECS, "ten"),
            (CESGATE_CES_ENDPOINT, "/V1.0"),
        ] {
            let ctx = Context::new().with_env(StaticEnv::from_pairs([(key, value)]));
            let err = Config::from_env(&ctx).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "{key}={value}");
        }
    }
}
