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

//! Huawei Cloud API Gateway `SDK-HMAC-SHA256` signing for cesgate.
//!
//! This crate signs calls to the Cloud Eye (CES) monitoring API exposed
//! behind the api gateway.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cesgate_core::{Context, OsEnv, OutboundRequest, Result, Signer};
//! use cesgate_huaweicloud_apig::{DefaultCredentialProvider, RequestSigner};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Reads SIGNER_KEY and SIGNER_SECRET.
//!     let ctx = Context::new().with_env(OsEnv);
//!     let signer = Signer::load(&ctx, DefaultCredentialProvider::new(), RequestSigner::new()).await?;
//!
//!     let req = OutboundRequest::new("GET", "https://ces.ru-moscow-1.hc.sbercloud.ru/V1.0/metrics")?
//!         .with_header("x-stage", "RELEASE")?;
//!     let signed = signer.sign(req)?;
//!     println!("{:?}", signed.header("x-sdk-date"));
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! - [`EnvCredentialProvider`]: `SIGNER_KEY` and `SIGNER_SECRET`
//! - [`StaticCredentialProvider`]: keys given in code
//! - [`DefaultCredentialProvider`]: chain of the above, env only by default

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod canonical;
pub use canonical::{CanonicalRequest, CanonicalRequestBuilder};

mod signature;
pub use signature::{KeyDerivation, SignatureComputer};

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
