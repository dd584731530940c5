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

//! Core components for signing Cloud Eye API requests.
//!
//! This crate provides the foundational types and traits shared by the
//! signing scheme and the gateway built on top of it.
//!
//! ## Overview
//!
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//! - **Requests**: [`OutboundRequest`] is editable; signing turns it into a [`SignedRequest`] which is not
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and request signing (`SignRequest`)
//! - **Signer**: Holds the process credential and the signing scheme
//!
//! ## Example
//!
//! ```
//! use cesgate_core::{OutboundRequest, Result, SignRequest, SignedRequest, Signer, SigningCredential};
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//!     secret: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty() && !self.secret.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyBuilder;
//!
//! impl SignRequest for MyBuilder {
//!     type Credential = MyCredential;
//!
//!     fn sign_request(&self, req: OutboundRequest, cred: &MyCredential) -> Result<SignedRequest> {
//!         req.with_header("x-access-key", &cred.key)?.seal()
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let cred = MyCredential { key: "access".into(), secret: "secret".into() };
//! let signer = Signer::new(cred, MyBuilder)?;
//!
//! let signed = signer.sign(OutboundRequest::new("GET", "https://example.com")?)?;
//! assert_eq!(signed.header("x-access-key"), Some("access"));
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::HttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, ProvideCredentialChain, SignRequest, SigningCredential};
mod request;
pub use request::{OutboundRequest, SignedRequest};
mod signer;
pub use signer::Signer;
