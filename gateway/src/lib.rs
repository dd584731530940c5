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

//! Authenticated gateway in front of the Cloud Eye (CES) monitoring API.
//!
//! Callers present an `X-Auth-Token` that is checked against IAM. Calls under
//! `/ces` are signed with the process credential and relayed to the monitoring
//! API; `/dashboards` keeps per-user graph layouts.

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod config;
pub use config::Config;

pub mod dashboard;
pub mod forward;
pub mod identity;

mod error;
pub use error::GatewayError;

mod routes;
pub use routes::{router, AppState, UserId};
