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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used by the api gateway.
pub const X_SDK_DATE: &str = "x-sdk-date";
pub const X_SDK_CONTENT_SHA256: &str = "x-sdk-content-sha256";

/// Algorithm name carried by the string to sign and the authorization header.
pub const ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Terminator of the scoped key derivation chain.
pub const SCOPE_TERMINATOR: &str = "sdk_request";

// Env values used to load the signing credential.
pub const SIGNER_KEY: &str = "SIGNER_KEY";
pub const SIGNER_SECRET: &str = "SIGNER_SECRET";

/// AsciiSet used for path segments, query keys and query values.
///
/// Every byte is encoded except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
pub static URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
