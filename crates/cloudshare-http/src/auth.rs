// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! `cs_sha1` request signing.
//!
//! Every request carries an `Authorization` header of the form
//!
//! ```text
//! cs_sha1 userapiid:<id>;timestamp:<unix secs>;token:<nonce>;hmac:<digest>
//! ```
//!
//! where `digest = hex(sha1(api_key + url + timestamp + token))` and `url` is the
//! exact URL sent on the wire, query string included.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::{Digest, Sha1};

/// Scheme name placed in front of the authorization parameters.
pub const AUTH_SCHEME: &str = "cs_sha1";

const TOKEN_LEN: usize = 10;

/// Produces `Authorization` header values for one API identity.
#[derive(Clone)]
pub struct RequestSigner {
    api_id: String,
    api_key: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_id", &self.api_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(api_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    /// Header value for `url`, using the current time and a fresh nonce.
    pub fn authorization(&self, url: &str) -> String {
        let timestamp = Utc::now().timestamp().to_string();
        self.authorization_with(url, &timestamp, &random_token())
    }

    /// Header value for `url` with an explicit timestamp and nonce.
    pub fn authorization_with(&self, url: &str, timestamp: &str, token: &str) -> String {
        format!(
            "{} {}",
            AUTH_SCHEME,
            self.parameters(url, timestamp, token)
        )
    }

    fn parameters(&self, url: &str, timestamp: &str, token: &str) -> String {
        let hmac = sha1_hex(&format!("{}{}{}{}", self.api_key, url, timestamp, token));
        format!(
            "userapiid:{};timestamp:{};token:{};hmac:{}",
            self.api_id, timestamp, token, hmac
        )
    }
}

fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn sha1_hex(input: &str) -> String {
    Sha1::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex_known_vector() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_authorization_layout() {
        let signer = RequestSigner::new("ID1", "KEY1");
        let header = signer.authorization_with("https://h/api/v3/envs", "1700000000", "abcdefghij");

        assert!(
            header.starts_with("cs_sha1 userapiid:ID1;timestamp:1700000000;token:abcdefghij;hmac:")
        );
        let hmac = header.rsplit("hmac:").next().unwrap();
        assert_eq!(hmac.len(), 40);
        assert_eq!(
            hmac,
            sha1_hex("KEY1https://h/api/v3/envs1700000000abcdefghij")
        );
    }

    #[test]
    fn test_signature_depends_on_url() {
        let signer = RequestSigner::new("ID1", "KEY1");
        let a = signer.authorization_with("https://h/api/v3/envs", "1", "t");
        let b = signer.authorization_with("https://h/api/v3/envs?x=1", "1", "t");
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_token() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer = RequestSigner::new("ID1", "super-secret");
        let debug = format!("{:?}", signer);
        assert!(debug.contains("ID1"));
        assert!(!debug.contains("super-secret"));
    }
}
