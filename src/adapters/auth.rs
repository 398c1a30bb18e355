//! Bearer-token gate for mutating endpoints.
//!
//! A single shared secret.  When no secret is configured the gate is
//! **disabled** and every request passes; this is the development
//! posture and is reported at startup.
//!
//! The secret is never stored in the clear: the gate keeps
//! `HMAC-SHA256(token, key)` and verifies presented tokens through
//! `hmac_sha256::HMAC::verify`, which compares in constant time and
//! independently of token length.

use thiserror::Error;

/// Fixed key domain-separating token digests.
const TOKEN_KEY: &[u8] = b"sprinkler/bearer-token/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authentication required. Provide API token in Authorization header.")]
    Missing,
    #[error("Invalid API token")]
    Invalid,
}

#[derive(Clone)]
pub struct BearerAuth {
    expected: Option<[u8; 32]>,
}

impl BearerAuth {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            expected: token.map(|t| hmac_sha256::HMAC::mac(t.as_bytes(), TOKEN_KEY)),
        }
    }

    /// Open gate: every request is accepted.
    pub fn disabled() -> Self {
        Self { expected: None }
    }

    pub fn enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Check a raw `Authorization` header value.
    pub fn check(&self, authorization: Option<&str>) -> Result<(), AuthError> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };
        let token = authorization
            .and_then(bearer_credentials)
            .ok_or(AuthError::Missing)?;
        if hmac_sha256::HMAC::verify(token.as_bytes(), TOKEN_KEY, expected) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

impl core::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("enabled", &self.enabled())
            .finish()
    }
}

/// Credentials of a `Bearer` authorization header (scheme is case-insensitive).
fn bearer_credentials(header: &str) -> Option<&str> {
    let (scheme, credentials) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credentials = credentials.trim();
    (!credentials.is_empty()).then_some(credentials)
}
