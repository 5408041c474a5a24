//! Bearer tokens. A token is a HS256-signed claim set naming the user (`sub`)
//! and its expiry (`exp`, unix seconds).

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: i64,
}

#[derive(Debug)]
pub enum TokenError {
    Invalid(jsonwebtoken::errors::Error),
    MissingSubject,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Invalid(e) => write!(f, "invalid token: {e}"),
            TokenError::MissingSubject => write!(f, "token has no subject"),
        }
    }
}

/// Signing and verification keys, derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    inner: Arc<KeysInner>,
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], expiry: Duration) -> Self {
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                expiry,
            }),
        }
    }

    pub fn expiry(&self) -> Duration {
        self.inner.expiry
    }

    pub fn issue(
        &self,
        username: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_with_expiry(username, self.inner.expiry)
    }

    pub fn issue_with_expiry(
        &self,
        username: &str,
        expires_in: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: Some(username.to_string()),
            exp: (Utc::now() + expires_in).timestamp(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.inner.encoding,
        )
    }

    /// Checks the signature and expiry of `token` and returns the username
    /// it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expired means expired
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.inner.decoding, &validation)
            .map_err(TokenError::Invalid)?;

        data.claims.sub.ok_or(TokenError::MissingSubject)
    }
}
