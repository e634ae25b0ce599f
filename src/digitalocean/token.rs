/// Static bearer credential for the DigitalOcean API
use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::{Error, Result};

/// Token handed out by a [`TokenSource`]
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: &'static str,
}

impl Token {
    /// Value for the `Authorization` header
    pub fn authorization(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("{} {}", self.token_type, self.access_token))
            .map_err(|_| Error::InvalidToken)?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Holds a single API key; no refresh and no expiry
#[derive(Clone)]
pub struct TokenSource {
    access_token: String,
}

impl TokenSource {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn token(&self) -> Token {
        Token {
            access_token: self.access_token.clone(),
            token_type: "Bearer",
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource").finish_non_exhaustive()
    }
}
