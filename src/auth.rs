//! Keycloak password-grant tokens and their expiry.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::api::ensure_success;
use crate::config::ApiConfig;
use crate::error::Result;

/// A token is refreshed once it expires within this margin.
pub const TOKEN_EXPIRATION_BUFFER: Duration = Duration::from_secs(5);

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// An access token together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct Token {
    value: String,
    expires_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_in: Duration, issued_at: Instant) -> Self {
        Token {
            value: value.into(),
            expires_at: issued_at + expires_in,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the token can still be sent at `now`, keeping the buffer.
    pub fn is_usable_at(&self, now: Instant) -> bool {
        self.expires_at > now + TOKEN_EXPIRATION_BUFFER
    }
}

/// Request a fresh token with the resource-owner password grant.
pub fn fetch_token(client: &Client, config: &ApiConfig) -> Result<Token> {
    let form = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("username", config.username.as_str()),
        ("password", config.password.as_str()),
        ("grant_type", "password"),
    ];
    let issued_at = Instant::now();
    let res = client
        .post(config.token_url())
        .header(ACCEPT, "application/json")
        .form(&form)
        .send()?;

    let data: TokenResponse = ensure_success(res, "fetching token")?.json()?;
    debug!(expires_in = data.expires_in, "token fetched");
    Ok(Token::new(
        data.access_token,
        Duration::from_secs(data.expires_in),
        issued_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usable_until_buffer() {
        let now = Instant::now();
        let token = Token::new("abc", Duration::from_secs(60), now);
        assert!(token.is_usable_at(now));
        assert!(token.is_usable_at(now + Duration::from_secs(54)));
        assert!(!token.is_usable_at(now + Duration::from_secs(55)));
        assert!(!token.is_usable_at(now + Duration::from_secs(120)));
    }

    #[test]
    fn short_lived_token_is_never_usable() {
        let now = Instant::now();
        let token = Token::new("abc", Duration::from_secs(5), now);
        assert!(!token.is_usable_at(now));
        assert_eq!(token.value(), "abc");
    }
}
