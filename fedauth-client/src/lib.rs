pub mod error;
pub mod requests;
pub mod util;

pub use error::{Error, Result};

use fedauth_types::TokenResponse;
use time::OffsetDateTime;

/// A cached bearer token, reused until its expiry epoch passes. Tokens are
/// stateless, so a fresh one is only needed once the old one expires.
#[derive(Clone, Debug, Default)]
pub struct TokenCache {
    token: Option<TokenResponse>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token, if it has not expired.
    pub fn get(&self) -> Option<&str> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.token
            .as_ref()
            .filter(|token| token.expiry > now)
            .map(|token| token.access_token.as_str())
    }

    pub fn store(&mut self, token: TokenResponse) {
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}
