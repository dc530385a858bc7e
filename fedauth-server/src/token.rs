//! Create and decode JSON Web Tokens.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use time::OffsetDateTime;

use fedauth_types::{AccessTokenClaims, ClientClaim, Scope, ScopeError, Service};

use crate::config::AuthConfig;
use crate::key_manager::KeyManager;

pub const ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("signature verification failed")]
    Signature,

    #[error("token has expired")]
    Expired,

    #[error("invalid \"iss\" claim")]
    InvalidIssuer,

    #[error("invalid \"aud\" claim")]
    InvalidAudience,

    #[error("\"{0}\" claim is required")]
    MissingClaim(String),

    #[error("invalid scope in token: {0}")]
    Scope(#[from] ScopeError),

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            ErrorKind::InvalidSignature => TokenError::Signature,
            ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim.clone()),
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// A verified token: the claims as signed, plus the embedded scope
/// re-parsed into its structured form.
#[derive(Clone, Debug)]
pub struct DecodedToken {
    pub claims: AccessTokenClaims,
    pub scope: Scope,
}

/// Signs and verifies access tokens (RFC 7523) with the configured RS256
/// key pair and issuer/audience.
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    audience: String,
    expiry_minutes: i64,
    keys: Arc<KeyManager>,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig, keys: Arc<KeyManager>) -> Self {
        let base = base_uri(&config.url_auth);
        TokenCodec {
            issuer: format!("{base}/token"),
            audience: format!("{base}/verify"),
            expiry_minutes: config.token_expiry,
            keys,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Sign a token for the client over an already-validated scope.
    /// Returns the compact JWT and its expiry as epoch seconds.
    ///
    /// When `delegate_id` is given the token speaks for that delegate: it
    /// becomes the `sub` claim and the `delegate` flag is set.
    pub fn encode(
        &self,
        client: &Service,
        scope: &str,
        grant_type: &str,
        delegate_id: Option<&str>,
    ) -> Result<(String, i64), TokenError> {
        let (subject, delegate) = match delegate_id {
            Some(id) => (id.to_string(), true),
            None => (client.id.clone(), false),
        };
        let expiry = OffsetDateTime::now_utc().unix_timestamp() + self.expiry_minutes * 60;

        let claims = AccessTokenClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: subject,
            exp: expiry,
            client: ClientClaim::from(client),
            scope: scope.to_string(),
            grant_type: grant_type.to_string(),
            delegate,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.keys.encoding_key())?;
        Ok((token, expiry))
    }

    /// Verify a token's signature, issuer, audience and expiry, and
    /// re-parse the scope it carries.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = decode::<AccessTokenClaims>(token, &self.keys.decoding_key(), &validation)?;
        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(TokenError::MissingClaim("sub".to_string()));
        }

        let scope = claims.scope.parse::<Scope>()?;
        Ok(DecodedToken { claims, scope })
    }
}

/// The issuer/audience base: `netloc + path` of the configured auth URL,
/// without any trailing `/`.
fn base_uri(url_auth: &str) -> String {
    match url::Url::parse(url_auth) {
        Ok(parsed) => format!("{}{}", parsed.authority(), parsed.path())
            .trim_end_matches('/')
            .to_string(),
        Err(_) => url_auth.trim_end_matches('/').to_string(),
    }
}
