//! OAuth2 grant machinery: the grant registry plus the client credentials
//! grant (RFC 6749) and the JWT-bearer delegation grant (RFC 7523).

mod client_credentials;
mod grant;
mod jwt_bearer;
mod scope_validation;

pub use client_credentials::ClientCredentials;
pub use grant::{FormParams, GrantRequest};
pub use jwt_bearer::AuthorizeDelegate;
pub use scope_validation::validate_scope;

use crate::error::{AuthError, AuthResult};
use crate::state::AppState;
use crate::token::DecodedToken;

/// Registered grant types, keyed by the `grant_type` value carried in
/// requests and tokens.
const REGISTRY: &[(&str, fn(GrantRequest) -> Grant)] = &[
    (ClientCredentials::GRANT_TYPE, |request| {
        Grant::ClientCredentials(ClientCredentials::new(request))
    }),
    (AuthorizeDelegate::GRANT_TYPE, |request| {
        Grant::AuthorizeDelegate(AuthorizeDelegate::new(request))
    }),
];

pub enum Grant {
    ClientCredentials(ClientCredentials),
    AuthorizeDelegate(AuthorizeDelegate),
}

impl Grant {
    /// Select a grant from the request's `grant_type` parameter.
    pub fn for_request(request: GrantRequest) -> AuthResult<Self> {
        let key = request
            .grant_type()
            .ok_or_else(|| AuthError::InvalidGrantType("missing grant_type".to_string()))?
            .to_string();
        Self::for_grant_type(&key, request)
    }

    /// Select a grant from a decoded token's embedded `grant_type` claim.
    pub fn for_token(decoded: &DecodedToken, request: GrantRequest) -> AuthResult<Self> {
        Self::for_grant_type(&decoded.claims.grant_type, request)
    }

    fn for_grant_type(key: &str, request: GrantRequest) -> AuthResult<Self> {
        REGISTRY
            .iter()
            .find(|(grant_type, _)| *grant_type == key)
            .map(|(_, build)| build(request))
            .ok_or_else(|| AuthError::InvalidGrantType(key.to_string()))
    }

    /// Validate the request and mint a token; returns the compact JWT and
    /// its expiry epoch.
    pub async fn generate_token(&self, state: &AppState) -> AuthResult<(String, i64)> {
        match self {
            Grant::ClientCredentials(grant) => grant.generate_token(state).await,
            Grant::AuthorizeDelegate(grant) => grant.generate_token(state).await,
        }
    }

    /// Check a decoded token grants the access this request asks about.
    pub async fn verify_access(&self, state: &AppState, token: &DecodedToken) -> AuthResult<()> {
        match self {
            Grant::ClientCredentials(grant) => grant.verify_access(state, token).await,
            Grant::AuthorizeDelegate(grant) => grant.verify_access(state, token).await,
        }
    }
}
