use crate::error::{AuthError, AuthResult};
use crate::state::AppState;
use crate::token::DecodedToken;

use super::grant::GrantRequest;
use super::scope_validation::validate_scope;

/// OAuth2 client credentials grant (RFC 6749): a client requesting a token
/// to act for itself.
pub struct ClientCredentials {
    request: GrantRequest,
}

impl ClientCredentials {
    pub const GRANT_TYPE: &'static str = "client_credentials";

    pub fn new(request: GrantRequest) -> Self {
        ClientCredentials { request }
    }

    fn validate_grant(&self) -> AuthResult<()> {
        match self.request.grant_type() {
            Some(Self::GRANT_TYPE) => Ok(()),
            other => Err(AuthError::InvalidGrantType(
                other.unwrap_or("missing grant_type").to_string(),
            )),
        }
    }

    /// Verify the client is authorized for the requested scope and mint a
    /// token with the client itself as subject.
    pub async fn generate_token(&self, state: &AppState) -> AuthResult<(String, i64)> {
        self.validate_grant()?;

        let scope = self.request.requested_scope()?;
        validate_scope(state.directory.as_ref(), &scope, self.request.client()).await?;

        Ok(state
            .codec
            .encode(self.request.client(), scope.as_str(), Self::GRANT_TYPE, None)?)
    }

    /// Verify a token grants the requested access: the scope must cover it
    /// and the token's client must still hold the permission in the
    /// directory.
    pub async fn verify_access(&self, state: &AppState, token: &DecodedToken) -> AuthResult<()> {
        let client_id = &token.claims.client.id;
        let client = state.directory.service(client_id).await.map_err(|err| {
            AuthError::or_not_found(
                err,
                AuthError::Unauthorized(format!("Unknown client '{client_id}'")),
            )
        })?;

        self.request.verify_scope(&token.scope)?;
        tokio::try_join!(
            self.request.verify_access_service(state, &client),
            self.request.verify_access_hosted_resource(state, &client),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{grant_request, state_with_directory, test_directory};

    #[tokio::test]
    async fn generates_a_token_for_a_valid_scope() {
        let state = state_with_directory(test_directory());
        let grant = ClientCredentials::new(grant_request(&[
            ("grant_type", ClientCredentials::GRANT_TYPE),
            ("scope", "write[r1]"),
        ]));

        let (token, expiry) = grant.generate_token(&state).await.expect("token issued");
        let decoded = state.codec.decode(&token).expect("decodes");

        assert_eq!(decoded.claims.sub, "c1");
        assert!(!decoded.claims.delegate);
        assert_eq!(decoded.claims.scope, "write[r1]");
        assert_eq!(decoded.claims.grant_type, ClientCredentials::GRANT_TYPE);
        assert_eq!(decoded.claims.exp, expiry);
    }

    #[tokio::test]
    async fn refuses_a_mismatched_grant_type() {
        let state = state_with_directory(test_directory());
        let grant = ClientCredentials::new(grant_request(&[("grant_type", "password")]));

        assert!(matches!(
            grant.generate_token(&state).await,
            Err(AuthError::InvalidGrantType(_))
        ));
    }

    #[tokio::test]
    async fn refuses_a_malformed_scope() {
        let state = state_with_directory(test_directory());
        let grant = ClientCredentials::new(grant_request(&[
            ("grant_type", ClientCredentials::GRANT_TYPE),
            ("scope", "write"),
        ]));

        assert!(matches!(
            grant.generate_token(&state).await,
            Err(AuthError::InvalidScope(_))
        ));
    }

    #[tokio::test]
    async fn verifies_access_for_an_issued_token() {
        let state = state_with_directory(test_directory());
        let issue = ClientCredentials::new(grant_request(&[
            ("grant_type", ClientCredentials::GRANT_TYPE),
            ("scope", "read"),
        ]));
        let (token, _) = issue.generate_token(&state).await.expect("token issued");
        let decoded = state.codec.decode(&token).expect("decodes");

        let verify = ClientCredentials::new(grant_request(&[("requested_access", "r")]));
        verify
            .verify_access(&state, &decoded)
            .await
            .expect("access granted");
    }

    #[tokio::test]
    async fn verification_needs_the_requested_access() {
        let state = state_with_directory(test_directory());
        let issue = ClientCredentials::new(grant_request(&[
            ("grant_type", ClientCredentials::GRANT_TYPE),
            ("scope", "read"),
        ]));
        let (token, _) = issue.generate_token(&state).await.expect("token issued");
        let decoded = state.codec.decode(&token).expect("decodes");

        let verify = ClientCredentials::new(grant_request(&[]));
        assert!(matches!(
            verify.verify_access(&state, &decoded).await,
            Err(AuthError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn write_access_is_not_covered_by_read_scope() {
        let state = state_with_directory(test_directory());
        let issue = ClientCredentials::new(grant_request(&[
            ("grant_type", ClientCredentials::GRANT_TYPE),
            ("scope", "read"),
        ]));
        let (token, _) = issue.generate_token(&state).await.expect("token issued");
        let decoded = state.codec.decode(&token).expect("decodes");

        let verify = ClientCredentials::new(grant_request(&[("requested_access", "w")]));
        assert!(matches!(
            verify.verify_access(&state, &decoded).await,
            Err(AuthError::Unauthorized(_))
        ));
    }
}
