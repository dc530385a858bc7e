use crate::error::{AuthError, AuthResult};
use crate::state::AppState;
use crate::token::DecodedToken;

use super::grant::GrantRequest;

/// JWT bearer grant (RFC 7523), used to authorize a delegate.
///
/// The requesting client (the delegate) exchanges an assertion token,
/// previously minted for the grantor, for a token naming the delegate as
/// subject. The delegate then calls the protected resource on the
/// grantor's behalf.
pub struct AuthorizeDelegate {
    request: GrantRequest,
}

impl AuthorizeDelegate {
    pub const GRANT_TYPE: &'static str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

    pub fn new(request: GrantRequest) -> Self {
        AuthorizeDelegate { request }
    }

    fn validate_grant(&self) -> AuthResult<()> {
        match self.request.grant_type() {
            Some(Self::GRANT_TYPE) => Ok(()),
            other => Err(AuthError::InvalidGrantType(
                other.unwrap_or("missing grant_type").to_string(),
            )),
        }
    }

    /// The assertion: a token authorizing the requesting client to act as
    /// a delegate on the grantor's behalf.
    fn assertion(&self, state: &AppState) -> AuthResult<DecodedToken> {
        let raw = self
            .request
            .param("assertion")
            .filter(|assertion| !assertion.is_empty())
            .ok_or_else(|| {
                AuthError::BadRequest(
                    "A JSON Web Token must be included as an \"assertion\" parameter".to_string(),
                )
            })?;
        Ok(state.codec.decode(raw)?)
    }

    /// The requested scope must be exactly what the assertion entrusts to
    /// this client, addressed by its ID or by its registered URL.
    fn validate_scope(&self, assertion: &DecodedToken) -> AuthResult<()> {
        let requested = self.request.requested_scope()?;
        let id_scope = format!("delegate[{}]:{requested}", self.request.client_id());
        let url_scope = self
            .request
            .client()
            .location
            .as_ref()
            .map(|location| format!("delegate[{location}]:{requested}"));

        let granted = assertion.claims.scope.as_str();
        if granted != id_scope && url_scope.as_deref() != Some(granted) {
            return Err(AuthError::Unauthorized(
                "Requested scope does not match token".to_string(),
            ));
        }
        Ok(())
    }

    /// Mint a delegate token: the grantor stays the `client` claim, the
    /// requesting client becomes the subject.
    pub async fn generate_token(&self, state: &AppState) -> AuthResult<(String, i64)> {
        self.validate_grant()?;

        let assertion = self.assertion(state)?;
        self.validate_scope(&assertion)?;

        // Delegation always requires the grantor to hold write access on
        // the delegate.
        let grantor_id = &assertion.claims.client.id;
        let grantor = state.directory.service(grantor_id).await.map_err(|err| {
            AuthError::or_not_found(
                err,
                AuthError::Unauthorized(format!("Unknown client '{grantor_id}'")),
            )
        })?;
        if !grantor.authorized("w", self.request.client()) {
            return Err(AuthError::Unauthorized(format!(
                "Client \"{grantor_id}\" may not delegate to service \"{}\"",
                self.request.client_id()
            )));
        }

        let scope = self.request.requested_scope()?;
        Ok(state.codec.encode(
            &grantor,
            scope.as_str(),
            Self::GRANT_TYPE,
            Some(self.request.client_id()),
        )?)
    }

    /// Verify a delegate token: the scope must cover the requested access,
    /// and both the delegate and the grantor must still hold the
    /// permission in the directory.
    pub async fn verify_access(&self, state: &AppState, token: &DecodedToken) -> AuthResult<()> {
        self.request.verify_scope(&token.scope)?;

        let delegate_id = &token.claims.sub;
        let delegate = state.directory.service(delegate_id).await.map_err(|err| {
            AuthError::or_not_found(
                err,
                AuthError::Unauthorized(format!("Unknown delegate '{delegate_id}'")),
            )
        })?;

        let client_id = &token.claims.client.id;
        let client = state.directory.service(client_id).await.map_err(|err| {
            AuthError::or_not_found(
                err,
                AuthError::Unauthorized(format!("Unknown client '{client_id}'")),
            )
        })?;

        tokio::try_join!(
            self.request.verify_access_service(state, &delegate),
            self.request.verify_access_service(state, &client),
            self.request.verify_access_hosted_resource(state, &client),
        )?;
        Ok(())
    }
}
