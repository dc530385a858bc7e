use std::collections::HashMap;

use fedauth_types::{Scope, Service};

use crate::directory::DirectoryError;
use crate::error::{AuthError, AuthResult};
use crate::state::AppState;

/// Form parameters of an authorization request. Form bodies may repeat a
/// field; values are kept in arrival order.
#[derive(Clone, Debug, Default)]
pub struct FormParams(HashMap<String, Vec<String>>);

impl FormParams {
    pub fn from_body(body: &[u8]) -> Self {
        let mut params: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        FormParams(params)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

/// An authenticated authorization request: the client that passed Basic
/// auth plus the form body of a `/token` or `/verify` call. Carries the
/// parameter extraction and verification steps shared by every grant.
pub struct GrantRequest {
    client_id: String,
    client: Service,
    params: FormParams,
    default_scope: String,
}

impl GrantRequest {
    pub fn new(
        client_id: String,
        client: Service,
        params: FormParams,
        default_scope: String,
    ) -> Self {
        GrantRequest {
            client_id,
            client,
            params,
            default_scope,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client(&self) -> &Service {
        &self.client
    }

    pub fn grant_type(&self) -> Option<&str> {
        self.params.first("grant_type")
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.first(key)
    }

    /// The scope requested when generating a token, falling back to the
    /// configured default when the client names none.
    pub fn requested_scope(&self) -> AuthResult<Scope> {
        let raw = self.params.first("scope").unwrap_or(&self.default_scope);
        Ok(raw.parse()?)
    }

    /// The access the client asks about, e.g. `r`, `w` or `rw`.
    pub fn requested_access(&self) -> AuthResult<&str> {
        self.params
            .first("requested_access")
            .filter(|access| !access.is_empty())
            .ok_or_else(|| AuthError::BadRequest("Missing requested_access argument".to_string()))
    }

    /// The protected resource when it is hosted by another service, e.g. a
    /// repository held in a repository service. `None` when the request is
    /// about the client itself.
    pub fn hosted_resource(&self) -> AuthResult<Option<&str>> {
        let values = self.params.all("resource_id");
        if values.len() > 1 {
            return Err(AuthError::BadRequest(
                "Multiple resource_id values are not supported".to_string(),
            ));
        }
        Ok(values
            .first()
            .map(String::as_str)
            .filter(|resource_id| *resource_id != self.client_id))
    }

    /// Verify the requested access is permitted by a token's scope. A
    /// request about the client itself matches by client ID or by its
    /// registered URL.
    pub fn verify_scope(&self, scope: &Scope) -> AuthResult<()> {
        let access = self.requested_access()?;
        let (within_scope, resource_id) = match self.hosted_resource()? {
            Some(resource_id) => (scope.within_scope(access, resource_id), resource_id),
            None => {
                let id_in_scope = scope.within_scope(access, &self.client_id);
                let url_in_scope = self
                    .client
                    .location
                    .as_deref()
                    .is_some_and(|location| scope.within_scope(access, location));
                (id_in_scope || url_in_scope, self.client_id.as_str())
            }
        };

        if !within_scope {
            return Err(AuthError::Unauthorized(format!(
                "'{access}' access to '{resource_id}' not permitted by token"
            )));
        }
        Ok(())
    }

    /// Verify access to a resource hosted on the requesting service.
    /// Hosted resources are assumed to be repositories.
    pub async fn verify_access_hosted_resource(
        &self,
        state: &AppState,
        principal: &Service,
    ) -> AuthResult<()> {
        let Some(resource_id) = self.hosted_resource()? else {
            return Ok(());
        };
        let access = self.requested_access()?;

        let repository = match state.directory.repository(resource_id).await {
            Ok(repository) => repository,
            Err(DirectoryError::NotFound) => {
                return Err(AuthError::Unauthorized(format!(
                    "Unknown repository '{resource_id}'"
                )));
            }
            Err(err) => return Err(AuthError::Directory(err.to_string())),
        };

        if self.client_id != repository.service_id {
            return Err(AuthError::Unauthorized(format!(
                "'{}' does not host repository '{resource_id}'",
                self.client_id
            )));
        }

        if !principal.authorized(access, &repository) {
            return Err(AuthError::Unauthorized(format!(
                "'{}' does not have '{access}' access to repository '{resource_id}'",
                principal.id
            )));
        }
        Ok(())
    }

    /// Verify the token's client or delegate has access to the service
    /// receiving the request.
    pub async fn verify_access_service(
        &self,
        state: &AppState,
        principal: &Service,
    ) -> AuthResult<()> {
        let access = self.requested_access()?;

        let service = match state.directory.service(&self.client_id).await {
            Ok(service) => service,
            Err(DirectoryError::NotFound) => {
                return Err(AuthError::Unauthorized(format!(
                    "Unknown service '{}'",
                    self.client_id
                )));
            }
            Err(err) => return Err(AuthError::Directory(err.to_string())),
        };

        if !principal.authorized(access, &service) {
            return Err(AuthError::Unauthorized(format!(
                "'{}' does not have '{access}' access to service '{}'",
                principal.id, self.client_id
            )));
        }
        Ok(())
    }
}
