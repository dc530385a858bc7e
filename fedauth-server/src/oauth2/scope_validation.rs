//! Directory validation of a requested scope, run when a token is issued.
//!
//! Every resource and delegate the scope names must exist in the directory,
//! and the client must hold the access the scope asks for. Resources and
//! delegates are checked in parallel, as are ID-keyed and URL-keyed
//! entries within each; the first failure aborts the rest.

use std::collections::HashMap;

use fedauth_types::{AccessSet, Entity, Scope, Service, concatenate_access};

use crate::directory::{Directory, DirectoryError};
use crate::error::{AuthError, AuthResult};

/// Which scope map a group of keys came from. Delegates carry one extra
/// constraint: only services can be delegates.
#[derive(Clone, Copy, PartialEq, Eq)]
enum KeyRole {
    Resource,
    Delegate,
}

pub async fn validate_scope(
    directory: &dyn Directory,
    scope: &Scope,
    client: &Service,
) -> AuthResult<()> {
    tokio::try_join!(
        check_group(directory, client, scope.resources(), KeyRole::Resource),
        check_group(directory, client, scope.delegates(), KeyRole::Delegate),
    )?;
    Ok(())
}

async fn check_group(
    directory: &dyn Directory,
    client: &Service,
    keys: &HashMap<String, AccessSet>,
    role: KeyRole,
) -> AuthResult<()> {
    let (urls, ids): (Vec<_>, Vec<_>) = keys
        .iter()
        .partition(|(key, _)| Scope::is_url_key(key.as_str()));
    tokio::try_join!(
        check_ids(directory, client, ids, role),
        check_urls(directory, client, urls, role),
    )?;
    Ok(())
}

async fn check_ids(
    directory: &dyn Directory,
    client: &Service,
    entries: Vec<(&String, &AccessSet)>,
    role: KeyRole,
) -> AuthResult<()> {
    for (key, access) in entries {
        let entity = match directory.entity(key).await {
            Ok(entity) => entity,
            Err(DirectoryError::NotFound) => {
                return Err(AuthError::InvalidScope(
                    "Scope contains an unknown resource ID".to_string(),
                ));
            }
            Err(err) => return Err(AuthError::Directory(err.to_string())),
        };

        match directory.organisation(entity.organisation_id()).await {
            Ok(_) => {}
            Err(DirectoryError::NotFound) => {
                return Err(AuthError::InvalidScope(
                    "Invalid resource - missing parent".to_string(),
                ));
            }
            Err(err) => return Err(AuthError::Directory(err.to_string())),
        }

        check_access(client, &entity, access, role)?;
    }
    Ok(())
}

async fn check_urls(
    directory: &dyn Directory,
    client: &Service,
    entries: Vec<(&String, &AccessSet)>,
    role: KeyRole,
) -> AuthResult<()> {
    for (url, access) in entries {
        let service = match directory.service_by_location(url).await {
            Ok(service) => service,
            Err(DirectoryError::NotFound) => {
                return Err(AuthError::InvalidScope(format!(
                    "Scope contains an unknown location: '{url}'"
                )));
            }
            Err(err) => return Err(AuthError::Directory(err.to_string())),
        };

        check_access(client, &Entity::Service(service), access, role)?;
    }
    Ok(())
}

fn check_access(
    client: &Service,
    entity: &Entity,
    access: &AccessSet,
    role: KeyRole,
) -> AuthResult<()> {
    if role == KeyRole::Delegate && !entity.is_service() {
        return Err(AuthError::InvalidScope(format!(
            "Only services can be delegates. '{}' is a '{}'",
            entity.id(),
            entity.kind()
        )));
    }

    let requested = concatenate_access(access);
    if !client.authorized(&requested, entity) {
        return Err(AuthError::Unauthorized(format!(
            "Client '{}' does not have '{}' access to '{}'",
            client.id,
            requested,
            entity.id()
        )));
    }
    Ok(())
}
