//! Shared fixtures: a small federation of services and repositories, plus
//! states and requests wired to the bundled development keys.

use std::sync::Arc;

use fedauth_types::{Organisation, Permission, PermissionType, Repository, Service};

use crate::config::AuthConfig;
use crate::directory::MemoryDirectory;
use crate::key_manager::KeyManager;
use crate::oauth2::{FormParams, GrantRequest};
use crate::state::AppState;
use crate::token::TokenCodec;

pub(crate) fn permission(kind: PermissionType, value: &str, access: &str) -> Permission {
    Permission {
        kind,
        value: Some(value.to_string()),
        permission: access.to_string(),
    }
}

pub(crate) fn test_service(
    id: &str,
    organisation_id: &str,
    location: Option<&str>,
    permissions: &[Permission],
) -> Service {
    Service {
        id: id.to_string(),
        organisation_id: organisation_id.to_string(),
        service_type: "external".to_string(),
        location: location.map(str::to_string),
        permissions: permissions.to_vec(),
    }
}

pub(crate) fn test_repository(
    id: &str,
    service_id: &str,
    permissions: &[Permission],
) -> Repository {
    Repository {
        id: id.to_string(),
        organisation_id: "org1".to_string(),
        service_id: service_id.to_string(),
        permissions: permissions.to_vec(),
    }
}

pub(crate) fn test_client() -> Service {
    test_service("client_id", "org1", Some("http://test.client"), &[])
}

/// Two organisations; `c1` hosts repository `r1`, `c2` hosts `r2`, and
/// `d1` is a delegate `c1` may write to.
pub(crate) fn test_directory() -> MemoryDirectory {
    let org1_rw = permission(PermissionType::OrganisationId, "org1", "rw");
    let org2_rw = permission(PermissionType::OrganisationId, "org2", "rw");

    MemoryDirectory::new()
        .with_organisation(Organisation {
            id: "org1".to_string(),
            name: None,
        })
        .with_organisation(Organisation {
            id: "org2".to_string(),
            name: None,
        })
        .with_service(
            test_service("c1", "org1", Some("http://c1.test"), &[org1_rw.clone()]),
            "c1secret",
        )
        .with_service(
            test_service("c2", "org2", Some("http://c2.test"), &[org2_rw.clone()]),
            "c2secret",
        )
        .with_service(
            test_service("d1", "org1", Some("http://d1.test"), &[org1_rw.clone()]),
            "d1secret",
        )
        .with_repository(test_repository("r1", "c1", &[org1_rw.clone()]))
        .with_repository(Repository {
            id: "r2".to_string(),
            organisation_id: "org2".to_string(),
            service_id: "c2".to_string(),
            permissions: vec![org1_rw, org2_rw],
        })
}

pub(crate) fn test_config(url_auth: &str, token_expiry: i64) -> AuthConfig {
    AuthConfig {
        url_auth: url_auth.to_string(),
        directory_url: "http://localhost:8004".to_string(),
        ssl_key: None,
        ssl_cert: None,
        token_expiry,
        default_scope: "read".to_string(),
        port: 8006,
        workers: None,
        directory_timeout_secs: 10,
    }
}

pub(crate) fn dev_keys() -> Arc<KeyManager> {
    Arc::new(KeyManager::load(None, None).expect("bundled dev keys load"))
}

pub(crate) fn test_codec(url_auth: &str) -> TokenCodec {
    test_codec_with_expiry(url_auth, 10)
}

pub(crate) fn test_codec_with_expiry(url_auth: &str, token_expiry: i64) -> TokenCodec {
    TokenCodec::new(&test_config(url_auth, token_expiry), dev_keys())
}

/// A codec signing with the second bundled pair, for foreign-signature
/// tests.
pub(crate) fn other_key_codec(url_auth: &str) -> TokenCodec {
    let resources = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources");
    let keys = KeyManager::load(
        Some(resources.join("other.key")),
        Some(resources.join("other.crt")),
    )
    .expect("other dev keys load");
    TokenCodec::new(&test_config(url_auth, 10), Arc::new(keys))
}

pub(crate) fn state_with_directory(directory: MemoryDirectory) -> AppState {
    AppState::new(
        test_config("https://localhost:8006", 10),
        Arc::new(directory),
        dev_keys(),
    )
}

pub(crate) fn form_params(pairs: &[(&str, &str)]) -> FormParams {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    FormParams::from_body(body.as_bytes())
}

/// A request authenticated as `c1`.
pub(crate) fn grant_request(pairs: &[(&str, &str)]) -> GrantRequest {
    let client = test_service(
        "c1",
        "org1",
        Some("http://c1.test"),
        &[permission(PermissionType::OrganisationId, "org1", "rw")],
    );
    GrantRequest::new(
        "c1".to_string(),
        client,
        form_params(pairs),
        "read".to_string(),
    )
}

/// A request authenticated as the delegate `d1`.
pub(crate) fn delegate_grant_request(pairs: &[(&str, &str)]) -> GrantRequest {
    let client = test_service(
        "d1",
        "org1",
        Some("http://d1.test"),
        &[permission(PermissionType::OrganisationId, "org1", "rw")],
    );
    GrantRequest::new(
        "d1".to_string(),
        client,
        form_params(pairs),
        "read".to_string(),
    )
}
