//! Records held by the service directory: organisations, their registered
//! services and repositories, and the permission records used to decide
//! whether one principal may access another's resources.

use serde::{Deserialize, Serialize};

/// How a permission record is matched against a principal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionType {
    All,
    OrganisationId,
    ServiceType,
    ServiceId,
}

impl PermissionType {
    /// Narrower record types override broader ones.
    fn specificity(self) -> u8 {
        match self {
            PermissionType::All => 0,
            PermissionType::ServiceType => 1,
            PermissionType::OrganisationId => 2,
            PermissionType::ServiceId => 3,
        }
    }
}

/// One permission record on a protected resource, e.g.
/// `{type: organisation_id, value: org1, permission: "rw"}`. A permission
/// of `"-"` explicitly denies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    #[serde(rename = "type")]
    pub kind: PermissionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub permission: String,
}

impl Permission {
    fn matches(&self, principal: &Service) -> bool {
        let value = self.value.as_deref();
        match self.kind {
            PermissionType::All => true,
            PermissionType::OrganisationId => value == Some(principal.organisation_id.as_str()),
            PermissionType::ServiceType => value == Some(principal.service_type.as_str()),
            PermissionType::ServiceId => value == Some(principal.id.as_str()),
        }
    }

    fn grants(&self, access: &str) -> bool {
        access.chars().all(|c| self.permission.contains(c))
    }
}

/// Anything carrying permission records that access can be checked against.
pub trait Protected {
    fn permissions(&self) -> &[Permission];
}

/// Evaluate the permission records that match the principal, keeping only
/// the most specific matching type. Access is granted when any record at
/// that specificity covers every requested access character.
fn evaluate(principal: &Service, access: &str, permissions: &[Permission]) -> bool {
    let matching = || permissions.iter().filter(|p| p.matches(principal));

    let Some(specificity) = matching().map(|p| p.kind.specificity()).max() else {
        return false;
    };

    matching()
        .filter(|p| p.kind.specificity() == specificity)
        .any(|p| p.grants(access))
}

/// A registered service. Services authenticate with an ID and secret held
/// by the directory, and act both as clients of the authorization server
/// and as protected resources.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    pub organisation_id: String,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Service {
    /// Does this service hold `access` (e.g. `"r"`, `"w"`, `"rw"`) on the
    /// target, according to the target's permission records?
    pub fn authorized(&self, access: &str, target: &impl Protected) -> bool {
        evaluate(self, access, target.permissions())
    }
}

impl Protected for Service {
    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

/// A repository, hosted by a repository service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub id: String,
    pub organisation_id: String,
    pub service_id: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Protected for Repository {
    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organisation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A directory entry from the unified services + repositories view.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Service(Service),
    Repository(Repository),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Service(service) => &service.id,
            Entity::Repository(repository) => &repository.id,
        }
    }

    pub fn organisation_id(&self) -> &str {
        match self {
            Entity::Service(service) => &service.organisation_id,
            Entity::Repository(repository) => &repository.organisation_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Service(_) => "service",
            Entity::Repository(_) => "repository",
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, Entity::Service(_))
    }
}

impl Protected for Entity {
    fn permissions(&self) -> &[Permission] {
        match self {
            Entity::Service(service) => &service.permissions,
            Entity::Repository(repository) => &repository.permissions,
        }
    }
}
