use std::collections::HashMap;

use async_trait::async_trait;

use fedauth_types::{Entity, Organisation, Repository, Service};

use super::{Directory, DirectoryError, DirectoryResult};

/// In-process directory, used by the test suites and for local
/// development without a directory service.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory {
    organisations: HashMap<String, Organisation>,
    services: HashMap<String, Service>,
    repositories: HashMap<String, Repository>,
    secrets: HashMap<String, String>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organisation(mut self, organisation: Organisation) -> Self {
        self.organisations
            .insert(organisation.id.clone(), organisation);
        self
    }

    pub fn with_service(mut self, service: Service, secret: &str) -> Self {
        self.secrets.insert(service.id.clone(), secret.to_string());
        self.services.insert(service.id.clone(), service);
        self
    }

    pub fn with_repository(mut self, repository: Repository) -> Self {
        self.repositories
            .insert(repository.id.clone(), repository);
        self
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> DirectoryResult<Option<Service>> {
        let known = self
            .secrets
            .get(client_id)
            .is_some_and(|secret| secret == client_secret);
        if !known {
            return Ok(None);
        }
        Ok(self.services.get(client_id).cloned())
    }

    async fn service(&self, id: &str) -> DirectoryResult<Service> {
        self.services
            .get(id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn repository(&self, id: &str) -> DirectoryResult<Repository> {
        self.repositories
            .get(id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn service_by_location(&self, location: &str) -> DirectoryResult<Service> {
        self.services
            .values()
            .find(|service| service.location.as_deref() == Some(location))
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn entity(&self, id: &str) -> DirectoryResult<Entity> {
        if let Some(service) = self.services.get(id) {
            return Ok(Entity::Service(service.clone()));
        }
        self.repositories
            .get(id)
            .map(|repository| Entity::Repository(repository.clone()))
            .ok_or(DirectoryError::NotFound)
    }

    async fn organisation(&self, id: &str) -> DirectoryResult<Organisation> {
        self.organisations
            .get(id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> MemoryDirectory {
        MemoryDirectory::new()
            .with_organisation(Organisation {
                id: "org1".to_string(),
                name: None,
            })
            .with_service(
                Service {
                    id: "svc1".to_string(),
                    organisation_id: "org1".to_string(),
                    service_type: "external".to_string(),
                    location: Some("http://svc1.test".to_string()),
                    permissions: Vec::new(),
                },
                "secret",
            )
            .with_repository(Repository {
                id: "repo1".to_string(),
                organisation_id: "org1".to_string(),
                service_id: "svc1".to_string(),
                permissions: Vec::new(),
            })
    }

    #[tokio::test]
    async fn authenticate_checks_the_secret() {
        let directory = directory();

        let service = directory
            .authenticate("svc1", "secret")
            .await
            .expect("directory call");
        assert_eq!(service.expect("authenticated").id, "svc1");

        assert!(
            directory
                .authenticate("svc1", "wrong")
                .await
                .expect("directory call")
                .is_none()
        );
        assert!(
            directory
                .authenticate("ghost", "secret")
                .await
                .expect("directory call")
                .is_none()
        );
    }

    #[tokio::test]
    async fn entity_lookup_spans_services_and_repositories() {
        let directory = directory();

        assert!(directory.entity("svc1").await.expect("lookup").is_service());
        assert_eq!(directory.entity("repo1").await.expect("lookup").kind(), "repository");
        assert!(matches!(
            directory.entity("ghost").await,
            Err(DirectoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn location_lookup_matches_the_registered_url() {
        let directory = directory();

        let found = directory
            .service_by_location("http://svc1.test")
            .await
            .expect("lookup");
        assert_eq!(found.id, "svc1");

        assert!(matches!(
            directory.service_by_location("http://other.test").await,
            Err(DirectoryError::NotFound)
        ));
    }
}
