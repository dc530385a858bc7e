//! The service directory: the external system of record for organisations,
//! registered services and repositories, and their permission records.

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use fedauth_types::{Entity, Organisation, Repository, Service};

mod http;
mod memory;

pub use http::HttpDirectory;
pub use memory::MemoryDirectory;

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("not found")]
    NotFound,

    #[error("directory request failed: {0}")]
    Upstream(fedauth_client::Error),
}

impl From<fedauth_client::Error> for DirectoryError {
    fn from(err: fedauth_client::Error) -> Self {
        match err {
            fedauth_client::Error::Status(StatusCode::NOT_FOUND, _) => DirectoryError::NotFound,
            other => DirectoryError::Upstream(other),
        }
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    /// Authenticate a client by ID and secret; `None` when the pair is not
    /// recognized.
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> DirectoryResult<Option<Service>>;

    async fn service(&self, id: &str) -> DirectoryResult<Service>;

    async fn repository(&self, id: &str) -> DirectoryResult<Repository>;

    /// Look up a service by its registered URL.
    async fn service_by_location(&self, url: &str) -> DirectoryResult<Service>;

    /// Unified lookup by ID across services and repositories.
    async fn entity(&self, id: &str) -> DirectoryResult<Entity>;

    /// The organisation owning a resource.
    async fn organisation(&self, id: &str) -> DirectoryResult<Organisation>;
}
