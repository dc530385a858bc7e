use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use fedauth_client::util::{fetch_json, post_json};
use fedauth_types::{Entity, Organisation, Repository, Service};

use super::{Directory, DirectoryError, DirectoryResult};

/// Directory backed by the directory service's HTTP API. Every call shares
/// the configured timeout, so a dropped caller never waits on the
/// directory longer than that.
#[derive(Clone, Debug)]
pub struct HttpDirectory {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

impl HttpDirectory {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpDirectory {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> DirectoryResult<Option<Service>> {
        let body = AuthenticateRequest {
            client_id,
            client_secret,
        };
        match post_json::<_, Service>(&self.client, &self.url("authenticate"), &body).await {
            Ok(service) => Ok(Some(service)),
            Err(fedauth_client::Error::Status(
                StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND,
                _,
            )) => Ok(None),
            Err(err) => Err(DirectoryError::Upstream(err)),
        }
    }

    async fn service(&self, id: &str) -> DirectoryResult<Service> {
        let url = self.url(&format!("services/{}", urlencoding::encode(id)));
        Ok(fetch_json(&self.client, &url).await?)
    }

    async fn repository(&self, id: &str) -> DirectoryResult<Repository> {
        let url = self.url(&format!("repositories/{}", urlencoding::encode(id)));
        Ok(fetch_json(&self.client, &url).await?)
    }

    async fn service_by_location(&self, location: &str) -> DirectoryResult<Service> {
        let url = self.url(&format!(
            "services?location={}",
            urlencoding::encode(location)
        ));
        Ok(fetch_json(&self.client, &url).await?)
    }

    async fn entity(&self, id: &str) -> DirectoryResult<Entity> {
        let url = self.url(&format!("entities/{}", urlencoding::encode(id)));
        Ok(fetch_json(&self.client, &url).await?)
    }

    async fn organisation(&self, id: &str) -> DirectoryResult<Organisation> {
        let url = self.url(&format!("organisations/{}", urlencoding::encode(id)));
        Ok(fetch_json(&self.client, &url).await?)
    }
}
