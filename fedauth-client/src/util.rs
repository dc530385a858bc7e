//! Shared HTTP helpers for talking to services in the federation.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::debug;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Basic auth header value. Credentials are percent-encoded before being
/// joined with `:` and base64-encoded, so IDs and secrets may themselves
/// contain `:`.
pub fn basic_auth(client_id: &str, client_secret: &str) -> String {
    let credentials = format!(
        "{}:{}",
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret)
    );
    format!("Basic {}", STANDARD.encode(credentials))
}

pub async fn fetch_json<T>(client: &Client, url: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    debug!("fetching json: {url}");
    let response = client.get(url).send().await?;
    read_json(response).await
}

pub async fn post_json<I, O>(client: &Client, url: &str, request_body: &I) -> Result<O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    debug!("posting json: {url}");
    let response = client.post(url).json(request_body).send().await?;
    read_json(response).await
}

/// Post a form-encoded body with Basic auth credentials.
pub async fn post_form_authed<I, O>(
    client: &Client,
    url: &str,
    auth_header: &str,
    form: &I,
) -> Result<O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    debug!("posting form: {url}");
    let response = client
        .post(url)
        .header("Authorization", auth_header)
        .form(form)
        .send()
        .await?;
    read_json(response).await
}

async fn read_json<O>(response: reqwest::Response) -> Result<O>
where
    O: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to get error message body: {e}"));
        return Err(Error::Status(status, message));
    }
    let data = response.json::<O>().await?;
    Ok(data)
}
