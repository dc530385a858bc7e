//! Requests against the authorization server's endpoints.

use reqwest::Client;

use fedauth_types::{RootResponse, TokenRequest, TokenResponse, VerifyRequest, VerifyResponse};

use crate::error::Result;
use crate::util::{basic_auth, fetch_json, post_form_authed};

/// Request a bearer token from `POST /token`.
pub async fn request_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    body: &TokenRequest,
) -> Result<TokenResponse> {
    let url = format!("{}/token", base_url.trim_end_matches('/'));
    post_form_authed(client, &url, &basic_auth(client_id, client_secret), body).await
}

/// Ask `POST /verify` whether a token grants the requested access.
pub async fn verify_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    body: &VerifyRequest,
) -> Result<VerifyResponse> {
    let url = format!("{}/verify", base_url.trim_end_matches('/'));
    post_form_authed(client, &url, &basic_auth(client_id, client_secret), body).await
}

/// Fetch the service name and version from the root endpoint.
pub async fn service_info(client: &Client, base_url: &str) -> Result<RootResponse> {
    fetch_json(client, base_url).await
}
