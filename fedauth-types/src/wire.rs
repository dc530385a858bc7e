//! Request and response bodies exchanged with the authorization server.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Form body for `POST /token`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_access: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub status: u16,
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
    /// Expiry as seconds since the epoch; clients cache the token until
    /// this passes.
    pub expiry: i64,
}

/// Form body for `POST /verify`.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_access: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyResponse {
    pub status: u16,
    pub has_access: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    pub service_name: String,
    pub version: String,
}

/// Returned from `GET /`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootResponse {
    pub status: u16,
    pub data: ServiceInfo,
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assertion = self.assertion.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .field("assertion", &assertion)
            .field("resource_id", &self.resource_id)
            .field("requested_access", &self.requested_access)
            .finish()
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("status", &self.status)
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl fmt::Debug for VerifyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyRequest")
            .field("token", &"[REDACTED]")
            .field("resource_id", &self.resource_id)
            .field("requested_access", &self.requested_access)
            .finish()
    }
}
