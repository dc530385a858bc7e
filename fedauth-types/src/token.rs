use serde::{Deserialize, Serialize};

use crate::directory::Service;

/// The client the token was issued for: the grantor when the token is
/// delegated, otherwise the subject itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientClaim {
    pub id: String,
    pub service_type: String,
    pub organisation_id: String,
}

impl From<&Service> for ClientClaim {
    fn from(service: &Service) -> Self {
        ClientClaim {
            id: service.id.clone(),
            service_type: service.service_type.clone(),
            organisation_id: service.organisation_id.clone(),
        }
    }
}

/// Claims carried by an access token.
///
/// `exp`, `iss`, `aud` and `sub` are required by RFC 7523; `client`,
/// `scope`, `grant_type` and `delegate` are private claims. `sub` is the
/// delegate's ID when `delegate` is true, otherwise the client's own ID.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Token issuer: `<auth base>/token`.
    pub iss: String,
    /// Intended audience: `<auth base>/verify`.
    pub aud: String,
    /// Principal the token speaks for.
    #[serde(default)]
    pub sub: String,
    /// Expiration time as a UNIX timestamp.
    pub exp: i64,
    pub client: ClientClaim,
    /// The scope string exactly as granted.
    pub scope: String,
    /// The grant that issued this token.
    pub grant_type: String,
    /// True iff `sub` names a delegate rather than the client itself.
    pub delegate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_through_json() {
        let claims = AccessTokenClaims {
            iss: "localhost:8006/token".to_string(),
            aud: "localhost:8006/verify".to_string(),
            sub: "client_id".to_string(),
            exp: 1_700_000_000,
            client: ClientClaim {
                id: "client_id".to_string(),
                service_type: "external".to_string(),
                organisation_id: "org1".to_string(),
            },
            scope: "read".to_string(),
            grant_type: "client_credentials".to_string(),
            delegate: false,
        };

        let json = serde_json::to_string(&claims).expect("serialize");
        assert_eq!(
            serde_json::from_str::<AccessTokenClaims>(&json).expect("deserialize"),
            claims
        );
    }

    #[test]
    fn missing_sub_defaults_to_empty() {
        let json = r#"{
            "iss": "localhost:8006/token",
            "aud": "localhost:8006/verify",
            "exp": 1700000000,
            "client": {"id": "c1", "service_type": "external", "organisation_id": "org1"},
            "scope": "read",
            "grant_type": "client_credentials",
            "delegate": false
        }"#;

        let claims: AccessTokenClaims = serde_json::from_str(json).expect("deserialize");
        assert!(claims.sub.is_empty());
    }
}
