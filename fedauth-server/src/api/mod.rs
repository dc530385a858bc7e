use axum::{
    Json, Router,
    routing::{get, post},
};
use log::info;
use tower_http::cors::CorsLayer;

use fedauth_types::{RootResponse, ServiceInfo};

use crate::state::AppState;

mod auth;

const SERVICE_NAME: &str = "Federation Authorization Service";

/// Creates a router for all API endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/token", post(auth::token))
        .route("/verify", post(auth::verify))
        .layer(CorsLayer::permissive())
}

/// Basic information on the service: its name and current version.
async fn root() -> Json<RootResponse> {
    info!("GET /");
    Json(RootResponse {
        status: 200,
        data: ServiceInfo {
            service_name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{state_with_directory, test_directory};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use tower::ServiceExt;

    fn app() -> Router {
        router().with_state(state_with_directory(test_directory()))
    }

    fn form(pairs: &[(&str, &str)]) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }

    fn basic(client_id: &str, client_secret: &str) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{client_id}:{client_secret}"))
        )
    }

    async fn post_form(
        app: &Router,
        path: &str,
        auth: Option<(&str, &str)>,
        pairs: &[(&str, &str)],
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some((client_id, client_secret)) = auth {
            request = request.header(header::AUTHORIZATION, basic(client_id, client_secret));
        }
        let request = request
            .body(Body::from(form(pairs)))
            .expect("request builds");

        let response = app.clone().oneshot(request).await.expect("handler runs");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn issue_token(app: &Router, client: (&str, &str), pairs: &[(&str, &str)]) -> String {
        let (status, body) = post_form(app, "/token", Some(client), pairs).await;
        assert_eq!(status, StatusCode::OK, "token issuance failed: {body}");
        body["access_token"]
            .as_str()
            .expect("access_token present")
            .to_string()
    }

    #[tokio::test]
    async fn root_reports_name_and_version() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request builds"))
            .await
            .expect("handler runs");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"]["service_name"], SERVICE_NAME);
        assert_eq!(json["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn missing_credentials_are_unauthenticated() {
        let app = app();
        let (status, _) = post_form(
            &app,
            "/token",
            None,
            &[("grant_type", "client_credentials")],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthenticated() {
        let app = app();
        let (status, _) = post_form(
            &app,
            "/token",
            Some(("c1", "wrong")),
            &[("grant_type", "client_credentials")],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_grant_type_is_invalid_grant() {
        let app = app();
        let (status, body) = post_form(
            &app,
            "/token",
            Some(("c1", "c1secret")),
            &[("grant_type", "password")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_grant");
    }

    // Scenario: a client obtains a token for itself and the resource
    // server confirms read access against the client's own ID.
    #[tokio::test]
    async fn client_credentials_issue_and_verify() {
        let app = app();
        let state = state_with_directory(test_directory());

        let token = issue_token(
            &app,
            ("c1", "c1secret"),
            &[("grant_type", "client_credentials"), ("scope", "read")],
        )
        .await;

        let decoded = state.codec.decode(&token).expect("decodes");
        assert_eq!(decoded.claims.sub, "c1");
        assert!(!decoded.claims.delegate);
        assert_eq!(decoded.claims.scope, "read");

        let (status, body) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[
                ("token", token.as_str()),
                ("requested_access", "r"),
                ("resource_id", "c1"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_access"], true);
    }

    // Scenario: writing to a repository the client hosts.
    #[tokio::test]
    async fn write_to_owned_repository() {
        let app = app();
        let token = issue_token(
            &app,
            ("c1", "c1secret"),
            &[("grant_type", "client_credentials"), ("scope", "write[r1]")],
        )
        .await;

        let (status, body) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[
                ("token", token.as_str()),
                ("requested_access", "w"),
                ("resource_id", "r1"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_access"], true);
    }

    // Scenario: a repository hosted elsewhere verifies to false.
    #[tokio::test]
    async fn cross_host_write_is_refused() {
        let app = app();
        let token = issue_token(
            &app,
            ("c1", "c1secret"),
            &[("grant_type", "client_credentials"), ("scope", "write[r2]")],
        )
        .await;

        let (status, body) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[
                ("token", token.as_str()),
                ("requested_access", "w"),
                ("resource_id", "r2"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_access"], false);
    }

    // Scenario: the delegation happy path. The grantor mints an assertion
    // entrusting write[r1] to d1; d1 exchanges it for its own token.
    #[tokio::test]
    async fn delegation_issue_and_verify() {
        let app = app();
        let state = state_with_directory(test_directory());

        let assertion = issue_token(
            &app,
            ("c1", "c1secret"),
            &[
                ("grant_type", "client_credentials"),
                ("scope", "delegate[d1]:write[r1]"),
            ],
        )
        .await;

        let token = issue_token(
            &app,
            ("d1", "d1secret"),
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("scope", "write[r1]"),
                ("assertion", assertion.as_str()),
            ],
        )
        .await;

        let decoded = state.codec.decode(&token).expect("decodes");
        assert_eq!(decoded.claims.client.id, "c1");
        assert_eq!(decoded.claims.sub, "d1");
        assert!(decoded.claims.delegate);

        let (status, body) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[
                ("token", token.as_str()),
                ("requested_access", "w"),
                ("resource_id", "r1"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_access"], true);
    }

    // Scenario: the delegate asks for a scope the assertion does not
    // entrust.
    #[tokio::test]
    async fn mismatched_delegate_scope_is_forbidden() {
        let app = app();
        let assertion = issue_token(
            &app,
            ("c1", "c1secret"),
            &[
                ("grant_type", "client_credentials"),
                ("scope", "delegate[d1]:write[r1]"),
            ],
        )
        .await;

        let (status, _) = post_form(
            &app,
            "/token",
            Some(("d1", "d1secret")),
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("scope", "write[r2]"),
                ("assertion", assertion.as_str()),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // Scenario: a malformed scope is a 400 with the parser's message.
    #[tokio::test]
    async fn bare_write_scope_is_invalid() {
        let app = app();
        let (status, body) = post_form(
            &app,
            "/token",
            Some(("c1", "c1secret")),
            &[("grant_type", "client_credentials"), ("scope", "write")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .expect("error message")
                .contains("Write scope requires a resource ID")
        );
    }

    #[tokio::test]
    async fn unauthorized_scope_is_forbidden_on_issue() {
        // c1 holds no permissions on c2's own records beyond org2's, so a
        // scope naming c2 is refused at issue time.
        let app = app();
        let (status, _) = post_form(
            &app,
            "/token",
            Some(("c1", "c1secret")),
            &[("grant_type", "client_credentials"), ("scope", "write[c2]")],
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verify_without_token_is_bad_request() {
        let app = app();
        let (status, _) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[("requested_access", "r")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn garbage_token_answers_no_access() {
        let app = app();
        let (status, body) = post_form(
            &app,
            "/verify",
            Some(("c1", "c1secret")),
            &[
                ("token", "not.a.token"),
                ("requested_access", "r"),
                ("resource_id", "c1"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_access"], false);
    }

    #[tokio::test]
    async fn percent_encoded_credentials_authenticate() {
        // The header carries url-encoded credentials under the base64
        // layer; plain IDs pass through the unquoting unchanged.
        let app = app();
        let header = format!(
            "Basic {}",
            STANDARD.encode(format!(
                "{}:{}",
                urlencoding::encode("c1"),
                urlencoding::encode("c1secret")
            ))
        );
        let request = Request::builder()
            .method("POST")
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::AUTHORIZATION, header)
            .body(Body::from(form(&[
                ("grant_type", "client_credentials"),
                ("scope", "read"),
            ])))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("handler runs");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/token")
            .header(header::ORIGIN, "http://service.test")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .expect("request builds");

        let response = app().oneshot(request).await.expect("handler runs");
        assert!(response.status().is_success());
    }
}
