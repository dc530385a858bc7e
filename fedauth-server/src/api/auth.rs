//! Handlers for issuing and verifying authorization tokens.

use axum::Json;
use axum::extract::{RawForm, State};
use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use log::{error, info};

use fedauth_types::{Service, TokenResponse, VerifyResponse};

use crate::error::{AuthError, AuthResult};
use crate::oauth2::{FormParams, Grant, GrantRequest};
use crate::state::AppState;

/// Decode the Basic auth header and authenticate the credentials against
/// the directory. Credentials are base64-decoded and then url-unquoted
/// (`+` as space).
async fn authenticate_client(
    state: &AppState,
    headers: &HeaderMap,
) -> AuthResult<(String, Service)> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::Unauthenticated)?;
    let encoded = header
        .strip_prefix("Basic ")
        .ok_or(AuthError::Unauthenticated)?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::Unauthenticated)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::Unauthenticated)?;
    let decoded = urlencoding::decode(&decoded.replace('+', " "))
        .map_err(|_| AuthError::Unauthenticated)?
        .into_owned();

    let (client_id, client_secret) = decoded.split_once(':').ok_or(AuthError::Unauthenticated)?;

    let service = state
        .directory
        .authenticate(client_id, client_secret)
        .await
        .map_err(|err| AuthError::Directory(err.to_string()))?
        .ok_or(AuthError::Unauthenticated)?;

    Ok((client_id.to_string(), service))
}

/// `POST /token` — authenticate the client and mint a bearer token.
pub async fn token(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> AuthResult<Json<TokenResponse>> {
    let (client_id, client) = authenticate_client(&state, &headers).await?;
    let params = FormParams::from_body(&body);
    info!(
        "POST /token client={client_id} grant_type={:?}",
        params.first("grant_type")
    );

    let request = GrantRequest::new(client_id, client, params, state.config.default_scope.clone());
    let grant = Grant::for_request(request)?;
    let (access_token, expiry) = grant.generate_token(&state).await?;

    Ok(Json(TokenResponse {
        status: 200,
        access_token,
        token_type: "bearer".to_string(),
        expiry,
    }))
}

/// `POST /verify` — answer whether a token grants the requested access.
///
/// Token-shape failures and refusals answer `has_access: false` at 200;
/// the endpoint's role is to answer the question, not to explain the
/// token to its bearer. The underlying reason is logged instead.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> AuthResult<Json<VerifyResponse>> {
    let (client_id, client) = authenticate_client(&state, &headers).await?;
    let params = FormParams::from_body(&body);
    info!("POST /verify client={client_id}");

    let Some(token) = params.first("token").map(str::to_string) else {
        return Err(AuthError::BadRequest("Token is required".to_string()));
    };
    let request = GrantRequest::new(client_id, client, params, state.config.default_scope.clone());

    let decoded = match state.codec.decode(&token) {
        Ok(decoded) => decoded,
        Err(err) => {
            error!("Invalid token: {err}");
            return Ok(Json(denied()));
        }
    };

    let grant = Grant::for_token(&decoded, request)?;
    match grant.verify_access(&state, &decoded).await {
        Ok(()) => Ok(Json(VerifyResponse {
            status: 200,
            has_access: true,
        })),
        Err(AuthError::Unauthorized(reason)) => {
            error!("Unauthorized: {reason}");
            Ok(Json(denied()))
        }
        Err(AuthError::Token(err)) => {
            error!("Invalid token: {err}");
            Ok(Json(denied()))
        }
        Err(err) => Err(err),
    }
}

fn denied() -> VerifyResponse {
    VerifyResponse {
        status: 200,
        has_access: false,
    }
}
