use axum::{
    Extension, Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::validate_credentials;
use super::{ApiError, ApiResponse, AppState};
use crate::domain::Identity;

const SESSION_USER_KEY: &str = "user_id";

/// Address used when neither the socket nor a trusted proxy provides one.
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Credentials {
    ApiKey(String),
    Basic { username: String, password: String },
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller into an [`Identity`] request extension.
///
/// Checked in order:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
/// 4. `Authorization: Basic` username/password
///
/// Requests without credentials become anonymous visitors keyed by client IP.
/// Credentials that are present but wrong are rejected.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let trusted = state.config().read().await.server.trusted_proxy_ips.clone();
    let ip = client_ip(request.headers(), peer, &trusted);

    let identity = if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        Identity::user(user_id, Some(ip))
    } else if let Some(credentials) = extract_credentials(request.headers()) {
        let user = match credentials {
            Credentials::ApiKey(key) => state.store().verify_api_key(&key).await?,
            Credentials::Basic { username, password } => {
                state
                    .store()
                    .verify_user_password(&username, &password)
                    .await?
            }
        };

        match user {
            Some(user) => Identity::user(user.id, Some(ip)),
            None => return Err(ApiError::unauthorized("Invalid credentials")),
        }
    } else {
        Identity::anonymous(ip)
    };

    tracing::Span::current().record("user_id", identity.to_string().as_str());
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Rejects anonymous visitors. Must run inside [`identity_middleware`].
pub async fn require_user(
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if identity.is_anonymous() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

fn extract_credentials(headers: &HeaderMap) -> Option<Credentials> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(Credentials::ApiKey(key_str.trim().to_string()));
    }

    let auth_str = headers.get("Authorization")?.to_str().ok()?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        return Some(Credentials::ApiKey(token.trim().to_string()));
    }

    let encoded = auth_str.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Client address for anonymous tracking.
///
/// The first `X-Forwarded-For` hop is only honored when the socket peer is a
/// trusted proxy; otherwise the peer address is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted_proxies: &[String]) -> String {
    let Some(peer) = peer else {
        return UNKNOWN_CLIENT_IP.to_string();
    };

    let peer_is_trusted = trusted_proxies
        .iter()
        .any(|proxy| proxy.parse::<IpAddr>().is_ok_and(|p| p == peer));

    if peer_is_trusted
        && let Some(first_hop) = headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
    {
        return first_hop.to_string();
    }

    peer.to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let (username, password) = validate_credentials(&payload.username, &payload.password)?;

    let user = state
        .store()
        .verify_user_password(username, password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    session
        .insert(SESSION_USER_KEY, user.id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(username = %user.username, "User logged in");

    Ok(Json(ApiResponse::success(LoginResponse {
        username: user.username,
        api_key: user.api_key,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (
        StatusCode::OK,
        Json(ApiResponse::success(MessageResponse {
            message: "Logged out".to_string(),
        })),
    )
}
