//! Session middleware for protecting routes
//!
//! Extracts the bearer session id, resolves it against the session store
//! (sliding the idle window), and attaches the resolved session to request
//! extensions. Role checks are a separate per-route layer so each entry
//! point states its requirement exactly once.

use crate::audit::{audit_log, AuditEvent};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use portal_core::Role;
use std::sync::Arc;
use thiserror::Error;

/// The resolved session attached to request extensions
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: String,
    pub principal: portal_core::Principal,
}

/// Session middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Insufficient permissions")]
    InsufficientRole,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuthHeader => {
                (StatusCode::UNAUTHORIZED, "Missing Authorization header")
            }
            AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid or expired session"),
            AuthError::InsufficientRole => (StatusCode::FORBIDDEN, "Insufficient permissions"),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

fn bearer_token(request: &Request<Body>) -> Result<&str, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Middleware that requires a live session
///
/// On success, a [`CurrentSession`] is added to request extensions; any
/// request without one is treated as anonymous and rejected here.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request)?.to_string();

    let principal = state.sessions.authenticate(&token).await;
    let principal = match principal {
        Some(principal) => principal,
        None => return Err(AuthError::InvalidSession),
    };

    request.extensions_mut().insert(CurrentSession {
        session_id: token,
        principal,
    });

    Ok(next.run(request).await)
}

/// Optional session middleware
///
/// Attaches the session when a valid bearer id is present and stays silent
/// otherwise. Used on the login route so an already-authenticated caller
/// gets its existing session echoed back instead of a fresh one.
pub async fn optional_session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Ok(token) = bearer_token(&request) {
        let token = token.to_string();
        if let Some(principal) = state.sessions.authenticate(&token).await {
            request.extensions_mut().insert(CurrentSession {
                session_id: token,
                principal,
            });
        }
    }

    next.run(request).await
}

/// Type alias for role middleware future
type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Middleware factory for role-based access control
///
/// The check is exact: handlers restricted to students reject admin
/// principals and vice versa. Must run inside `session_middleware`.
pub fn require_role(
    required: Role,
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let session = request
                .extensions()
                .get::<CurrentSession>()
                .ok_or(AuthError::MissingAuthHeader)?
                .clone();

            if session.principal.require_role(required).is_err() {
                audit_log(&AuditEvent::AccessDenied {
                    email: session.principal.email().map(str::to_string),
                    resource: request.uri().path().to_string(),
                    required_role: required.to_string(),
                });

                return Err(AuthError::InsufficientRole);
            }

            Ok(next.run(request).await)
        })
    }
}
