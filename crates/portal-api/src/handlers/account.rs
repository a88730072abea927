//! Account lifecycle handlers
//!
//! Thin HTTP adapters over [`AccountService`]; each handler validates the
//! payload shape, delegates, and maps the typed outcome onto a response.

use crate::auth::{
    landing_for, CurrentSession, ForgotPasswordRequest, LoginRequest, LoginResponse, MeResponse,
    MessageResponse, RegisterRequest, RegisterResponse, ResetPasswordRequest,
    SendResetLinkRequest, FORGOT_PASSWORD_MESSAGE,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

fn validated<T: Validate>(payload: T) -> Result<T, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(payload)
}

/// Register a new student account
///
/// Does not log the student in; the client proceeds to the login page.
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = validated(request)?;
    let student = state.accounts.register(request).await?;

    let response = RegisterResponse {
        student_id: student.id,
        email: student.email,
        message: "Registration successful".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// A caller that already holds a live session gets that session echoed
/// back with its role landing, without credentials being re-checked.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    session: Option<Extension<CurrentSession>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if let Some(Extension(current)) = session {
        if let (Some(role), Some(claims)) =
            (current.principal.role(), current.principal.claims())
        {
            return Ok(Json(LoginResponse {
                session_token: current.session_id,
                role,
                name: claims.name.clone(),
                email: claims.email.clone(),
                landing: landing_for(role).to_string(),
            }));
        }
    }

    let request = validated(request)?;
    let session = state.accounts.login(request).await?;

    let (role, claims) = match (session.principal.role(), session.principal.claims()) {
        (Some(role), Some(claims)) => (role, claims),
        _ => {
            return Err(AppError::Internal(
                "login established an anonymous principal".to_string(),
            ))
        }
    };

    Ok(Json(LoginResponse {
        session_token: session.session_id.clone(),
        role,
        name: claims.name.clone(),
        email: claims.email.clone(),
        landing: landing_for(role).to_string(),
    }))
}

/// Logout the current session
///
/// Closes this login's audit row and destroys the session. Always
/// succeeds for an authenticated caller.
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.logout(&session.session_id).await?;

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Start the password-reset flow
///
/// The response is the same whether or not the email is registered.
pub async fn forgot_password_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let request = validated(request)?;
    state.accounts.forgot_password(&request.email).await?;

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
    }))
}

/// Complete the password-reset flow
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let request = validated(request)?;
    state.accounts.reset_password(request).await?;

    Ok(Json(MessageResponse {
        message: "Password successfully reset!".to_string(),
    }))
}

/// Dispatch a reset link, surfacing lookup and delivery failures
pub async fn send_reset_link_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendResetLinkRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let request = validated(request)?;
    state.accounts.send_reset_link(&request.email).await?;

    Ok(Json(MessageResponse {
        message: "A reset link has been sent to your email address.".to_string(),
    }))
}

/// Current principal echo
pub async fn me_handler(
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<MeResponse>, AppError> {
    let (role, claims) = match (session.principal.role(), session.principal.claims()) {
        (Some(role), Some(claims)) => (role, claims),
        _ => {
            return Err(AppError::Internal(
                "session carried an anonymous principal".to_string(),
            ))
        }
    };

    Ok(Json(MeResponse {
        id: claims.id,
        name: claims.name.clone(),
        email: claims.email.clone(),
        role,
    }))
}
