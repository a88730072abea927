//! Request and response types for the account lifecycle surface

use portal_core::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Reset-password request, carrying the link parameters back
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Token must not be empty"))]
    pub token: String,
    pub new_password: String,
}

/// Manual reset-link dispatch request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendResetLinkRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub student_id: Uuid,
    pub email: String,
    pub message: String,
}

/// Login response with the established session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque session id, presented as a bearer token on later requests
    pub session_token: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    /// Role-based landing path
    pub landing: String,
}

/// Generic message response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Current principal echo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Landing path for a role
pub fn landing_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Student => "/student/dashboard",
    }
}
