//! Account and session lifecycle
//!
//! This module provides session-based authentication with the following
//! components:
//! - Password hashing with Argon2, one hasher per role
//! - Reset-token generation and reuse policy
//! - Server-side session store with sliding idle expiry
//! - Middleware for request authentication and role checks
//! - The account lifecycle service tying the pieces together

pub mod middleware;
pub mod models;
pub mod password;
pub mod reset;
pub mod service;
pub mod session;

pub use middleware::{
    optional_session_middleware, require_role, session_middleware, AuthError, CurrentSession,
};
pub use models::{
    landing_for, ForgotPasswordRequest, LoginRequest, LoginResponse, MeResponse, MessageResponse,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, SendResetLinkRequest,
};
pub use password::{is_phc_hash, validate_password_strength, AdminHasher, StudentHasher};
pub use reset::{issue, reset_link, reuse_or_issue, ResetToken};
pub use service::{AccountService, EstablishedSession, FORGOT_PASSWORD_MESSAGE};
pub use session::SessionStore;
