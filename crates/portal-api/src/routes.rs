//! API route definitions

use crate::auth::middleware::{
    optional_session_middleware, require_role, session_middleware,
};
use crate::handlers::{account, admin, student};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use portal_core::Role;
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes; login sees an existing session when one is presented
    let public_routes = Router::new()
        .route("/auth/register", post(account::register_handler))
        .route("/auth/login", post(account::login_handler))
        .route("/auth/forgot-password", post(account::forgot_password_handler))
        .route("/auth/reset-password", post(account::reset_password_handler))
        .route("/auth/send-reset-link", post(account::send_reset_link_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_session_middleware,
        ));

    // Any authenticated principal
    let protected_routes = Router::new()
        .route("/auth/logout", post(account::logout_handler))
        .route("/auth/me", get(account::me_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Student-only surface
    let student_routes = Router::new()
        .route("/student/dashboard", get(student::dashboard_handler))
        .route_layer(middleware::from_fn(require_role(Role::Student)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    // Admin-only surface
    let admin_routes = Router::new()
        .route("/admin/students", get(admin::list_students_handler))
        .route("/admin/audit-logs", get(admin::list_audit_logs_handler))
        .route_layer(middleware::from_fn(require_role(Role::Admin)))
        .layer(middleware::from_fn_with_state(state, session_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(student_routes)
        .merge(admin_routes)
}
