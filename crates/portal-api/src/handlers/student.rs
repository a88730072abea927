//! Student dashboard handler

use crate::auth::CurrentSession;
use crate::error::AppError;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Student landing; sits behind `require_role(Role::Student)`
pub async fn dashboard_handler(
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<DashboardResponse>, AppError> {
    let claims = session
        .principal
        .claims()
        .ok_or_else(|| AppError::Internal("session carried an anonymous principal".to_string()))?;

    Ok(Json(DashboardResponse {
        name: claims.name.clone(),
        email: claims.email.clone(),
        message: format!("Welcome back, {}!", claims.name),
    }))
}
