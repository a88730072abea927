//! Admin surface: student roster and audit-log listing
//!
//! Both routes sit behind `require_role(Role::Admin)`; the handlers only
//! read and shape.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use portal_core::AuditLog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Roster entry, stripped of credential fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub students: Vec<RosterEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_email: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
}

impl From<AuditLog> for AuditLogEntry {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            user_email: log.user_email,
            action: log.action,
            timestamp: log.timestamp,
            logout_time: log.logout_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogListResponse {
    pub logs: Vec<AuditLogEntry>,
    pub total: usize,
}

/// Registered students, seeded-admin email excluded
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RosterResponse>, AppError> {
    let admin_email = &state.config.bootstrap.admin_email;

    let students: Vec<RosterEntry> = state
        .store
        .list_students()
        .await?
        .into_iter()
        .filter(|s| &s.email != admin_email)
        .map(|s| RosterEntry {
            id: s.id,
            name: s.name,
            email: s.email,
        })
        .collect();

    let total = students.len();
    Ok(Json(RosterResponse { students, total }))
}

/// Audit rows, newest first
pub async fn list_audit_logs_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AuditLogListResponse>, AppError> {
    let logs: Vec<AuditLogEntry> = state
        .store
        .list_audit_logs()
        .await?
        .into_iter()
        .map(AuditLogEntry::from)
        .collect();

    let total = logs.len();
    Ok(Json(AuditLogListResponse { logs, total }))
}
