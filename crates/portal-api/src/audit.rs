//! Audit trail for authentication events
//!
//! Two layers: durable AuditLog rows for login/logout (one row per login
//! event, closed by the id the session stashed), and structured tracing
//! events for everything else. Tracing events go out at INFO with the
//! "audit" target so security tooling can route them separately from
//! application logs.

use chrono::Utc;
use portal_core::{Datastore, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Action label recorded when the admin signs in
pub const ADMIN_LOGIN_ACTION: &str = "Admin Logged In";

/// Action label recorded when a student signs in
pub const STUDENT_LOGIN_ACTION: &str = "Student Logged In";

/// Security audit events emitted to the tracing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        email: String,
        role: String,
    },
    LoginFailure {
        email: String,
        reason: String,
    },
    Logout {
        email: Option<String>,
    },
    RegistrationSuccess {
        student_id: Uuid,
        email: String,
    },
    RegistrationFailure {
        email: String,
        reason: String,
    },
    PasswordResetRequested {
        email: String,
        reused_token: bool,
    },
    PasswordResetCompleted {
        email: String,
    },
    InvalidResetToken {
        email: String,
    },
    AccessDenied {
        email: Option<String>,
        resource: String,
        required_role: String,
    },
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::LoginSuccess { email, role } => {
            info!(target: "audit", event = %event_json, email = %email, role = %role, "Login successful");
        }
        AuditEvent::LoginFailure { email, reason } => {
            info!(target: "audit", event = %event_json, email = %email, reason = %reason, "Login failed");
        }
        AuditEvent::Logout { email } => {
            info!(target: "audit", event = %event_json, email = ?email, "User logout");
        }
        AuditEvent::RegistrationSuccess { student_id, email } => {
            info!(target: "audit", event = %event_json, student_id = %student_id, email = %email, "Registration successful");
        }
        AuditEvent::RegistrationFailure { email, reason } => {
            info!(target: "audit", event = %event_json, email = %email, reason = %reason, "Registration failed");
        }
        AuditEvent::PasswordResetRequested { email, reused_token } => {
            info!(target: "audit", event = %event_json, email = %email, reused_token = %reused_token, "Password reset requested");
        }
        AuditEvent::PasswordResetCompleted { email } => {
            info!(target: "audit", event = %event_json, email = %email, "Password reset completed");
        }
        AuditEvent::InvalidResetToken { email } => {
            info!(target: "audit", event = %event_json, email = %email, "Invalid reset token");
        }
        AuditEvent::AccessDenied {
            email,
            resource,
            required_role,
        } => {
            info!(target: "audit", event = %event_json, email = ?email, resource = %resource, required_role = %required_role, "Access denied");
        }
    }
}

/// Durable audit recorder
///
/// Appends one row per login and closes exactly the row whose id the
/// caller hands back. Listing is a read-only reporting concern served by
/// the admin surface.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn Datastore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Append a login record; the returned id is stashed in the session
    /// for the eventual close
    pub async fn record_login(&self, email: &str, action: &str) -> Result<i64> {
        self.store.append_audit_log(email, action, Utc::now()).await
    }

    /// Close an open record; a stale or unknown id is a no-op
    pub async fn record_logout(&self, audit_log_id: i64) -> Result<()> {
        self.store.close_audit_log(audit_log_id, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::MemoryStore;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            email: "test@example.com".to_string(),
            role: "student".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("login_success"));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::LoginFailure {
            email: "test@example.com".to_string(),
            reason: "Invalid password".to_string(),
        });

        audit_log(&AuditEvent::AccessDenied {
            email: None,
            resource: "/api/v1/admin/students".to_string(),
            required_role: "admin".to_string(),
        });
    }

    #[tokio::test]
    async fn test_recorder_roundtrip() {
        let store = Arc::new(MemoryStore::new());
        let recorder = AuditRecorder::new(store.clone());

        let id = recorder
            .record_login("ada@example.com", STUDENT_LOGIN_ACTION)
            .await
            .unwrap();

        let logs = store.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_open());
        assert_eq!(logs[0].action, STUDENT_LOGIN_ACTION);

        recorder.record_logout(id).await.unwrap();
        let logs = store.list_audit_logs().await.unwrap();
        assert!(!logs[0].is_open());

        // Unknown id: no-op, no error
        recorder.record_logout(999).await.unwrap();
    }
}
