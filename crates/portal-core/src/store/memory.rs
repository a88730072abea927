//! In-memory datastore
//!
//! Backs the integration tests and DB-less development runs. State is
//! process-local and lost on shutdown; audit ids are assigned from a
//! monotonic counter the way the relational store's sequence would.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Admin, AuditLog, Datastore, PortalError, Result, Student};

/// Process-local datastore
pub struct MemoryStore {
    students: RwLock<Vec<Student>>,
    admins: RwLock<Vec<Admin>>,
    audit_logs: RwLock<Vec<AuditLog>>,
    next_audit_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            students: RwLock::new(Vec::new()),
            admins: RwLock::new(Vec::new()),
            audit_logs: RwLock::new(Vec::new()),
            next_audit_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let students = self.students.read().await;
        Ok(students.iter().find(|s| s.email == email).cloned())
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        let students = self.students.read().await;
        Ok(students.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_student(&self, student: &Student) -> Result<()> {
        let mut students = self.students.write().await;
        // Mirrors the relational unique index on email
        if students.iter().any(|s| s.email == student.email) {
            return Err(PortalError::DatabaseError(format!(
                "unique constraint violated for email {}",
                student.email
            )));
        }
        students.push(student.clone());
        Ok(())
    }

    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut students = self.students.write().await;
        if let Some(student) = students.iter_mut().find(|s| s.id == id) {
            student.password_hash = password_hash.to_string();
            student.reset_token = None;
            student.reset_token_expiry = None;
        }
        Ok(())
    }

    async fn set_student_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut students = self.students.write().await;
        if let Some(student) = students.iter_mut().find(|s| s.id == id) {
            student.reset_token = Some(token.to_string());
            student.reset_token_expiry = Some(expires_at);
        }
        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let mut students = self.students.read().await.clone();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admins = self.admins.read().await;
        Ok(admins.iter().find(|a| a.email == email).cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<()> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.email == admin.email) {
            return Err(PortalError::DatabaseError(format!(
                "unique constraint violated for email {}",
                admin.email
            )));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut admins = self.admins.write().await;
        if let Some(admin) = admins.iter_mut().find(|a| a.id == id) {
            admin.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn append_audit_log(
        &self,
        user_email: &str,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        let id = self.next_audit_id.fetch_add(1, Ordering::SeqCst);
        let mut logs = self.audit_logs.write().await;
        logs.push(AuditLog {
            id,
            user_email: user_email.to_string(),
            action: action.to_string(),
            timestamp: at,
            logout_time: None,
        });
        Ok(id)
    }

    async fn close_audit_log(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut logs = self.audit_logs.write().await;
        if let Some(log) = logs.iter_mut().find(|l| l.id == id && l.is_open()) {
            log.logout_time = Some(at);
        }
        Ok(())
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>> {
        let mut logs = self.audit_logs.read().await.clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_student_roundtrip() {
        let store = MemoryStore::new();
        let student = Student::new("Ada", "ada@example.com", "hash");

        store.insert_student(&student).await.unwrap();

        let found = store
            .find_student_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, student.id);

        assert!(store
            .find_student_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store
            .insert_student(&Student::new("Ada", "ada@example.com", "h1"))
            .await
            .unwrap();

        let err = store
            .insert_student(&Student::new("Other", "ada@example.com", "h2"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_password_update_clears_token_fields() {
        let store = MemoryStore::new();
        let student = Student::new("Ada", "ada@example.com", "old");
        store.insert_student(&student).await.unwrap();

        store
            .set_student_reset_token(student.id, "tok", Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let with_token = store
            .find_student_by_id(student.id)
            .await
            .unwrap()
            .unwrap();
        assert!(with_token.reset_token.is_some());
        assert!(with_token.reset_token_expiry.is_some());

        store
            .update_student_password(student.id, "new")
            .await
            .unwrap();

        let updated = store
            .find_student_by_id(student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "new");
        assert!(updated.reset_token.is_none());
        assert!(updated.reset_token_expiry.is_none());
    }

    #[tokio::test]
    async fn test_audit_log_ids_are_monotonic() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let first = store
            .append_audit_log("a@example.com", "Student Logged In", now)
            .await
            .unwrap();
        let second = store
            .append_audit_log("b@example.com", "Student Logged In", now)
            .await
            .unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_close_audit_log_only_touches_open_row() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let id = store
            .append_audit_log("a@example.com", "Student Logged In", now)
            .await
            .unwrap();

        let later = now + chrono::Duration::minutes(5);
        store.close_audit_log(id, later).await.unwrap();

        // Second close must not move the recorded logout time
        store
            .close_audit_log(id, later + chrono::Duration::minutes(5))
            .await
            .unwrap();

        let logs = store.list_audit_logs().await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].logout_time, Some(later));

        // Unknown id is a no-op
        store.close_audit_log(9999, later).await.unwrap();
    }
}
