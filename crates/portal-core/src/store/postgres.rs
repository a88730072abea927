//! PostgreSQL datastore
//!
//! Account and audit-log persistence using SQLx and PostgreSQL. Schema:
//! `students`, `admins`, and `audit_logs` (BIGSERIAL id) tables; the two
//! reset-token columns are always written together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{Admin, AuditLog, Datastore, PortalError, Result, Student};

/// PostgreSQL-backed datastore
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new datastore connection
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(|e| PortalError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Student row from database
#[derive(Debug, FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    reset_token: Option<String>,
    reset_token_expiry: Option<DateTime<Utc>>,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            reset_token: row.reset_token,
            reset_token_expiry: row.reset_token_expiry,
        }
    }
}

/// Admin row from database
#[derive(Debug, FromRow)]
struct AdminRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

/// Audit log row from database
#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: i64,
    user_email: String,
    action: String,
    timestamp: DateTime<Utc>,
    logout_time: Option<DateTime<Utc>>,
}

impl From<AuditLogRow> for AuditLog {
    fn from(row: AuditLogRow) -> Self {
        AuditLog {
            id: row.id,
            user_email: row.user_email,
            action: row.action,
            timestamp: row.timestamp,
            logout_time: row.logout_time,
        }
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let row: Option<StudentRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, reset_token, reset_token_expiry
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to find student: {e}")))?;

        Ok(row.map(Student::from))
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        let row: Option<StudentRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, reset_token, reset_token_expiry
            FROM students
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to find student: {e}")))?;

        Ok(row.map(Student::from))
    }

    async fn insert_student(&self, student: &Student) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO students (id, name, email, password_hash, reset_token, reset_token_expiry)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.password_hash)
        .bind(&student.reset_token)
        .bind(student.reset_token_expiry)
        .execute(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to insert student: {e}")))?;

        Ok(())
    }

    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students SET
                password_hash = $2,
                reset_token = NULL,
                reset_token_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to update password: {e}")))?;

        Ok(())
    }

    async fn set_student_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE students SET reset_token = $2, reset_token_expiry = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to store reset token: {e}")))?;

        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let rows: Vec<StudentRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, reset_token, reset_token_expiry
            FROM students
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to list students: {e}")))?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT id, name, email, password_hash FROM admins WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to find admin: {e}")))?;

        Ok(row.map(Admin::from))
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<()> {
        sqlx::query(
            "INSERT INTO admins (id, name, email, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to insert admin: {e}")))?;

        Ok(())
    }

    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE admins SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| PortalError::DatabaseError(format!("Failed to update admin: {e}")))?;

        Ok(())
    }

    async fn append_audit_log(
        &self,
        user_email: &str,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO audit_logs (user_email, action, timestamp)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_email)
        .bind(action)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to append audit log: {e}")))?;

        Ok(row.0)
    }

    async fn close_audit_log(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        // Only closes a still-open row; a second close is a no-op
        sqlx::query("UPDATE audit_logs SET logout_time = $2 WHERE id = $1 AND logout_time IS NULL")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortalError::DatabaseError(format!("Failed to close audit log: {e}")))?;

        Ok(())
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>> {
        let rows: Vec<AuditLogRow> = sqlx::query_as(
            r#"
            SELECT id, user_email, action, timestamp, logout_time
            FROM audit_logs
            ORDER BY timestamp DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortalError::DatabaseError(format!("Failed to list audit logs: {e}")))?;

        Ok(rows.into_iter().map(AuditLog::from).collect())
    }
}
