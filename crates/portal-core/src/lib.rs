//! Portal Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the study
//! portal:
//! - Account entities (students, the seeded admin, audit log rows)
//! - Principals and role-based capability checks
//! - Common error types
//! - Collaborator traits for persistence and outbound email
//! - Configuration management

pub mod config;
pub mod store;

pub use config::{
    AppConfig, BootstrapConfig, ConfigError, DatabaseConfig, EmailConfig, ServerConfig,
    SessionConfig,
};
pub use store::{MemoryStore, PgStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for portal operations
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("This email is already registered")]
    DuplicateEmail,

    #[error("Email not registered")]
    EmailNotRegistered,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Email delivery failed: {0}")]
    EmailSend(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;

// ============================================================================
// Roles and Principals
// ============================================================================

/// Account role
///
/// Exactly two roles exist: the seeded administrator and registered
/// students. Role is a tagged value, never a string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claims carried by an authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// The identity attached to a request
///
/// A request is either anonymous or carries exactly one authenticated
/// role with its claims. Handlers authorize through [`Principal::require_role`]
/// instead of branching on role strings at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    Anonymous,
    Student(Claims),
    Admin(Claims),
}

impl Principal {
    /// Build a student principal
    pub fn student(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Principal::Student(Claims {
            id,
            name: name.into(),
            email: email.into(),
        })
    }

    /// Build an admin principal
    pub fn admin(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Principal::Admin(Claims {
            id,
            name: name.into(),
            email: email.into(),
        })
    }

    /// Role claim, if authenticated
    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Anonymous => None,
            Principal::Student(_) => Some(Role::Student),
            Principal::Admin(_) => Some(Role::Admin),
        }
    }

    /// Claims, if authenticated
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Principal::Anonymous => None,
            Principal::Student(claims) | Principal::Admin(claims) => Some(claims),
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.claims().map(|c| c.email.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Principal::Anonymous)
    }

    /// Authorization capability check
    ///
    /// Returns the claims when this principal carries exactly the required
    /// role. Admins do not implicitly satisfy student-only checks; the two
    /// surfaces are disjoint.
    pub fn require_role(&self, required: Role) -> Result<&Claims> {
        match self {
            Principal::Student(claims) if required == Role::Student => Ok(claims),
            Principal::Admin(claims) if required == Role::Admin => Ok(claims),
            Principal::Student(_) | Principal::Admin(_) => Err(PortalError::AccessDenied {
                reason: format!(
                    "requires role {required}, principal has {}",
                    self.role().map(|r| r.as_str()).unwrap_or("none")
                ),
            }),
            Principal::Anonymous => Err(PortalError::AccessDenied {
                reason: format!("requires role {required}, principal is anonymous"),
            }),
        }
    }
}

// ============================================================================
// Account Entities
// ============================================================================

/// A registered student account
///
/// The identity is assigned at registration and never changes. The reset
/// token fields are either both set or both unset; they are written and
/// cleared together by the datastore operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,

    pub name: String,

    /// Unique across students, matched exactly as stored
    pub email: String,

    /// Argon2id hash in PHC string format, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[serde(skip_serializing)]
    pub reset_token: Option<String>,

    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,
}

impl Student {
    /// Create a new student with a freshly generated identity
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            reset_token: None,
            reset_token_expiry: None,
        }
    }

    /// Whether `candidate` matches the stored reset token and the token is
    /// still live at `now`. Comparison is exact and full-length; a missing
    /// token or expiry never matches.
    pub fn reset_token_matches(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expiry) {
            (Some(stored), Some(expiry)) => stored == candidate && now < expiry,
            _ => false,
        }
    }

    /// Whether the stored token (if any) is still unexpired at `now`
    pub fn has_live_reset_token(&self, now: DateTime<Utc>) -> bool {
        matches!(
            (&self.reset_token, self.reset_token_expiry),
            (Some(_), Some(expiry)) if now < expiry
        )
    }
}

/// The administrator account
///
/// Exactly one row is expected in steady state; it is created or repaired
/// at startup if missing or mis-hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl Admin {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

/// One row per login event, never deleted by this subsystem
///
/// `logout_time` is set exactly once, by the logout that owns the session
/// the row's id was stashed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Store-assigned, monotonic
    pub id: i64,
    pub user_email: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
}

impl AuditLog {
    pub fn is_open(&self) -> bool {
        self.logout_time.is_none()
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Persistence collaborator
///
/// All durable state the account lifecycle touches goes through this trait.
/// Token-field updates are single operations so the pair invariant (both
/// set or both unset) holds without cross-statement coordination.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>>;

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>>;

    async fn insert_student(&self, student: &Student) -> Result<()>;

    /// Store a new password hash and clear both reset-token fields in the
    /// same update
    async fn update_student_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Store a reset token together with its expiry
    async fn set_student_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn list_students(&self) -> Result<Vec<Student>>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>>;

    async fn insert_admin(&self, admin: &Admin) -> Result<()>;

    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Append a login record and return its store-assigned id
    async fn append_audit_log(
        &self,
        user_email: &str,
        action: &str,
        at: DateTime<Utc>,
    ) -> Result<i64>;

    /// Set `logout_time` on an open row; no-op when the id does not
    /// reference an existing open record
    async fn close_audit_log(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// All audit rows, newest first
    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>>;
}

/// Outbound email collaborator
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
