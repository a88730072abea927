//! Account lifecycle service
//!
//! Orchestrates registration, login, logout, and the forgot/reset-password
//! flow over the datastore and email collaborators. All identity flows in
//! as explicit parameters (a session id or a request payload); nothing is
//! read from ambient state.

use chrono::Utc;
use portal_core::{
    Admin, AppConfig, BootstrapConfig, Datastore, EmailSender, PortalError, Principal, Result,
    Role, Student,
};
use std::sync::Arc;

use super::models::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use super::password::{is_phc_hash, validate_password_strength, AdminHasher, StudentHasher};
use super::reset::{reset_link, reuse_or_issue};
use super::session::SessionStore;
use crate::audit::{
    audit_log, AuditEvent, AuditRecorder, ADMIN_LOGIN_ACTION, STUDENT_LOGIN_ACTION,
};

/// Subject line on reset emails
const RESET_EMAIL_SUBJECT: &str = "Reset Your Student Portal Password";

/// The one response ForgotPassword ever gives
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If your email is registered, a reset link has been sent.";

/// A freshly established session
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub session_id: String,
    pub principal: Principal,
}

/// Account lifecycle controller
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Datastore>,
    mailer: Arc<dyn EmailSender>,
    sessions: Arc<SessionStore>,
    recorder: AuditRecorder,
    student_hasher: StudentHasher,
    admin_hasher: AdminHasher,
    admin_email: String,
    reset_link_base: String,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Datastore>,
        mailer: Arc<dyn EmailSender>,
        sessions: Arc<SessionStore>,
        config: &AppConfig,
    ) -> Self {
        Self {
            recorder: AuditRecorder::new(store.clone()),
            store,
            mailer,
            sessions,
            student_hasher: StudentHasher,
            admin_hasher: AdminHasher,
            admin_email: config.bootstrap.admin_email.clone(),
            reset_link_base: config.email.reset_link_base.clone(),
        }
    }

    /// Register a new student
    ///
    /// Duplicate checks cover registered students and the seeded admin
    /// email; a student row under the admin email could never log in, so it
    /// is refused up front. Does not establish a session.
    pub async fn register(&self, request: RegisterRequest) -> Result<Student> {
        if let Err(reason) = validate_password_strength(&request.password) {
            audit_log(&AuditEvent::RegistrationFailure {
                email: request.email.clone(),
                reason: reason.clone(),
            });
            return Err(PortalError::Validation(reason));
        }

        if request.email == self.admin_email
            || self
                .store
                .find_student_by_email(&request.email)
                .await?
                .is_some()
        {
            audit_log(&AuditEvent::RegistrationFailure {
                email: request.email.clone(),
                reason: "Email already registered".to_string(),
            });
            return Err(PortalError::DuplicateEmail);
        }

        let password_hash = self
            .student_hasher
            .hash(&request.password)
            .map_err(|e| PortalError::Other(e.into()))?;

        let student = Student::new(request.name, request.email, password_hash);
        self.store.insert_student(&student).await?;

        audit_log(&AuditEvent::RegistrationSuccess {
            student_id: student.id,
            email: student.email.clone(),
        });

        Ok(student)
    }

    /// Authenticate and establish a role session
    ///
    /// The admin record is consulted first; a failed admin verification
    /// falls through to the student lookup. The audit row opened here is
    /// stashed in the session so logout closes exactly this login's row.
    pub async fn login(&self, request: LoginRequest) -> Result<EstablishedSession> {
        if let Some(admin) = self.store.find_admin_by_email(&request.email).await? {
            if self
                .admin_hasher
                .verify(&admin.password_hash, &request.password)
            {
                let principal = Principal::admin(admin.id, &admin.name, &admin.email);
                let session = self
                    .establish_session(principal, &admin.email, ADMIN_LOGIN_ACTION)
                    .await?;

                audit_log(&AuditEvent::LoginSuccess {
                    email: admin.email,
                    role: Role::Admin.to_string(),
                });
                return Ok(session);
            }
        }

        let student = match self.store.find_student_by_email(&request.email).await? {
            Some(student) => student,
            None => {
                audit_log(&AuditEvent::LoginFailure {
                    email: request.email.clone(),
                    reason: "Email not registered".to_string(),
                });
                return Err(PortalError::EmailNotRegistered);
            }
        };

        if !self
            .student_hasher
            .verify(&student.password_hash, &request.password)
        {
            audit_log(&AuditEvent::LoginFailure {
                email: request.email.clone(),
                reason: "Invalid password".to_string(),
            });
            return Err(PortalError::InvalidPassword);
        }

        let principal = Principal::student(student.id, &student.name, &student.email);
        let session = self
            .establish_session(principal, &student.email, STUDENT_LOGIN_ACTION)
            .await?;

        audit_log(&AuditEvent::LoginSuccess {
            email: student.email,
            role: Role::Student.to_string(),
        });
        Ok(session)
    }

    async fn establish_session(
        &self,
        principal: Principal,
        email: &str,
        action: &str,
    ) -> Result<EstablishedSession> {
        let session_id = self.sessions.establish(principal.clone()).await;
        let audit_id = self.recorder.record_login(email, action).await?;
        self.sessions.set_audit_log(&session_id, audit_id).await;

        Ok(EstablishedSession {
            session_id,
            principal,
        })
    }

    /// Tear down a session
    ///
    /// The session is destroyed unconditionally, before the audit close, so
    /// logout leaves no live session even when the store is unavailable.
    /// Safe to call for sessions without an audit id.
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        let principal = self.sessions.authenticate(session_id).await;
        let audit_id = self.sessions.take_audit_log(session_id).await;
        self.sessions.teardown(session_id).await;

        audit_log(&AuditEvent::Logout {
            email: principal
                .as_ref()
                .and_then(|p| p.email().map(str::to_string)),
        });

        if let Some(audit_id) = audit_id {
            self.recorder.record_logout(audit_id).await?;
        }
        Ok(())
    }

    /// Start the reset flow
    ///
    /// Responds identically whether or not the email is registered, and the
    /// email is dispatched off the request path: neither a lookup miss, a
    /// store failure, nor a send failure changes the caller-visible
    /// outcome. Failures are logged.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let student = match self.store.find_student_by_email(email).await {
            Ok(Some(student)) => student,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::error!(email = %email, error = %e, "forgot-password lookup failed");
                return Ok(());
            }
        };

        let now = Utc::now();
        let (token, fresh) = reuse_or_issue(&student, now);

        if fresh {
            if let Err(e) = self
                .store
                .set_student_reset_token(student.id, &token.token, token.expires_at)
                .await
            {
                tracing::error!(email = %email, error = %e, "failed to persist reset token");
                return Ok(());
            }
        }

        audit_log(&AuditEvent::PasswordResetRequested {
            email: student.email.clone(),
            reused_token: !fresh,
        });

        let link = reset_link(&self.reset_link_base, &student.email, &token.token);
        let body = reset_email_body(&link);
        let mailer = self.mailer.clone();
        let to = student.email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, RESET_EMAIL_SUBJECT, &body).await {
                tracing::error!(email = %to, error = %e, "failed to send reset email");
            }
        });

        Ok(())
    }

    /// Complete the reset flow
    ///
    /// The token must match the stored one exactly and still be live; the
    /// error never says which condition failed. The password update clears
    /// both token fields, so a token is spent by its first successful use.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        validate_password_strength(&request.new_password).map_err(PortalError::Validation)?;

        let student = self
            .store
            .find_student_by_email(&request.email)
            .await?
            .ok_or(PortalError::InvalidOrExpiredToken)?;

        if !student.reset_token_matches(&request.token, Utc::now()) {
            audit_log(&AuditEvent::InvalidResetToken {
                email: request.email.clone(),
            });
            return Err(PortalError::InvalidOrExpiredToken);
        }

        let password_hash = self
            .student_hasher
            .hash(&request.new_password)
            .map_err(|e| PortalError::Other(e.into()))?;

        self.store
            .update_student_password(student.id, &password_hash)
            .await?;

        audit_log(&AuditEvent::PasswordResetCompleted {
            email: student.email,
        });
        Ok(())
    }

    /// Dispatch a reset link, surfacing failures
    ///
    /// The operator-facing variant of forgot-password: an unknown email and
    /// a failed send are both reported to the caller. Shares the
    /// reuse-or-issue token policy.
    pub async fn send_reset_link(&self, email: &str) -> Result<()> {
        let student = self
            .store
            .find_student_by_email(email)
            .await?
            .ok_or(PortalError::EmailNotRegistered)?;

        let now = Utc::now();
        let (token, fresh) = reuse_or_issue(&student, now);

        if fresh {
            self.store
                .set_student_reset_token(student.id, &token.token, token.expires_at)
                .await?;
        }

        audit_log(&AuditEvent::PasswordResetRequested {
            email: student.email.clone(),
            reused_token: !fresh,
        });

        let link = reset_link(&self.reset_link_base, &student.email, &token.token);
        self.mailer
            .send(&student.email, RESET_EMAIL_SUBJECT, &reset_email_body(&link))
            .await
            .map_err(|e| PortalError::EmailSend(e.to_string()))?;

        Ok(())
    }

    /// Create or repair the seeded admin account
    ///
    /// Run at startup. A missing row is created; a row whose stored hash is
    /// not a parseable PHC string is re-hashed from the configured
    /// password.
    pub async fn ensure_admin(&self, bootstrap: &BootstrapConfig) -> Result<()> {
        match self
            .store
            .find_admin_by_email(&bootstrap.admin_email)
            .await?
        {
            None => {
                let password_hash = self
                    .admin_hasher
                    .hash(&bootstrap.admin_password)
                    .map_err(|e| PortalError::Other(e.into()))?;

                let admin = Admin::new(
                    bootstrap.admin_name.clone(),
                    bootstrap.admin_email.clone(),
                    password_hash,
                );
                self.store.insert_admin(&admin).await?;
                tracing::info!(email = %admin.email, "seeded admin account created");
            }
            Some(admin) => {
                if !is_phc_hash(&admin.password_hash) {
                    let password_hash = self
                        .admin_hasher
                        .hash(&bootstrap.admin_password)
                        .map_err(|e| PortalError::Other(e.into()))?;

                    self.store
                        .update_admin_password(admin.id, &password_hash)
                        .await?;
                    tracing::warn!(email = %admin.email, "seeded admin password re-hashed");
                }
            }
        }

        Ok(())
    }

    /// Resolve a session id to a principal, sliding the idle window
    pub async fn authenticate(&self, session_id: &str) -> Principal {
        self.sessions
            .authenticate(session_id)
            .await
            .unwrap_or(Principal::Anonymous)
    }
}

fn reset_email_body(link: &str) -> String {
    format!(
        "<h2>Password Reset Request</h2>\
         <p>We received a request to reset your password. If this was you, click the link below:</p>\
         <p><a href='{link}'>Reset Password</a></p>\
         <p>This link will expire in 1 hour. If you did not request this, you can safely ignore this email.</p>"
    )
}
