//! Server-side session authority
//!
//! Sessions are opaque random ids mapped to a principal, the id of the
//! audit row the login opened, and a sliding idle deadline. Lookups extend
//! the deadline; teardown invalidates immediately, so a request bearing a
//! torn-down id is anonymous from that point on. The audit id is
//! session-local: concurrent logins by one user each hold their own row.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use portal_core::Principal;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct SessionEntry {
    principal: Principal,
    audit_log_id: Option<i64>,
    expires_at: DateTime<Utc>,
}

/// In-memory session store with sliding idle expiry
pub struct SessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
    idle: Duration,
}

impl SessionStore {
    pub fn new(idle_minutes: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle: Duration::minutes(idle_minutes),
        }
    }

    fn generate_id() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Mint a session for an authenticated principal and return its opaque id
    pub async fn establish(&self, principal: Principal) -> String {
        self.establish_at(principal, Utc::now()).await
    }

    async fn establish_at(&self, principal: Principal, now: DateTime<Utc>) -> String {
        let id = Self::generate_id();
        let mut entries = self.entries.write().await;
        entries.insert(
            id.clone(),
            SessionEntry {
                principal,
                audit_log_id: None,
                expires_at: now + self.idle,
            },
        );
        id
    }

    /// Resolve a session id to its principal, sliding the idle window
    ///
    /// An unknown or expired id yields `None`; expired entries are removed
    /// on the spot.
    pub async fn authenticate(&self, id: &str) -> Option<Principal> {
        self.authenticate_at(id, Utc::now()).await
    }

    async fn authenticate_at(&self, id: &str, now: DateTime<Utc>) -> Option<Principal> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) if now < entry.expires_at => {
                entry.expires_at = now + self.idle;
                Some(entry.principal.clone())
            }
            Some(_) => {
                entries.remove(id);
                None
            }
            None => None,
        }
    }

    /// Stash the id of the audit row this session's login opened
    pub async fn set_audit_log(&self, id: &str, audit_log_id: i64) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(id) {
            entry.audit_log_id = Some(audit_log_id);
        }
    }

    /// Take the stashed audit id, if the session holds one
    pub async fn take_audit_log(&self, id: &str) -> Option<i64> {
        let mut entries = self.entries.write().await;
        entries.get_mut(id).and_then(|entry| entry.audit_log_id.take())
    }

    /// Invalidate a session immediately; unknown ids are a no-op
    pub async fn teardown(&self, id: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(id);
    }

    /// Number of live entries (expired-but-unswept entries included)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
