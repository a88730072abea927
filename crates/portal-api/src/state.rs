//! Application state management

use crate::auth::{AccountService, SessionStore};
use portal_core::{AppConfig, Datastore, EmailSender};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Durable storage collaborator
    pub store: Arc<dyn Datastore>,
    /// Outbound email collaborator
    pub mailer: Arc<dyn EmailSender>,
    /// Session authority
    pub sessions: Arc<SessionStore>,
    /// Account lifecycle service
    pub accounts: AccountService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state with config and collaborators
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Datastore>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.session.idle_minutes));
        let accounts =
            AccountService::new(store.clone(), mailer.clone(), sessions.clone(), &config);

        Self {
            config,
            store,
            mailer,
            sessions,
            accounts,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
