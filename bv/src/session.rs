//! Operator sessions and login
//!
//! A [`Session`] exists only between a successful login and the matching
//! logout. It owns the stage cache outright; the pipeline borrows it for the
//! duration of one trigger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::StageCache;
use crate::config::AuthConfig;

/// One authenticated interaction sequence
#[derive(Debug)]
pub struct Session {
    id: String,
    username: String,
    started_at: DateTime<Utc>,
    company_url: Option<String>,
    cache: StageCache,
}

impl Session {
    fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            username: username.into(),
            started_at: Utc::now(),
            company_url: None,
            cache: StageCache::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// URL of the last successful fetch
    pub fn company_url(&self) -> Option<&str> {
        self.company_url.as_deref()
    }

    pub(crate) fn set_company_url(&mut self, url: impl Into<String>) {
        self.company_url = Some(url.into());
    }

    pub fn cache(&self) -> &StageCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut StageCache {
        &mut self.cache
    }

    /// End the session, dropping every cached result
    pub fn logout(mut self) {
        info!(session = %self.id, user = %self.username, "Session logged out");
        self.cache.clear();
        self.company_url = None;
    }
}

/// Login failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Checks logins against the static username -> password map
#[derive(Debug, Clone)]
pub struct Authenticator {
    users: BTreeMap<String, String>,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        if config.users.is_empty() {
            warn!("No users configured; any username is accepted");
        }
        Self {
            users: config.users.clone(),
        }
    }

    /// True when no user list is configured and every login succeeds
    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }

    /// Start a fresh session for valid credentials
    pub fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        debug!(%username, "Authenticator::login: called");
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        if !self.is_open() {
            match self.users.get(username) {
                Some(expected) if expected == password => {}
                _ => {
                    warn!(%username, "Login rejected");
                    return Err(AuthError::InvalidCredentials);
                }
            }
        }

        let session = Session::new(username);
        info!(session = %session.id, user = %username, "Session started");
        Ok(session)
    }
}
