//! Anti-forgery (CSRF) token storage over a session collaborator.
//!
//! The store is a thin pass-through: it starts the session, then reads or
//! writes the cookie token under a fixed key. Session transport (cookies,
//! server-side storage) belongs to the host application.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Session key under which the cookie token is kept.
pub const TOKEN_KEY: &str = "warden.antiforgery.token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session '{0}' has not been started")]
    NotStarted(String),

    #[error("session unavailable: {0}")]
    Unavailable(String),
}

/// Session collaborator, keyed by opaque names.
pub trait Session: Send + Sync {
    /// Start (or resume) the session. Idempotent.
    fn start(&self) -> Result<(), SessionError>;

    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set(&self, key: &str, value: String) -> Result<(), SessionError>;
}

/// Process-local session, mainly for tests and single-node hosts.
#[derive(Debug, Default)]
pub struct InMemorySession {
    name: String,
    started: AtomicBool,
    values: Mutex<HashMap<String, String>>,
}

impl InMemorySession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_started(&self) -> Result<(), SessionError> {
        if self.started.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SessionError::NotStarted(self.name.clone()))
        }
    }
}

impl Session for InMemorySession {
    fn start(&self) -> Result<(), SessionError> {
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.ensure_started()?;
        let values = self
            .values
            .lock()
            .map_err(|_| SessionError::Unavailable("poisoned session lock".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.ensure_started()?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| SessionError::Unavailable("poisoned session lock".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiForgeryOptions {
    /// Name of the cookie (and session) carrying the token.
    pub cookie_name: String,
}

impl Default for AntiForgeryOptions {
    fn default() -> Self {
        Self {
            cookie_name: "warden.csrf".to_string(),
        }
    }
}

impl AntiForgeryOptions {
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

/// A random anti-forgery token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AntiForgeryToken(String);

impl AntiForgeryToken {
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn from_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison with a submitted token value.
    pub fn matches(&self, submitted: &str) -> bool {
        bool::from(self.0.as_bytes().ct_eq(submitted.as_bytes()))
    }
}

impl core::fmt::Debug for AntiForgeryToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AntiForgeryToken(***)")
    }
}

/// Stores the cookie half of the anti-forgery token pair in a session.
#[derive(Debug)]
pub struct AntiForgeryTokenStore<S: Session> {
    options: AntiForgeryOptions,
    session: S,
}

impl AntiForgeryTokenStore<InMemorySession> {
    /// Store backed by an in-memory session named after the cookie.
    pub fn in_memory(options: AntiForgeryOptions) -> Self {
        let session = InMemorySession::new(options.cookie_name.clone());
        Self { options, session }
    }
}

impl<S: Session> AntiForgeryTokenStore<S> {
    pub fn new(options: AntiForgeryOptions, session: S) -> Self {
        Self { options, session }
    }

    pub fn options(&self) -> &AntiForgeryOptions {
        &self.options
    }

    pub fn save_cookie_token(&self, token: &AntiForgeryToken) -> Result<(), SessionError> {
        self.session.start()?;
        self.session.set(TOKEN_KEY, token.value().to_string())?;
        debug!(cookie = %self.options.cookie_name, "anti-forgery token saved");
        Ok(())
    }

    pub fn get_cookie_token(&self) -> Result<Option<AntiForgeryToken>, SessionError> {
        self.session.start()?;
        Ok(self.session.get(TOKEN_KEY)?.map(AntiForgeryToken::from_value))
    }

    /// Whether a submitted request token matches the stored cookie token.
    ///
    /// False when no cookie token has been stored.
    pub fn validate_request_token(&self, submitted: &str) -> Result<bool, SessionError> {
        Ok(self
            .get_cookie_token()?
            .is_some_and(|token| token.matches(submitted)))
    }
}
