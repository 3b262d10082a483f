//! Remote collaborator ports.
//!
//! The stores never talk HTTP themselves: they hold `Arc<dyn ResumeRemote>` and
//! `Arc<dyn AuthRemote>`, wired up by a `RemoteConnector`. The production
//! adapter lives in `supabase`; tests use the in-memory `fake`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::resume::{NewResumeRow, ResumeRow, ResumeTemplateRow, ResumeUpdate};
use crate::models::user::{AuthSession, AuthUser, Profile};

pub mod supabase;

#[cfg(test)]
pub mod fake;

const AUTH_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

impl RemoteError {
    /// The message worth showing to a user: the server's own text for API
    /// errors, the display form otherwise.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Api { status: 401 | 403, .. })
    }
}

/// Row CRUD against `resumes`, `resume_templates` and `profiles`.
///
/// Row visibility is decided by the server's row-level policy: a row owned by
/// someone else is indistinguishable from a missing one.
#[async_trait]
pub trait ResumeRemote: Send + Sync {
    /// Rows owned by `user_id`, newest `updated_at` first.
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, RemoteError>;

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, RemoteError>;

    /// Returns the inserted row, or `None` if the server returned none.
    async fn insert_resume(&self, row: &NewResumeRow) -> Result<Option<ResumeRow>, RemoteError>;

    /// Unconditional update keyed by id. Returns the stored row, if any.
    async fn update_resume(
        &self,
        id: Uuid,
        update: &ResumeUpdate,
    ) -> Result<Option<ResumeRow>, RemoteError>;

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError>;

    /// The template catalog ordered by its `order` column.
    async fn list_templates(&self) -> Result<Vec<ResumeTemplateRow>, RemoteError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RemoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// An auth-state change pushed to subscribers, with the session current at
/// the time it fired.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The account exists but must confirm its email before signing in.
    ConfirmationRequired(AuthUser),
}

#[async_trait]
pub trait AuthRemote: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, RemoteError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// The current session, or `None` when anonymous.
    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError>;

    /// Completes an OAuth / magic-link redirect.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, RemoteError>;

    /// Auth-state notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Both ports bound to one caller identity.
#[derive(Clone)]
pub struct Remote {
    pub data: Arc<dyn ResumeRemote>,
    pub auth: Arc<dyn AuthRemote>,
}

/// Builds a `Remote` for a caller, optionally carrying their access token.
pub trait RemoteConnector: Send + Sync {
    fn connect(&self, access_token: Option<&str>) -> Remote;
}

/// Fan-out for auth-state notifications, shared by the auth adapters.
#[derive(Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, kind: AuthEventKind, session: Option<AuthSession>) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.sender.send(AuthEvent { kind, session });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = RemoteError::Api {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid login credentials");

        let empty = RemoteError::Api {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.user_message(), "API error (status 500): ");
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(RemoteError::Api { status: 401, message: String::new() }.is_unauthorized());
        assert!(!RemoteError::RateLimited { retries: 3 }.is_unauthorized());
    }

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscribers() {
        let bus = AuthEventBus::new();
        bus.emit(AuthEventKind::SignedOut, None);

        let mut rx = bus.subscribe();
        bus.emit(AuthEventKind::SignedOut, None);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedOut);
        assert!(event.session.is_none());
    }
}
