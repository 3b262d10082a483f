use std::sync::{Arc, Weak};

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::user::{AuthSession, AuthUser, Profile};
use crate::remote::{AuthEvent, AuthEventKind, AuthRemote, Remote, ResumeRemote, SignUpOutcome};

use super::ResumeError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Identity {
    /// Nothing resolved yet.
    #[default]
    Loading,
    Anonymous,
    Authenticated(AuthUser),
}

impl Identity {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Identity::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Identity,
    pub profile: Option<Profile>,
    /// True until the first session check or auth event resolves, then false
    /// for the lifetime of the store.
    pub is_loading_auth: bool,
    pub is_loading_profile: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: Identity::Loading,
            profile: None,
            is_loading_auth: true,
            is_loading_profile: false,
        }
    }
}

struct SessionInner {
    auth: Arc<dyn AuthRemote>,
    rows: Arc<dyn ResumeRemote>,
    state: watch::Sender<SessionState>,
}

/// Handle for the auth-event listener. Dropping it stops the listener.
pub struct AuthSubscription {
    handle: JoinHandle<()>,
}

impl AuthSubscription {
    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Tracks who the caller is and their profile row.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    pub fn new(remote: &Remote) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(SessionInner {
                auth: Arc::clone(&remote.auth),
                rows: Arc::clone(&remote.data),
                state,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.inner.state.borrow().identity.user().cloned()
    }

    /// Starts listening for auth events, then resolves the session already
    /// present, if any.
    pub async fn start(&self) -> AuthSubscription {
        let subscription = self.listen();
        // Failures are logged by the check and leave the caller anonymous.
        let _ = self.check_initial_session().await;
        subscription
    }

    /// Spawns the auth-event listener. It holds only a weak reference to the
    /// store, so events arriving after the store is gone are ignored.
    pub fn listen(&self) -> AuthSubscription {
        let mut events = self.inner.auth.subscribe();
        let store: Weak<SessionInner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let Some(inner) = store.upgrade() else {
                            debug!("Session store dropped, ignoring {:?}", event.kind);
                            break;
                        };
                        inner.handle_auth_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Auth listener lagged, skipped {skipped} event(s)");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        AuthSubscription { handle }
    }

    /// Resolves the caller from the session the auth service reports. A
    /// rejected token resolves to anonymous; any other failure also leaves the
    /// caller anonymous but is returned as `LoadFailed`, since nothing is known
    /// about who they are.
    pub async fn check_initial_session(&self) -> Result<(), ResumeError> {
        let outcome = match self.inner.auth.get_session().await {
            Ok(Some(session)) => {
                self.inner.sign_in_session(&session).await;
                Ok(())
            }
            Ok(None) => {
                self.inner.set_anonymous();
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                debug!("Session token rejected: {e}");
                self.inner.set_anonymous();
                Ok(())
            }
            Err(e) => {
                warn!("Initial session check failed: {e}");
                self.inner.set_anonymous();
                Err(ResumeError::LoadFailed(e.user_message()))
            }
        };
        self.inner.finish_auth_loading();
        outcome
    }

    pub async fn fetch_user_profile(&self, user_id: Uuid) -> Option<Profile> {
        self.inner.fetch_user_profile(user_id).await
    }

    pub fn set_user_and_profile(&self, user: Option<AuthUser>, profile: Option<Profile>) {
        self.inner.set_user_and_profile(user, profile);
    }

    pub fn clear_user_session(&self) {
        self.inner.set_anonymous();
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, ResumeError> {
        let session = self
            .inner
            .auth
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                info!("Sign-in rejected for {email}: {e}");
                ResumeError::AuthFailed(e.user_message())
            })?;
        self.inner.sign_in_session(&session).await;
        self.inner.finish_auth_loading();
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, ResumeError> {
        let outcome = self.inner.auth.sign_up(email, password).await.map_err(|e| {
            info!("Sign-up rejected for {email}: {e}");
            ResumeError::AuthFailed(e.user_message())
        })?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.inner.sign_in_session(session).await;
            self.inner.finish_auth_loading();
        }
        Ok(outcome)
    }

    pub async fn sign_out(&self) -> Result<(), ResumeError> {
        self.inner
            .auth
            .sign_out()
            .await
            .map_err(|e| ResumeError::AuthFailed(e.user_message()))?;
        self.inner.set_anonymous();
        self.inner.finish_auth_loading();
        Ok(())
    }

    /// Completes a PKCE redirect with the verifier the browser kept when it
    /// started the flow.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, ResumeError> {
        let session = self
            .inner
            .auth
            .exchange_code_for_session(code, code_verifier)
            .await
            .map_err(|e| {
                warn!("Auth code exchange failed: {e}");
                ResumeError::AuthFailed(e.user_message())
            })?;
        self.inner.sign_in_session(&session).await;
        self.inner.finish_auth_loading();
        Ok(session)
    }
}

impl SessionInner {
    async fn handle_auth_event(&self, event: AuthEvent) {
        debug!("Auth event {:?}", event.kind);
        match (event.kind, event.session) {
            (AuthEventKind::SignedOut, _) => self.set_anonymous(),
            (_, Some(session)) => self.sign_in_session(&session).await,
            (AuthEventKind::InitialSession, None) => self.set_anonymous(),
            (kind, None) => debug!("Ignoring {kind:?} without a session"),
        }
        self.finish_auth_loading();
    }

    async fn sign_in_session(&self, session: &AuthSession) {
        let profile = self.fetch_user_profile(session.user.id).await;
        self.set_user_and_profile(Some(session.user.clone()), profile);
    }

    /// A missing or unreadable profile leaves `profile` empty; identity is
    /// unaffected.
    async fn fetch_user_profile(&self, user_id: Uuid) -> Option<Profile> {
        self.state.send_modify(|s| s.is_loading_profile = true);

        let profile = match self.rows.get_profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Failed to load profile for {user_id}: {e}");
                None
            }
        };

        self.state.send_modify(|s| {
            s.profile = profile.clone();
            s.is_loading_profile = false;
        });
        profile
    }

    fn set_user_and_profile(&self, user: Option<AuthUser>, profile: Option<Profile>) {
        self.state.send_modify(|s| {
            s.identity = match user {
                Some(user) => Identity::Authenticated(user),
                None => Identity::Anonymous,
            };
            s.profile = profile;
        });
    }

    fn set_anonymous(&self) {
        self.set_user_and_profile(None, None);
    }

    fn finish_auth_loading(&self) {
        self.state.send_if_modified(|s| std::mem::replace(&mut s.is_loading_auth, false));
    }
}
