//! In-memory stand-in for the hosted backend. Enforces row ownership the way
//! the row-level policy does: other users' résumés simply do not exist.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as SyncMutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::models::resume::{NewResumeRow, ResumeRow, ResumeTemplateRow, ResumeUpdate};
use crate::models::user::{AuthSession, AuthUser, Profile};
use crate::remote::{
    AuthEvent, AuthEventBus, AuthEventKind, AuthRemote, Remote, RemoteConnector, RemoteError,
    ResumeRemote, SignUpOutcome,
};

struct Account {
    email: String,
    password: String,
    user: AuthUser,
}

#[derive(Default)]
struct Tables {
    resumes: Vec<ResumeRow>,
    templates: Vec<ResumeTemplateRow>,
    profiles: Vec<Profile>,
    accounts: Vec<Account>,
}

#[derive(Default)]
pub struct FakeBackend {
    tables: Mutex<Tables>,
    /// Issued access tokens. Resolved synchronously by `FakeConnector`.
    tokens: SyncMutex<HashMap<String, AuthUser>>,
    pub fail_reads: AtomicBool,
    /// Makes session lookups fail as if the auth service were down.
    pub fail_auth: AtomicBool,
    pub fail_writes: AtomicBool,
    pub insert_returns_nothing: AtomicBool,
    pub calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub last_update: Mutex<Option<ResumeUpdate>>,
}

fn unavailable() -> RemoteError {
    RemoteError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

fn token_for(user: &AuthUser) -> String {
    format!("token-{}", user.id)
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn add_account(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            created_at: Some(Utc::now()),
        };
        let mut tables = self.tables.lock().await;
        tables.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user: user.clone(),
        });
        tables.profiles.push(Profile {
            id: user.id,
            email: Some(email.to_string()),
            full_name: Some(email.split('@').next().unwrap_or_default().to_string()),
            avatar_url: None,
            created_at: Some(Utc::now()),
            updated_at: None,
        });
        drop(tables);
        self.tokens
            .lock()
            .expect("token map poisoned")
            .insert(token_for(&user), user.clone());
        user
    }

    pub fn session_for(user: &AuthUser) -> AuthSession {
        AuthSession {
            access_token: token_for(user),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(3600),
            token_type: Some("bearer".to_string()),
            user: user.clone(),
        }
    }

    pub async fn add_template(&self, name: &str, order: i32) -> ResumeTemplateRow {
        let template = ResumeTemplateRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            thumbnail_url: None,
            order,
            created_at: None,
        };
        self.tables.lock().await.templates.push(template.clone());
        template
    }

    /// Seeds a row directly, bypassing ownership checks.
    pub async fn seed_resume(
        &self,
        user_id: Uuid,
        title: &str,
        content: Value,
        updated_at: DateTime<Utc>,
    ) -> ResumeRow {
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            content,
            template_id: None,
            created_at: updated_at - Duration::days(1),
            updated_at,
        };
        self.tables.lock().await.resumes.push(row.clone());
        row
    }

    pub async fn stored_resume(&self, id: Uuid) -> Option<ResumeRow> {
        self.tables
            .lock()
            .await
            .resumes
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Row and auth halves acting as `user`, or anonymously.
    pub fn parts_for(self: &Arc<Self>, user: Option<&AuthUser>) -> (Arc<FakeRows>, Arc<FakeAuth>) {
        let caller = Arc::new(Mutex::new(user.map(FakeBackend::session_for)));
        let rows = Arc::new(FakeRows {
            backend: Arc::clone(self),
            caller: Arc::clone(&caller),
        });
        let auth = Arc::new(FakeAuth {
            backend: Arc::clone(self),
            caller,
            events: AuthEventBus::new(),
        });
        (rows, auth)
    }

    pub fn remote_for(self: &Arc<Self>, user: Option<&AuthUser>) -> Remote {
        let (rows, auth) = self.parts_for(user);
        Remote { data: rows, auth }
    }

    fn user_for_token(&self, token: &str) -> Option<AuthUser> {
        self.tokens
            .lock()
            .expect("token map poisoned")
            .get(token)
            .cloned()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), RemoteError> {
        self.record_call();
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), RemoteError> {
        self.record_call();
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

type Caller = Arc<Mutex<Option<AuthSession>>>;

pub struct FakeRows {
    backend: Arc<FakeBackend>,
    caller: Caller,
}

impl FakeRows {
    async fn caller_id(&self) -> Option<Uuid> {
        self.caller.lock().await.as_ref().map(|s| s.user.id)
    }
}

#[async_trait]
impl ResumeRemote for FakeRows {
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, RemoteError> {
        self.backend.check_reads()?;
        let caller = self.caller_id().await;
        let mut rows: Vec<ResumeRow> = self
            .backend
            .tables
            .lock()
            .await
            .resumes
            .iter()
            .filter(|r| r.user_id == user_id && Some(r.user_id) == caller)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRow>, RemoteError> {
        self.backend.check_reads()?;
        let caller = self.caller_id().await;
        Ok(self
            .backend
            .tables
            .lock()
            .await
            .resumes
            .iter()
            .find(|r| r.id == id && Some(r.user_id) == caller)
            .cloned())
    }

    async fn insert_resume(&self, row: &NewResumeRow) -> Result<Option<ResumeRow>, RemoteError> {
        self.backend.check_writes()?;
        if Some(row.user_id) != self.caller_id().await {
            return Err(RemoteError::Api {
                status: 403,
                message: "new row violates row-level security policy".to_string(),
            });
        }
        if self.backend.insert_returns_nothing.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let now = Utc::now();
        let stored = ResumeRow {
            id: Uuid::new_v4(),
            user_id: row.user_id,
            title: row.title.clone(),
            content: Value::String(row.content.clone()),
            template_id: row.template_id,
            created_at: now,
            updated_at: now,
        };
        self.backend.tables.lock().await.resumes.push(stored.clone());
        Ok(Some(stored))
    }

    async fn update_resume(
        &self,
        id: Uuid,
        update: &ResumeUpdate,
    ) -> Result<Option<ResumeRow>, RemoteError> {
        self.backend.update_calls.fetch_add(1, Ordering::SeqCst);
        *self.backend.last_update.lock().await = Some(update.clone());
        self.backend.check_writes()?;
        let caller = self.caller_id().await;
        let mut tables = self.backend.tables.lock().await;
        let Some(row) = tables
            .resumes
            .iter_mut()
            .find(|r| r.id == id && Some(r.user_id) == caller)
        else {
            return Ok(None);
        };
        row.content = Value::String(update.content.clone());
        row.title = update.title.clone();
        row.updated_at = update.updated_at;
        Ok(Some(row.clone()))
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), RemoteError> {
        self.backend.check_writes()?;
        let caller = self.caller_id().await;
        self.backend
            .tables
            .lock()
            .await
            .resumes
            .retain(|r| !(r.id == id && Some(r.user_id) == caller));
        Ok(())
    }

    async fn list_templates(&self) -> Result<Vec<ResumeTemplateRow>, RemoteError> {
        self.backend.check_reads()?;
        let mut templates = self.backend.tables.lock().await.templates.clone();
        templates.sort_by_key(|t| t.order);
        Ok(templates)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, RemoteError> {
        self.backend.check_reads()?;
        Ok(self
            .backend
            .tables
            .lock()
            .await
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }
}

pub struct FakeAuth {
    backend: Arc<FakeBackend>,
    caller: Caller,
    events: AuthEventBus,
}

impl FakeAuth {
    /// Pushes a notification as if the hosted service had sent it.
    pub fn emit(&self, kind: AuthEventKind, session: Option<AuthSession>) {
        self.events.emit(kind, session);
    }
}

#[async_trait]
impl AuthRemote for FakeAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, RemoteError> {
        let user = {
            let tables = self.backend.tables.lock().await;
            tables
                .accounts
                .iter()
                .find(|a| a.email == email && a.password == password)
                .map(|a| a.user.clone())
        };
        let Some(user) = user else {
            return Err(RemoteError::Api {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        };
        let session = FakeBackend::session_for(&user);
        *self.caller.lock().await = Some(session.clone());
        self.events.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        let exists = self
            .backend
            .tables
            .lock()
            .await
            .accounts
            .iter()
            .any(|a| a.email == email);
        if exists {
            return Err(RemoteError::Api {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let user = self.backend.add_account(email, password).await;
        Ok(SignUpOutcome::ConfirmationRequired(user))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        *self.caller.lock().await = None;
        self.events.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        if self.backend.fail_auth.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.caller.lock().await.clone())
    }

    /// Accepts issued tokens as codes. Like the PKCE grant, a code without a
    /// verifier is rejected.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, RemoteError> {
        if code_verifier.map_or(true, str::is_empty) {
            return Err(RemoteError::Api {
                status: 400,
                message: "code challenge does not match previously saved code verifier"
                    .to_string(),
            });
        }
        let user = self.backend.user_for_token(code);
        let Some(user) = user else {
            return Err(RemoteError::Api {
                status: 400,
                message: "invalid flow state".to_string(),
            });
        };
        let session = FakeBackend::session_for(&user);
        *self.caller.lock().await = Some(session.clone());
        self.events.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

/// Resolves bearer tokens issued by `FakeBackend::session_for`.
pub struct FakeConnector {
    pub backend: Arc<FakeBackend>,
}

impl RemoteConnector for FakeConnector {
    fn connect(&self, access_token: Option<&str>) -> Remote {
        let user = access_token.and_then(|token| self.backend.user_for_token(token));
        self.backend.remote_for(user.as_ref())
    }
}
