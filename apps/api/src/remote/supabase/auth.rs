//! GoTrue client: password sign-in, sign-up, sign-out, session lookup and
//! PKCE code exchange. Each successful transition is announced on the
//! client's `AuthEventBus`, the same way the browser SDK does.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::models::user::{AuthSession, AuthUser};
use crate::remote::{AuthEvent, AuthEventBus, AuthEventKind, AuthRemote, RemoteError, SignUpOutcome};

use super::{AccessToken, SupabaseConfig};

/// GoTrue reports errors under a handful of different keys depending on the
/// endpoint and version.
#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

pub struct GoTrueClient {
    http: Client,
    config: SupabaseConfig,
    access_token: AccessToken,
    session: RwLock<Option<AuthSession>>,
    events: AuthEventBus,
}

impl GoTrueClient {
    pub fn new(http: Client, config: SupabaseConfig, access_token: AccessToken) -> Self {
        Self {
            http,
            config,
            access_token,
            session: RwLock::new(None),
            events: AuthEventBus::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<AuthSession, RemoteError> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn store_session(&self, session: &AuthSession) {
        *self.access_token.write().await = Some(session.access_token.clone());
        *self.session.write().await = Some(session.clone());
    }

    async fn clear_session(&self) {
        *self.access_token.write().await = None;
        *self.session.write().await = None;
    }

    async fn signed_in(&self, session: AuthSession) -> AuthSession {
        self.store_session(&session).await;
        info!("User {} signed in", session.user.id);
        self.events.emit(AuthEventKind::SignedIn, Some(session.clone()));
        session
    }
}

#[async_trait]
impl AuthRemote for GoTrueClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, RemoteError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        Ok(self.signed_in(session).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, RemoteError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = read_json(response).await?;

        // With email confirmation enabled GoTrue answers with the bare user.
        if body.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(body)?;
            Ok(SignUpOutcome::SignedIn(self.signed_in(session).await))
        } else {
            let user: AuthUser = serde_json::from_value(body)?;
            info!("User {} signed up, awaiting email confirmation", user.id);
            Ok(SignUpOutcome::ConfirmationRequired(user))
        }
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let token = self.access_token.read().await.clone();
        if let Some(token) = token {
            let response = self
                .http
                .post(self.endpoint("logout"))
                .header("apikey", &self.config.anon_key)
                .header("Authorization", format!("Bearer {token}"))
                .send()
                .await?;
            if let Err(e) = check_status(response).await {
                // An expired token is already signed out as far as we care.
                if !e.is_unauthorized() {
                    return Err(e);
                }
                debug!("Logout with stale token: {e}");
            }
        }
        self.clear_session().await;
        self.events.emit(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, RemoteError> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(Some(session));
        }
        let Some(token) = self.access_token.read().await.clone() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await?;
        let user: AuthUser = match read_json(response).await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => {
                warn!("Access token rejected, treating caller as anonymous");
                self.clear_session().await;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let session = AuthSession {
            access_token: token,
            refresh_token: None,
            expires_in: None,
            token_type: Some("bearer".to_string()),
            user,
        };
        *self.session.write().await = Some(session.clone());
        Ok(Some(session))
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, RemoteError> {
        let session = self
            .token_grant(
                "pkce",
                json!({ "auth_code": code, "code_verifier": code_verifier }),
            )
            .await?;
        Ok(self.signed_in(session).await)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoTrueError>(&body)
        .ok()
        .and_then(GoTrueError::into_message)
        .unwrap_or(body);
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let response = check_status(response).await?;
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}
