use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};

use crate::errors::AppError;
use crate::models::user::AuthUser;
use crate::remote::Remote;
use crate::state::AppState;
use crate::store::{ContentStore, SessionStore};

pub const SESSION_COOKIE: &str = "sb-access-token";
const CODE_VERIFIER_SUFFIX: &str = "-auth-token-code-verifier";

/// The bearer token of a request: the `Authorization` header, falling back to
/// the session cookie set at login.
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    find_cookie(headers, |name| name == SESSION_COOKIE).map(str::to_string)
}

fn find_cookie<'a>(headers: &'a HeaderMap, matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| matches(*name) && !value.is_empty())
        .map(|(_, value)| value)
}

/// The PKCE verifier the browser client stored when it started the sign-in
/// redirect, from the `sb-<project>-auth-token-code-verifier` cookie. The
/// client may store it JSON-quoted, raw or percent-encoded.
pub fn code_verifier(headers: &HeaderMap) -> Option<String> {
    let raw = find_cookie(headers, |name| {
        name.starts_with("sb-") && name.ends_with(CODE_VERIFIER_SUFFIX)
    })?;
    let verifier = raw
        .replace("%22", "\"")
        .trim_matches('"')
        .to_string();
    (!verifier.is_empty()).then_some(verifier)
}

pub fn session_cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Lax"
    ))
    .unwrap_or_else(|_| clear_session_cookie())
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "sb-access-token=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0",
    )
}

/// An authenticated caller with remotes bound to their token. Rejects with
/// 401 when the request carries no token or the token is not accepted, and
/// with 502 when the auth service cannot be reached.
pub struct Caller {
    pub remote: Remote,
    pub session: SessionStore,
    pub user: AuthUser,
}

impl Caller {
    pub fn content_store(&self) -> ContentStore {
        ContentStore::new(self.remote.data.clone())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = access_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let remote = state.remote(Some(&token));
        let session = SessionStore::new(&remote);
        session.check_initial_session().await?;
        let user = session.current_user().ok_or(AppError::Unauthorized)?;
        Ok(Caller {
            remote,
            session,
            user,
        })
    }
}
