use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::user::{AuthSession, AuthUser, Profile};
use crate::remote::SignUpOutcome;
use crate::routes::caller::{
    access_token, clear_session_cookie, code_verifier, session_cookie, Caller,
};
use crate::state::AppState;
use crate::store::SessionStore;

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: AuthUser,
    pub profile: Option<Profile>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

impl SessionResponse {
    fn new(session: AuthSession, profile: Option<Profile>) -> Self {
        Self {
            user: session.user,
            profile,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct ConfirmationResponse {
    pub user: AuthUser,
    pub confirmation_required: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: AuthUser,
    pub profile: Option<Profile>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("유효한 이메일을 입력해주세요.".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(
            "비밀번호는 최소 6자 이상이어야 합니다.".to_string(),
        ));
    }
    Ok(())
}

const DEFAULT_REDIRECT: &str = "/dashboard";

/// Same-site paths only; anything else lands on the dashboard.
///
/// Browsers read `\` as `/`, so `/\host` is as much a network path as
/// `//host`. The target must also be usable as a `Location` header.
fn redirect_target(next: Option<&str>) -> &str {
    let Some(path) = next else {
        return DEFAULT_REDIRECT;
    };
    let is_plain_path = path.starts_with('/')
        && !path.contains('\\')
        && !path[1..].starts_with('/')
        && HeaderValue::from_str(path).is_ok()
        && path
            .parse::<Uri>()
            .map(|uri| uri.scheme().is_none() && uri.authority().is_none())
            .unwrap_or(false);
    if is_plain_path {
        path
    } else {
        DEFAULT_REDIRECT
    }
}

fn signed_in(session: AuthSession, store: &SessionStore) -> Response {
    let cookie = session_cookie(&session.access_token);
    let body = SessionResponse::new(session, store.snapshot().profile);
    ([(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

/// POST /auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim();
    validate_credentials(email, &req.password)?;

    let store = SessionStore::new(&state.remote(None));
    let session = store.sign_in(email, &req.password).await?;
    Ok(signed_in(session, &store))
}

/// POST /auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let email = req.email.trim();
    validate_credentials(email, &req.password)?;
    if req.password != req.password_confirm {
        return Err(AppError::Validation("비밀번호가 일치하지 않습니다.".to_string()));
    }

    let store = SessionStore::new(&state.remote(None));
    match store.sign_up(email, &req.password).await? {
        SignUpOutcome::SignedIn(session) => Ok(signed_in(session, &store)),
        SignUpOutcome::ConfirmationRequired(user) => {
            info!("Signup for {} awaits email confirmation", user.id);
            let body = ConfirmationResponse {
                user,
                confirmation_required: true,
                message: "이메일을 확인하여 가입을 완료해주세요.".to_string(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

/// POST /auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = access_token(&headers) {
        SessionStore::new(&state.remote(Some(&token)))
            .sign_out()
            .await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response())
}

/// GET /auth/callback?code&next
pub async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("Auth callback without a code");
        return Redirect::to("/login?error=auth_callback_no_code").into_response();
    };

    let store = SessionStore::new(&state.remote(None));
    let verifier = code_verifier(&headers);
    match store.exchange_code(&code, verifier.as_deref()).await {
        Ok(session) => {
            let target = redirect_target(params.next.as_deref());
            (
                [(header::SET_COOKIE, session_cookie(&session.access_token))],
                Redirect::to(target),
            )
                .into_response()
        }
        Err(_) => Redirect::to("/login?error=auth_callback_failed").into_response(),
    }
}

/// GET /api/v1/me
pub async fn handle_me(caller: Caller) -> Json<MeResponse> {
    Json(MeResponse {
        profile: caller.session.snapshot().profile,
        user: caller.user,
    })
}
