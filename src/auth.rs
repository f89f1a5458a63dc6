// ABOUTME: Email and password authentication with bearer or cookie session tokens
// ABOUTME: Provides register/login/logout/me handlers and the AuthUser request extractor

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::Json,
};
use axum_extra::extract::cookie::CookieJar;

use crate::entities::user;
use crate::error::{AppError, Result};
use crate::extract::Payload;
use crate::mutators::UserMutator;
use crate::types::{AuthResponse, SuccessResponse};
use crate::{session, AppState};

/// The authenticated caller, resolved from a bearer header or the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session::token_from_request(&parts.headers, &jar)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let user = session::resolve_token(&state.storage.db, &token).await?;
        Ok(AuthUser(user))
    }
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(body): Payload,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let user = UserMutator::new(&state.storage.db).create(&body).await?;
    let (jar, token) = start_session(&state, jar, &user).await?;

    Ok((StatusCode::CREATED, jar, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Payload(body): Payload,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let user = UserMutator::new(&state.storage.db)
        .authenticate(&body)
        .await?;
    let (jar, token) = start_session(&state, jar, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok((jar, Json(AuthResponse { token, user })))
}

/// Revokes the presented token, if any, and clears the cookie. Always succeeds.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SuccessResponse>)> {
    if let Some(token) = session::token_from_request(&headers, &jar) {
        session::revoke_token(&state.storage.db, &token).await?;
    }

    let jar = jar.add(session::create_logout_cookie());
    Ok((jar, Json(SuccessResponse { success: true })))
}

pub async fn me(auth: AuthUser) -> Json<user::Model> {
    Json(auth.0)
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &user::Model,
) -> Result<(CookieJar, String)> {
    let ttl = state.config.session_ttl_hours;
    let token = session::issue_token(&state.storage.db, &user.id, ttl).await?;

    let cookie = session::create_session_cookie(token.clone(), ttl, state.config.secure_cookies);
    Ok((jar.add(cookie), token))
}
