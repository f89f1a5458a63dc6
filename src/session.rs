// ABOUTME: Session tokens persisted by hash, plus the HttpOnly cookie that carries them
// ABOUTME: Tokens are accepted from the cookie or from an Authorization bearer header

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::crypto::{generate_token, hash_token};
use crate::entities::{auth_token, user};
use crate::error::{AppError, Result};
use crate::utils::new_record_id;

pub const SESSION_COOKIE_NAME: &str = "stockroom_session";

/// Issues a fresh token for the user. The raw value is returned once and never stored.
pub async fn issue_token<C: ConnectionTrait>(db: &C, user_id: &str, ttl_hours: i64) -> Result<String> {
    let token = generate_token();
    let now = chrono::Utc::now().timestamp();

    auth_token::ActiveModel {
        id: Set(new_record_id()),
        user_id: Set(user_id.to_string()),
        token_hash: Set(hash_token(&token)),
        expires_at: Set(now + ttl_hours * 3600),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(token)
}

/// Resolves a raw token to its user. Expired tokens are removed on sight.
pub async fn resolve_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<user::Model> {
    let stored = auth_token::Entity::find()
        .filter(auth_token::Column::TokenHash.eq(hash_token(token)))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

    if stored.expires_at <= chrono::Utc::now().timestamp() {
        auth_token::Entity::delete_by_id(stored.id).exec(db).await?;
        return Err(AppError::Unauthorized("Session expired".to_string()));
    }

    user::Entity::find_by_id(stored.user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))
}

pub async fn revoke_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<()> {
    auth_token::Entity::delete_many()
        .filter(auth_token::Column::TokenHash.eq(hash_token(token)))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn purge_expired<C: ConnectionTrait>(db: &C) -> Result<u64> {
    let result = auth_token::Entity::delete_many()
        .filter(auth_token::Column::ExpiresAt.lte(chrono::Utc::now().timestamp()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Bearer header wins over the cookie when both are present.
pub fn token_from_request(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        jar.get(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

pub fn create_session_cookie(token: String, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::hours(ttl_hours))
        .path("/")
        .build()
}

pub fn create_logout_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(0))
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, "from-cookie"));

        assert_eq!(token_from_request(&headers, &jar).as_deref(), Some("from-header"));
        assert_eq!(
            token_from_request(&HeaderMap::new(), &jar).as_deref(),
            Some("from-cookie")
        );
        assert_eq!(token_from_request(&HeaderMap::new(), &CookieJar::new()), None);
    }

    #[test]
    fn test_session_cookie_flags() {
        let cookie = create_session_cookie("tok".to_string(), 2, true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(2)));

        let logout = create_logout_cookie();
        assert_eq!(logout.value(), "");
        assert_eq!(logout.max_age(), Some(time::Duration::ZERO));
    }
}
