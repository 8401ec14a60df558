use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{error::ApiError, models::Role, state::AppState};

pub const SESSION_COOKIE: &str = "roomstay_session";
const SESSION_DAYS: i64 = 30;

/// Where the SPA sends visitors without a usable session.
const SIGNED_OUT_TARGET: &str = "/signup";

/// The authenticated caller, resolved once per request and passed to
/// whatever needs it. Never looked up ambiently past this point.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Outcome of the capability check for a route.
#[derive(Clone, Debug)]
pub enum Access {
    Allowed(SessionUser),
    DeniedRedirect(&'static str),
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub async fn create_session(pool: &SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let session_id = new_id();
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(SESSION_DAYS);

    sqlx::query(
        r#"INSERT INTO sessions (id, user_id, created_at, expires_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(now.to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(session_id)
}

pub async fn destroy_session(pool: &SqlitePool, session_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve the request's session cookie to a user. Expired sessions are
/// removed on sight and read as signed out.
pub async fn identify(req: &HttpRequest, pool: &SqlitePool) -> Result<Option<SessionUser>, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Ok(None);
    };

    let row = sqlx::query_as::<_, (String, String, String, String, String)>(
        r#"SELECT u.id, u.name, u.email, u.role, s.expires_at
           FROM sessions s
           JOIN users u ON s.user_id = u.id
           WHERE s.id = ?
           LIMIT 1"#,
    )
    .bind(cookie.value())
    .fetch_optional(pool)
    .await?;

    let Some((id, name, email, role, expires_at)) = row else {
        return Ok(None);
    };

    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|expiry| expiry < Utc::now())
        .unwrap_or(true);
    if expired {
        destroy_session(pool, cookie.value()).await?;
        return Ok(None);
    }

    let Some(role) = Role::parse(&role) else {
        log::warn!("User {id} has unknown role {role:?}");
        return Ok(None);
    };

    Ok(Some(SessionUser { id, name, email, role }))
}

/// The one place route access is decided. Handlers receive `Allowed` with
/// the user, or the redirect target for the signed-out experience.
pub fn authorize(user: Option<SessionUser>, required: Option<Role>) -> Access {
    match user {
        None => Access::DeniedRedirect(SIGNED_OUT_TARGET),
        Some(user) => match required {
            Some(role) if user.role != role => Access::DeniedRedirect(SIGNED_OUT_TARGET),
            _ => Access::Allowed(user),
        },
    }
}

pub async fn require_user(req: &HttpRequest, state: &AppState) -> Result<SessionUser, ApiError> {
    require_role(req, state, None).await
}

pub async fn require_admin(req: &HttpRequest, state: &AppState) -> Result<SessionUser, ApiError> {
    require_role(req, state, Some(Role::Admin)).await
}

async fn require_role(
    req: &HttpRequest,
    state: &AppState,
    required: Option<Role>,
) -> Result<SessionUser, ApiError> {
    let user = identify(req, &state.db).await?;
    let had_session = user.is_some();
    match authorize(user, required) {
        Access::Allowed(user) => Ok(user),
        Access::DeniedRedirect(redirect) => Err(if had_session {
            ApiError::Forbidden { redirect }
        } else {
            ApiError::Unauthorized { redirect }
        }),
    }
}

pub fn session_cookie(req: &HttpRequest, session_id: String) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, session_id)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(SESSION_DAYS));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}
