use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{
        clear_session_cookie, create_session, destroy_session, hash_password, new_id,
        require_user, session_cookie, verify_password, SESSION_COOKIE,
    },
    db::log_activity,
    error::ApiError,
    models::{Role, UserProfile, UserRow},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct SignupPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(email(message = "A valid email is required"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    email: String,
    password: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(web::resource("/signup").route(web::post().to(signup)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(web::resource("/logout").route(web::post().to(logout)))
            .service(web::resource("/me").route(web::get().to(me))),
    );
}

async fn signup(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<SignupPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    payload.validate()?;

    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }

    let taken = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if taken.is_some() {
        return Err(ApiError::Validation("Email already registered".to_string()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;

    let user_id = new_id();
    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(&name)
    .bind(&email)
    .bind(Role::User.as_str())
    .bind(&password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    log_activity(
        &state.db,
        "user_signed_up",
        &format!("{name} created an account."),
        Some(&user_id),
        None,
    )
    .await;

    let session_id = create_session(&state.db, &user_id).await?;
    let profile = UserProfile {
        id: user_id,
        name,
        email,
        role: Role::User,
    };

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&req, session_id))
        .json(profile))
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, role, password_hash, created_at
           FROM users
           WHERE email = ?
           LIMIT 1"#,
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;

    let Some(user) = user else {
        return Err(ApiError::Validation("Invalid email or password".to_string()));
    };
    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Validation("Invalid email or password".to_string()));
    }
    let Some(role) = Role::parse(&user.role) else {
        return Err(ApiError::Internal(format!(
            "User {} has unknown role {}",
            user.id, user.role
        )));
    };

    let session_id = create_session(&state.db, &user.id).await?;
    let profile = UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role,
    };

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&req, session_id))
        .json(profile))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        destroy_session(&state.db, cookie.value()).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(&req))
        .json(json!({ "ok": true })))
}

async fn me(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    Ok(HttpResponse::Ok().json(UserProfile {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}
