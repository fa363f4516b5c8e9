//! Handlers for the `/auth` resource (signup, login, logout, me).

use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use taskdeck_core::error::CoreError;
use taskdeck_core::types::DbId;
use taskdeck_db::models::user::PublicUser;
use taskdeck_db::repositories::UserRepo;

use crate::auth::jwt::generate_session_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup` and `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Acknowledgement body returned by signup, login, and logout.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup
///
/// Create an account and start a session in one step.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<(CookieJar, Json<OkResponse>)> {
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email is required".into(),
        )));
    }
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = match UserRepo::create(&state.pool, email, &password_hash).await {
        Ok(user) => user,
        // A taken email reads as a validation failure to the client.
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some("uq_users_email") => {
            return Err(AppError::Core(CoreError::Validation(
                "Email already exists".into(),
            )));
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(user_id = user.id, "user signed up");

    let jar = add_session_cookie(jar, user.id, &state)?;
    Ok((jar, Json(OkResponse { ok: true })))
}

/// POST /api/auth/login
///
/// Authenticate with email + password and start a session.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<(CookieJar, Json<OkResponse>)> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid credentials".into())))?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid credentials".into(),
        )));
    }

    let jar = add_session_cookie(jar, user.id, &state)?;
    Ok((jar, Json(OkResponse { ok: true })))
}

/// POST /api/auth/logout
///
/// Drop the session cookie. The token is stateless, so there is nothing to
/// revoke server-side.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(OkResponse { ok: true }))
}

/// GET /api/auth/me
///
/// Return the signed-in user's public profile.
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<MeResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(MeResponse { user: user.into() }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue a session JWT and attach it as the session cookie.
///
/// No Max-Age is set: the cookie lives for the browser session and the
/// embedded JWT enforces the hard expiry.
fn add_session_cookie(jar: CookieJar, user_id: DbId, state: &AppState) -> Result<CookieJar, AppError> {
    let token = generate_session_token(user_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .path("/")
        .build();

    Ok(jar.add(cookie))
}
