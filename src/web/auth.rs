//! Cookie-session login and the basic-auth guard for the API group.
//!
//! Session state lives entirely in an encrypted cookie holding the user id;
//! there is no server-side session table.

use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;
use crate::web::AppState;
use axum::{
    extract::{rejection::FormRejection, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};
use headers::{authorization::Basic, Authorization, HeaderMapExt};
use serde::Deserialize;

pub const SESSION_COOKIE_NAME: &str = "s";

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(AppError::internal)
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}

fn session_user_id(jar: &PrivateCookieJar) -> Option<i64> {
    jar.get(SESSION_COOKIE_NAME)?.value().parse().ok()
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// GET /login: the static login page.
pub async fn login_page(State(state): State<AppState>) -> Result<Response, AppError> {
    let asset = state
        .assets
        .get("login.html")
        .await
        .ok_or(AppError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, asset.content_type)],
        asset.body.into_owned(),
    )
        .into_response())
}

/// POST /login. Responds 401 on any failure without revealing which check
/// failed; success issues the session cookie and redirects home.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    form: Result<Form<Credentials>, FormRejection>,
) -> Result<Response, AppError> {
    // Already logged in: straight home.
    if session_user_id(&jar).is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let Form(creds) = form.map_err(|_| AppError::Unauthorized)?;
    if creds.name.trim().is_empty() || creds.password.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }

    let db = state.db()?;
    let user = UserStore::find_by_name(db, &creds.name)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let hash = user
        .password
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(AppError::Unauthorized)?;
    if !verify_password(&creds.password, hash) {
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = user.id, "login");
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE_NAME, user.id.to_string()))
            .path("/")
            .http_only(true),
    );
    Ok((jar, Redirect::to("/")).into_response())
}

/// GET /logout: drop the session cookie and redirect home.
pub async fn logout(jar: PrivateCookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    (jar, Redirect::to("/")).into_response()
}

/// GET /login/user: the session's user as JSON, or 401.
pub async fn logged_in_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Json<User>, AppError> {
    let id = session_user_id(&jar).ok_or(AppError::Unauthorized)?;
    let db = state.db()?;
    let user = UserStore::get(db, id).await?.ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

/// Guard for the /api/v1 group: HTTP basic auth, checked before any handler
/// runs and therefore before any database access.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (expected_user, expected_pass) = &state.config.api_auth;
    let Authorization(basic) = req
        .headers()
        .typed_get::<Authorization<Basic>>()
        .ok_or(AppError::Unauthorized)?;
    if basic.username() != expected_user || basic.password() != expected_pass {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
