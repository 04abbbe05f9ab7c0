//! CRUD handlers for the /api/v1 users resource.

use crate::error::AppError;
use crate::models::User;
use crate::store::UserStore;
use crate::web::auth::hash_password;
use crate::web::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NewUserDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Unparseable ids are treated the same as missing rows.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// GET /api/v1/users: all users ordered by id; `[]` when none exist.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let db = state.db()?;
    Ok(Json(UserStore::list(db).await?))
}

/// PUT /api/v1/users: create a user from `{name, password?}`. The response is
/// the row as persisted, id and timestamps included.
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUserDto>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(new_user) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let name = new_user.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    let password = new_user
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(hash_password)
        .transpose()?;

    let db = state.db()?;
    let user = UserStore::create(db, name, password.as_deref()).await?;
    Ok(Json(user))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    let db = state.db()?;
    let user = UserStore::get(db, id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// POST /api/v1/users/:id: partial update; the update timestamp always
/// advances. 404 when the id is absent.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserDto>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let id = parse_id(&id)?;
    let Json(update) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let name = match update.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("name must not be empty")),
        other => other,
    };
    let password = update
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(hash_password)
        .transpose()?;

    let db = state.db()?;
    let user = UserStore::update(db, id, name, password.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user))
}

/// DELETE /api/v1/users/:id: 204 on success, 404 when the id is absent.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let db = state.db()?;
    if !UserStore::delete(db, id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
