//! User persistence. Every mutation returns the re-read row (`RETURNING *`)
//! so callers never see a stale copy.

use crate::db::Db;
use crate::error::AppError;
use crate::models::User;

pub struct UserStore;

impl UserStore {
    /// All users, ordered by id ascending. Empty vec when none exist.
    pub async fn list(db: &Db) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&db.pool)
            .await?;
        Ok(users)
    }

    pub async fn get(db: &Db, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&db.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_name(db: &Db, name: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&db.pool)
            .await?;
        Ok(user)
    }

    /// Insert a new user; id and timestamps are assigned by the store.
    pub async fn create(
        db: &Db,
        name: &str,
        password_hash: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, password) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(password_hash)
        .fetch_one(&db.pool)
        .await?;
        Ok(user)
    }

    /// Partial update; unset fields keep their stored value. The update
    /// timestamp always advances, even for a no-op body.
    pub async fn update(
        db: &Db,
        id: i64,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 password = COALESCE($3, password), \
                 updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(password_hash)
        .fetch_optional(&db.pool)
        .await?;
        Ok(user)
    }

    /// Returns false when the id did not exist.
    pub async fn delete(db: &Db, id: i64) -> Result<bool, AppError> {
        let deleted = sqlx::query_scalar::<_, i64>("DELETE FROM users WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&db.pool)
            .await?;
        Ok(deleted.is_some())
    }
}
