//! Bundled schema migrations, executed in filename order.
//!
//! There is no version table recording which migrations already ran, so every
//! migration file MUST be idempotent (IF NOT EXISTS and friends).

use super::Db;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Migration scripts bundled into the binary at compile time.
pub static MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_create_users.sql",
    sql: include_str!("../../migrations/0001_create_users.sql"),
}];

impl Db {
    /// Run every bundled migration in lexicographic filename order.
    pub async fn migrate(&self) -> Result<(), AppError> {
        let mut migrations: Vec<Migration> = MIGRATIONS.to_vec();
        migrations.sort_by(|a, b| a.name.cmp(b.name));

        for migration in &migrations {
            tracing::debug!(name = migration.name, "running migration");
            sqlx::raw_sql(migration.sql)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Internal(format!("executing {:?}: {e}", migration.name))
                })?;
        }
        tracing::info!("successfully ran {} database migration(s)", migrations.len());
        Ok(())
    }
}
