// Quill - A small blog CMS built with Rust
// Copyright (C) 2025 Quill Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use quill_core::models::user::User;
use sqlx::SqlitePool;

use crate::timestamps::parse_timestamp;

type UserRow = (i64, String, String, String, String, bool, String, i64, String);

const USER_COLUMNS: &str = "id, username, password_hash, api_key, api_secret, is_admin, \
     created_at, login_attempts, login_attempts_expiry";

fn user_from_row(row: UserRow) -> Result<User> {
    let (
        id,
        username,
        password_hash,
        api_key,
        api_secret,
        is_admin,
        created_at_str,
        login_attempts,
        expiry_str,
    ) = row;

    Ok(User {
        id: Some(id),
        username,
        password_hash,
        api_key,
        api_secret,
        is_admin,
        created_at: parse_timestamp(&created_at_str, "created_at")?,
        login_attempts,
        login_attempts_expiry: parse_timestamp(&expiry_str, "login_attempts_expiry")?,
    })
}

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> Result<i64> {
        if let Err(reason) = user.is_valid() {
            return Err(anyhow::anyhow!("Invalid user: {}", reason));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, api_key, api_secret, is_admin,
                               created_at, login_attempts, login_attempts_expiry)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.api_key)
        .bind(&user.api_secret)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.login_attempts)
        .bind(user.login_attempts_expiry)
        .execute(&self.pool)
        .await
        .context("Failed to create user")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find user by id")?;

        row.map(user_from_row).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find user by username")?;

        row.map(user_from_row).transpose()
    }

    /// Look up the owner of a public API key
    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE api_key = ?",
            USER_COLUMNS
        ))
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find user by API key")?;

        row.map(user_from_row).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")?;

        rows.into_iter().map(user_from_row).collect()
    }

    pub async fn count_admins(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count administrators")?;

        Ok(count)
    }

    pub async fn admin_exists(&self) -> Result<bool> {
        Ok(self.count_admins().await? > 0)
    }

    pub async fn update(&self, user: &User) -> Result<()> {
        let id = user
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot update user without ID"))?;

        if let Err(reason) = user.is_valid() {
            return Err(anyhow::anyhow!("Invalid user: {}", reason));
        }

        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, password_hash = ?, api_key = ?, api_secret = ?, is_admin = ?,
                login_attempts = ?, login_attempts_expiry = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.api_key)
        .bind(&user.api_secret)
        .bind(user.is_admin)
        .bind(user.login_attempts)
        .bind(user.login_attempts_expiry)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update user")?
        .rows_affected();

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("User with id {} not found", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?
            .rows_affected();

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("User with id {} not found", id));
        }

        Ok(())
    }
}
