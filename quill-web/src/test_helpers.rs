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
use quill_core::models::{session::Session, user::User};
use quill_core::SecretCipher;
use quill_db::init_memory_database;
use quill_db::repositories::{SessionRepository, UserRepository};

use crate::{
    config::Config, rate_limit::create_login_rate_limiter, templates::init_templates, AppState,
};

pub const TEST_PASSWORD: &str = "Passw0rd!";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 3000,
        templates_dir: "templates".to_string(),
        static_dir: "static".to_string(),
        auth_secret: "0123456789abcdef0123456789abcdef".to_string(),
        development_mode: false,
        secure_cookies: false,
        session_hours: 24,
        login_rate_limit: 1000,
    }
}

/// State backed by a migrated in-memory database and the default templates
pub async fn create_test_state() -> Result<AppState> {
    let db = init_memory_database().await?;

    // Templates are parsed up front, the directory can go afterwards
    let templates_dir = tempfile::tempdir()?;
    let templates = init_templates(
        templates_dir
            .path()
            .to_str()
            .context("Non UTF-8 temp directory")?,
        false,
    )?;

    let config = test_config();
    let cipher = SecretCipher::new(config.auth_secret.as_bytes())?;
    let limiter = create_login_rate_limiter(config.login_rate_limit);

    Ok(AppState::new(db, templates, config, cipher, limiter))
}

/// Store a user whose password is `TEST_PASSWORD`
pub async fn create_test_user(state: &AppState, username: &str, is_admin: bool) -> Result<User> {
    let mut user = User::new(username.to_string(), TEST_PASSWORD, is_admin, &state.cipher)?;
    let id = UserRepository::new(state.db.clone()).create(&user).await?;
    user.id = Some(id);

    Ok(user)
}

/// Open a session for the user and return its cookie value
pub async fn login_session(state: &AppState, user: &User) -> Result<String> {
    let user_id = user.id.context("User must be saved first")?;
    let session = Session::new(user_id);
    SessionRepository::new(state.db.clone())
        .create(&session)
        .await?;

    Ok(session.id)
}
