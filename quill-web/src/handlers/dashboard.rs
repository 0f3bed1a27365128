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

use axum::{extract::State, response::Html};

use crate::{
    auth::CurrentUser,
    error::AppError,
    template_context::{base_context, render_page},
    AppState,
};

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Html<String>, AppError> {
    render_page(&state, "dashboard", &base_context(Some(&user)))
}

/// Show the caller's API key together with the decrypted secret
pub async fn api_key(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Html<String>, AppError> {
    let api_secret = user.reveal_api_secret(&state.cipher)?;

    let mut context = base_context(Some(&user));
    context.insert("api_key", &user.api_key);
    context.insert("api_secret", &api_secret);

    render_page(&state, "api-key", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_state, create_test_user, login_session};
    use anyhow::Result;
    use quill_db::repositories::SessionRepository;

    async fn current(state: &AppState, name: &str, is_admin: bool) -> Result<CurrentUser> {
        let user = create_test_user(state, name, is_admin).await?;
        let session_id = login_session(state, &user).await?;
        let session = SessionRepository::new(state.db.clone())
            .find_by_id(&session_id)
            .await?
            .expect("session stored");
        Ok(CurrentUser { user, session })
    }

    #[tokio::test]
    async fn test_dashboard_greets_user() -> Result<()> {
        let state = create_test_state().await?;
        let user = current(&state, "writer1", false).await?;

        let Html(html) = dashboard(State(state), user)
            .await
            .map_err(anyhow::Error::new)?;

        assert!(html.contains("writer1"));
        assert!(!html.contains("href=\"/list-users\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_shows_admin_links() -> Result<()> {
        let state = create_test_state().await?;
        let user = current(&state, "admin1", true).await?;

        let Html(html) = dashboard(State(state), user)
            .await
            .map_err(anyhow::Error::new)?;

        assert!(html.contains("href=\"/list-users\""));
        Ok(())
    }

    #[tokio::test]
    async fn test_api_key_reveals_secret() -> Result<()> {
        let state = create_test_state().await?;
        let user = current(&state, "writer1", false).await?;
        let secret = user.user.reveal_api_secret(&state.cipher)?;
        let key = user.user.api_key.clone();

        let Html(html) = api_key(State(state), user)
            .await
            .map_err(anyhow::Error::new)?;

        assert!(html.contains(&key));
        assert!(html.contains(&secret));
        assert!(html.contains(r#"data-copy-target="api-key""#));
        assert!(html.contains(r#"data-copy-target="api-secret""#));
        assert!(html.contains(r#"<script src="/static/js/copy-text.js"></script>"#));
        Ok(())
    }
}
