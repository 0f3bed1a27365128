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

use axum::response::Html;
use quill_core::models::user::User;
use serde::Serialize;
use serde_json::Map;
use tera::Context;

use crate::{error::AppError, AppState};

/// Navigation data about the logged-in user
#[derive(Debug, Serialize)]
struct CurrentUserView<'a> {
    username: &'a str,
    is_admin: bool,
}

/// Variables every page template can rely on
pub fn base_context(user: Option<&User>) -> Context {
    let mut context = Context::new();

    if let Some(user) = user {
        context.insert(
            "current_user",
            &CurrentUserView {
                username: &user.username,
                is_admin: user.is_admin,
            },
        );
    }

    context.insert("form", &Map::new());
    context.insert("validation_errors", &Vec::<String>::new());

    context
}

/// Render `<name>.html`
pub fn render_page(state: &AppState, name: &str, context: &Context) -> Result<Html<String>, AppError> {
    let template = format!("{}.html", name);
    let html = state
        .templates
        .render(&template, context)
        .map_err(|e| AppError::from(e.context(format!("Failed to render {}", template))))?;

    Ok(Html(html))
}
