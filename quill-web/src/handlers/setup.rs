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

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use quill_core::models::user::User;
use quill_core::validation::validate_credentials;
use quill_db::repositories::UserRepository;
use serde::Deserialize;

use crate::{
    error::AppError,
    template_context::{base_context, render_page},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SetupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn setup_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_page(&state, "setup", &base_context(None))
}

/// Create the first administrator account
pub async fn setup(
    State(state): State<AppState>,
    Form(form): Form<SetupForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = validate_credentials(&form.username, &form.password) {
        return Err(AppError::bad_request("There were issues validating your input.")
            .on_page("setup")
            .with_validation_errors(errors)
            .with_form_value("username", &form.username));
    }

    let user_repo = UserRepository::new(state.db.clone());
    if user_repo.find_by_username(&form.username).await?.is_some() {
        return Err(AppError::conflict("That username is taken. Try another one.")
            .on_page("setup")
            .with_form_value("username", &form.username));
    }

    let admin = User::new(form.username, &form.password, true, &state.cipher)?;
    user_repo.create(&admin).await?;

    tracing::info!(username = %admin.username, "Administrator account created");

    Ok(Redirect::to("/").into_response())
}
