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
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use chrono::{Duration, Utc};
use quill_core::models::session::Session;
use quill_core::validation::validate_credentials;
use quill_db::repositories::{SessionRepository, UserRepository};
use serde::Deserialize;

use crate::{
    auth::{session_cookie, OptionalUser, SESSION_COOKIE},
    error::AppError,
    template_context::{base_context, render_page},
    AppState,
};

const INVALID_LOGIN: &str = "Username or password is invalid.";
const INCORRECT_LOGIN: &str = "Username or password is incorrect.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    Ok(render_page(&state, "login", &base_context(None))?.into_response())
}

/// Check the credentials, apply the per-account throttle and open a session
pub async fn login(
    State(state): State<AppState>,
    OptionalUser(current): OptionalUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let rejected = |err: AppError| {
        err.on_page("login")
            .with_form_value("username", &form.username)
    };

    if validate_credentials(&form.username, &form.password).is_err() {
        return Err(rejected(AppError::unauthorized(INVALID_LOGIN)));
    }

    let user_repo = UserRepository::new(state.db.clone());
    let Some(mut user) = user_repo.find_by_username(&form.username).await? else {
        tracing::debug!(username = %form.username, "Login for unknown user");
        return Err(rejected(AppError::unauthorized(INCORRECT_LOGIN)));
    };

    let now = Utc::now();

    if user.too_many_logins(now) {
        tracing::warn!(username = %user.username, "Login throttled");
        return Err(rejected(AppError::too_many_requests(
            "Too many logins. Try again later.",
        )));
    }

    // Every password check counts toward the throttle, successful or not
    user.record_login_attempt(now);
    user_repo.update(&user).await?;

    if !user.verify_password(&form.password)? {
        tracing::warn!(
            username = %user.username,
            attempts = user.login_attempts,
            "Failed login"
        );
        return Err(rejected(AppError::unauthorized(INCORRECT_LOGIN)));
    }

    let user_id = user
        .id
        .ok_or_else(|| anyhow::anyhow!("Stored user has no id"))?;
    let session = Session::new_with_expiry(user_id, Duration::hours(state.config.session_hours));
    SessionRepository::new(state.db.clone())
        .create(&session)
        .await?;

    tracing::info!(username = %user.username, "User logged in");

    let jar = jar.add(session_cookie(&state.config, session.id));
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let session_repo = SessionRepository::new(state.db.clone());
        if let Err(e) = session_repo.delete(cookie.value()).await {
            tracing::debug!("Logout without a live session: {}", e);
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
