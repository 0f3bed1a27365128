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

//! Account management: creating, listing, updating and deleting users.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{cookie::Cookie, CookieJar};
use quill_core::models::user::User;
use quill_core::policy::{plan_admin_change, plan_user_delete, DeleteTarget};
use quill_core::validation::{validate_credentials, validate_user_update};
use quill_db::repositories::UserRepository;
use serde::Deserialize;

use super::parse_admin_flag;
use crate::{
    auth::{CurrentUser, RequireAdmin, SESSION_COOKIE},
    error::AppError,
    template_context::{base_context, render_page},
    views::UserSummary,
    AppState,
};

const USERNAME_TAKEN: &str = "That username is taken. Try another one.";
const INVALID_INPUT: &str = "There were issues validating your input.";

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub admin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserForm {
    pub old_username: Option<String>,
    pub admin: Option<String>,
    pub new_username: Option<String>,
    pub new_password: Option<String>,
    pub new_keys: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserForm {
    pub username: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn create_user_form(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Html<String>, AppError> {
    render_page(&state, "create-user", &base_context(Some(&admin)))
}

pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<CreateUserForm>,
) -> Result<Html<String>, AppError> {
    if let Err(errors) = validate_credentials(&form.username, &form.password) {
        return Err(AppError::bad_request(INVALID_INPUT)
            .on_page("create-user")
            .with_validation_errors(errors)
            .with_form_value("username", &form.username));
    }

    let user_repo = UserRepository::new(state.db.clone());
    if user_repo.find_by_username(&form.username).await?.is_some() {
        return Err(AppError::conflict(USERNAME_TAKEN)
            .on_page("create-user")
            .with_form_value("username", &form.username));
    }

    let is_admin = parse_admin_flag(form.admin.as_deref()).unwrap_or(false);
    let user = User::new(form.username, &form.password, is_admin, &state.cipher)?;
    user_repo.create(&user).await?;

    tracing::info!(
        created_by = %admin.username,
        username = %user.username,
        is_admin,
        "User created"
    );

    let mut context = base_context(Some(&admin));
    context.insert("success_message", "The new user has been created successfully.");
    render_page(&state, "create-user", &context)
}

pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Html<String>, AppError> {
    let users = UserRepository::new(state.db.clone()).list_all().await?;
    let users: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();

    let mut context = base_context(Some(&admin));
    context.insert("users", &users);
    render_page(&state, "list-users", &context)
}

pub async fn update_user_form(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Html<String>, AppError> {
    render_page(&state, "update-user", &base_context(Some(&user)))
}

/// Update an account.
///
/// Users change their own username, password and API credentials.
/// Administrators may also target another account through `old_username`
/// and change its admin status.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser { user: actor, .. }: CurrentUser,
    Form(form): Form<UpdateUserForm>,
) -> Result<Html<String>, AppError> {
    let new_username = non_empty(&form.new_username);
    let new_password = form.new_password.as_deref().filter(|p| !p.is_empty());

    let rejected = |err: AppError| {
        err.on_page("update-user")
            .with_form_value("old_username", non_empty(&form.old_username).unwrap_or(""))
            .with_form_value("new_username", new_username.unwrap_or(""))
    };

    if let Err(errors) = validate_user_update(new_username, new_password) {
        return Err(rejected(AppError::bad_request(INVALID_INPUT)).with_validation_errors(errors));
    }

    let user_repo = UserRepository::new(state.db.clone());

    let mut target = match non_empty(&form.old_username) {
        Some(old_username) if actor.is_admin && old_username != actor.username => {
            match user_repo.find_by_username(old_username).await? {
                Some(user) => user,
                None => return Err(rejected(AppError::not_found("User not found."))),
            }
        }
        _ => actor.clone(),
    };
    let target_is_actor = target.id == actor.id;

    let admin_count = user_repo.count_admins().await?;
    let admin_change = plan_admin_change(
        &actor.actor(),
        target_is_actor,
        parse_admin_flag(form.admin.as_deref()),
        admin_count,
    )
    .map_err(|e| rejected(e.into()))?;

    if let Some(username) = new_username.filter(|name| *name != target.username) {
        if user_repo.find_by_username(username).await?.is_some() {
            return Err(rejected(AppError::conflict("This username is taken.")));
        }
        target.username = username.to_string();
    }

    if let Some(password) = new_password {
        target.set_password(password)?;
    }

    if form.new_keys.as_deref() == Some("on") {
        target.generate_api_keys(&state.cipher)?;
    }

    if let Some(is_admin) = admin_change {
        target.is_admin = is_admin;
    }

    user_repo.update(&target).await?;

    tracing::info!(
        updated_by = %actor.username,
        username = %target.username,
        "User updated"
    );

    let viewer = if target_is_actor { &target } else { &actor };
    let mut context = base_context(Some(viewer));
    context.insert("success_message", "The user has been updated.");
    render_page(&state, "dashboard", &context)
}

pub async fn delete_user_form(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Html<String>, AppError> {
    render_page(&state, "delete-user", &base_context(Some(&user)))
}

/// Delete an account.
///
/// Writers delete themselves and are logged out. Administrators delete
/// other non-admin accounts by username.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser { user: actor, .. }: CurrentUser,
    jar: CookieJar,
    Form(form): Form<DeleteUserForm>,
) -> Result<Response, AppError> {
    let requested = non_empty(&form.username);
    let rejected = |err: AppError| {
        err.on_page("delete-user")
            .with_form_value("username", requested.unwrap_or(""))
    };

    let target = plan_user_delete(&actor.actor(), requested).map_err(|e| rejected(e.into()))?;
    let user_repo = UserRepository::new(state.db.clone());

    match target {
        DeleteTarget::Myself => {
            let id = actor
                .id
                .ok_or_else(|| anyhow::anyhow!("Stored user has no id"))?;
            user_repo.delete(id).await?;

            tracing::info!(username = %actor.username, "User deleted their account");

            let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
            Ok((jar, Redirect::to("/")).into_response())
        }
        DeleteTarget::Other(username) => {
            let victim = user_repo
                .find_by_username(&username)
                .await?
                .filter(|user| !user.is_admin);
            let Some(victim_id) = victim.and_then(|user| user.id) else {
                return Err(rejected(AppError::not_found("Non-admin user not found.")));
            };

            // Sessions go with the user row
            user_repo.delete(victim_id).await?;

            tracing::info!(deleted_by = %actor.username, username = %username, "User deleted");

            let mut context = base_context(Some(&actor));
            context.insert("success_message", "The user has been deleted");
            Ok(render_page(&state, "delete-user", &context)?.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_state, create_test_user, login_session};
    use anyhow::Result;
    use axum::http::StatusCode;
    use quill_db::repositories::SessionRepository;

    async fn current(state: &AppState, user: &User) -> Result<CurrentUser> {
        let session_id = login_session(state, user).await?;
        let session = SessionRepository::new(state.db.clone())
            .find_by_id(&session_id)
            .await?
            .expect("session stored");
        Ok(CurrentUser {
            user: user.clone(),
            session,
        })
    }

    async fn stored(state: &AppState, username: &str) -> Result<Option<User>> {
        UserRepository::new(state.db.clone())
            .find_by_username(username)
            .await
    }

    #[tokio::test]
    async fn test_create_user() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;

        let Html(html) = create_user(
            State(state.clone()),
            RequireAdmin(admin),
            Form(CreateUserForm {
                username: "writer1".to_string(),
                password: "Passw0rd!".to_string(),
                admin: None,
            }),
        )
        .await
        .map_err(anyhow::Error::new)?;

        assert!(html.contains("The new user has been created successfully."));
        let writer = stored(&state, "writer1").await?.expect("writer created");
        assert!(!writer.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_duplicate() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;
        create_test_user(&state, "writer1", false).await?;

        let err = create_user(
            State(state),
            RequireAdmin(admin),
            Form(CreateUserForm {
                username: "writer1".to_string(),
                password: "Passw0rd!".to_string(),
                admin: Some("true".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, USERNAME_TAKEN);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_users() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;
        create_test_user(&state, "writer1", false).await?;

        let Html(html) = list_users(State(state), RequireAdmin(admin))
            .await
            .map_err(anyhow::Error::new)?;

        assert!(html.contains("admin1"));
        assert!(html.contains("writer1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_updates_own_account() -> Result<()> {
        let state = create_test_state().await?;
        let writer = create_test_user(&state, "writer1", false).await?;
        let old_key = writer.api_key.clone();

        update_user(
            State(state.clone()),
            current(&state, &writer).await?,
            Form(UpdateUserForm {
                new_username: Some("writer2".to_string()),
                new_password: Some("N3w-Passw0rd".to_string()),
                new_keys: Some("on".to_string()),
                // Ignored for non-admins
                admin: Some("true".to_string()),
                ..Default::default()
            }),
        )
        .await
        .map_err(anyhow::Error::new)?;

        assert!(stored(&state, "writer1").await?.is_none());
        let updated = stored(&state, "writer2").await?.expect("renamed");
        assert!(updated.verify_password("N3w-Passw0rd")?);
        assert_ne!(updated.api_key, old_key);
        assert!(!updated.is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_input() -> Result<()> {
        let state = create_test_state().await?;
        let writer = create_test_user(&state, "writer1", false).await?;

        let err = update_user(
            State(state.clone()),
            current(&state, &writer).await?,
            Form(UpdateUserForm {
                new_password: Some("weak".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.page, Some("update-user"));
        assert!(!err.validation_errors.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() -> Result<()> {
        let state = create_test_state().await?;
        let writer = create_test_user(&state, "writer1", false).await?;
        create_test_user(&state, "writer2", false).await?;

        let err = update_user(
            State(state.clone()),
            current(&state, &writer).await?,
            Form(UpdateUserForm {
                new_username: Some("writer2".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, "This username is taken.");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_promotes_other_user() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;
        create_test_user(&state, "writer1", false).await?;

        update_user(
            State(state.clone()),
            current(&state, &admin).await?,
            Form(UpdateUserForm {
                old_username: Some("writer1".to_string()),
                admin: Some("true".to_string()),
                ..Default::default()
            }),
        )
        .await
        .map_err(anyhow::Error::new)?;

        assert!(stored(&state, "writer1").await?.expect("exists").is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_updates_unknown_user() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;

        let err = update_user(
            State(state.clone()),
            current(&state, &admin).await?,
            Form(UpdateUserForm {
                old_username: Some("ghost1".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "User not found.");
        Ok(())
    }

    #[tokio::test]
    async fn test_last_admin_cannot_demote_self() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;

        let err = update_user(
            State(state.clone()),
            current(&state, &admin).await?,
            Form(UpdateUserForm {
                admin: Some("false".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, "There must be at least one administrator account.");
        assert!(stored(&state, "admin1").await?.expect("exists").is_admin);
        Ok(())
    }

    #[tokio::test]
    async fn test_writer_deletes_self() -> Result<()> {
        let state = create_test_state().await?;
        let writer = create_test_user(&state, "writer1", false).await?;

        let response = delete_user(
            State(state.clone()),
            current(&state, &writer).await?,
            CookieJar::new(),
            Form(DeleteUserForm {
                username: Some("admin1".to_string()),
            }),
        )
        .await
        .map_err(anyhow::Error::new)?;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(stored(&state, "writer1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_deletes_writer() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;
        create_test_user(&state, "writer1", false).await?;

        let response = delete_user(
            State(state.clone()),
            current(&state, &admin).await?,
            CookieJar::new(),
            Form(DeleteUserForm {
                username: Some("writer1".to_string()),
            }),
        )
        .await
        .map_err(anyhow::Error::new)?;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(stored(&state, "writer1").await?.is_none());
        assert!(stored(&state, "admin1").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_admin() -> Result<()> {
        let state = create_test_state().await?;
        let admin = create_test_user(&state, "admin1", true).await?;
        create_test_user(&state, "admin2", true).await?;

        let err = delete_user(
            State(state.clone()),
            current(&state, &admin).await?,
            CookieJar::new(),
            Form(DeleteUserForm {
                username: Some("admin2".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Non-admin user not found.");

        let err = delete_user(
            State(state.clone()),
            current(&state, &admin).await?,
            CookieJar::new(),
            Form(DeleteUserForm {
                username: Some("admin1".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, "Admin accounts cannot be deleted.");
        Ok(())
    }
}
