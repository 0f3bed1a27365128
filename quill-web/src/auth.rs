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

use anyhow::Result;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use quill_core::models::{session::Session, user::User};
use quill_core::validation::validate_api_credentials;
use quill_db::repositories::{SessionRepository, UserRepository};

use crate::{config::Config, error::AppError, AppState};

pub const SESSION_COOKIE: &str = "session_id";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_SECRET_HEADER: &str = "x-api-secret";

/// Build the session cookie handed out after a successful login
pub fn session_cookie(config: &Config, session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

/// Resolve the session cookie to its user.
///
/// Expired sessions are deleted on sight and treated as anonymous.
pub async fn load_session_user(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<(User, Session)>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let session_repo = SessionRepository::new(state.db.clone());
    let Some(session) = session_repo.find_by_id(cookie.value()).await? else {
        return Ok(None);
    };

    if session.is_expired() {
        tracing::debug!(session_id = %session.id, "Dropping expired session");
        if let Err(e) = session_repo.delete(&session.id).await {
            tracing::warn!(session_id = %session.id, "Failed to drop expired session: {}", e);
        }
        return Ok(None);
    }

    let user_repo = UserRepository::new(state.db.clone());
    let user = user_repo.find_by_id(session.user_id).await?;

    Ok(user.map(|user| (user, session)))
}

/// Why a page request could not be authenticated
#[derive(Debug)]
pub enum AuthRejection {
    /// Anonymous visitor, sent to the login form
    Login,
    Error(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Login => Redirect::to("/login").into_response(),
            AuthRejection::Error(err) => err.into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        match load_session_user(&app_state, &jar).await {
            Ok(Some((user, session))) => Ok(CurrentUser { user, session }),
            Ok(None) => Err(AuthRejection::Login),
            Err(e) => Err(AuthRejection::Error(e.into())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(AuthRejection::Login) => Ok(OptionalUser(None)),
            Err(AuthRejection::Error(e)) => Err(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AuthRejection::Error(
                AppError::forbidden("You must be logged in as an administrator.")
                    .on_page("dashboard"),
            ));
        }

        Ok(RequireAdmin(user))
    }
}

/// Caller of the JSON API, authenticated by the `X-Api-Key` and
/// `X-Api-Secret` headers
#[derive(Debug, Clone)]
pub struct ApiUser(pub User);

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

impl<S> FromRequestParts<S> for ApiUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let api_key = header_value(&parts.headers, API_KEY_HEADER);
        let api_secret = header_value(&parts.headers, API_SECRET_HEADER);

        let (api_key, api_secret) = match (api_key, api_secret) {
            (Some(key), Some(secret))
                if validate_api_credentials(Some(key), Some(secret)).is_ok() =>
            {
                (key, secret)
            }
            _ => return Err(AppError::unauthorized("Missing API credentials.")),
        };

        let app_state = AppState::from_ref(state);
        let user_repo = UserRepository::new(app_state.db.clone());

        let Some(user) = user_repo.find_by_api_key(api_key).await? else {
            return Err(AppError::unauthorized("Invalid API credentials."));
        };

        if !user.verify_api_secret(api_secret, &app_state.cipher)? {
            tracing::debug!(username = %user.username, "API secret mismatch");
            return Err(AppError::unauthorized("Invalid API credentials."));
        }

        Ok(ApiUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{create_test_state, create_test_user, login_session};
    use axum::http::{Request, StatusCode};

    fn parts_with_headers(headers: &[(&str, String)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_current_user_from_cookie() -> Result<()> {
        let state = create_test_state().await?;
        let user = create_test_user(&state, "writer1", false).await?;
        let session_id = login_session(&state, &user).await?;

        let mut parts =
            parts_with_headers(&[("cookie", format!("{}={}", SESSION_COOKIE, session_id))]);
        let current = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        assert_eq!(current.user.username, "writer1");
        assert_eq!(current.session.id, session_id);
        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() -> Result<()> {
        let state = create_test_state().await?;
        let mut parts = parts_with_headers(&[]);

        let rejection = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(rejection, Err(AuthRejection::Login)));

        let response = AuthRejection::Login.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() -> Result<()> {
        let state = create_test_state().await?;
        let user = create_test_user(&state, "writer1", false).await?;
        let session = Session::new_with_expiry(user.id.unwrap(), chrono::Duration::hours(-1));
        SessionRepository::new(state.db.clone()).create(&session).await?;

        let mut parts =
            parts_with_headers(&[("cookie", format!("{}={}", SESSION_COOKIE, session.id))]);
        let OptionalUser(current) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        assert!(current.is_none());
        assert!(SessionRepository::new(state.db.clone())
            .find_by_id(&session.id)
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_require_admin_rejects_writer() -> Result<()> {
        let state = create_test_state().await?;
        let user = create_test_user(&state, "writer1", false).await?;
        let session_id = login_session(&state, &user).await?;

        let mut parts =
            parts_with_headers(&[("cookie", format!("{}={}", SESSION_COOKIE, session_id))]);
        let result = RequireAdmin::from_request_parts(&mut parts, &state).await;

        match result {
            Err(AuthRejection::Error(err)) => {
                assert_eq!(err.status, StatusCode::FORBIDDEN);
                assert_eq!(err.message, "You must be logged in as an administrator.");
            }
            other => panic!("expected forbidden, got {:?}", other.map(|_| ())),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_api_user_authenticates() -> Result<()> {
        let state = create_test_state().await?;
        let user = create_test_user(&state, "writer1", false).await?;
        let secret = user.reveal_api_secret(&state.cipher)?;

        let mut parts = parts_with_headers(&[
            (API_KEY_HEADER, user.api_key.clone()),
            (API_SECRET_HEADER, secret),
        ]);
        let ApiUser(api_user) = ApiUser::from_request_parts(&mut parts, &state)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        assert_eq!(api_user.username, "writer1");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_user_missing_credentials() -> Result<()> {
        let state = create_test_state().await?;

        let mut parts = parts_with_headers(&[(API_KEY_HEADER, "abc".to_string())]);
        let err = ApiUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Missing API credentials.");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_user_wrong_secret() -> Result<()> {
        let state = create_test_state().await?;
        let user = create_test_user(&state, "writer1", false).await?;

        let mut parts = parts_with_headers(&[
            (API_KEY_HEADER, user.api_key.clone()),
            (API_SECRET_HEADER, "0".repeat(40)),
        ]);
        let err = ApiUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();

        assert_eq!(err.message, "Invalid API credentials.");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_user_unknown_key() -> Result<()> {
        let state = create_test_state().await?;

        let mut parts = parts_with_headers(&[
            (API_KEY_HEADER, "unknown".to_string()),
            (API_SECRET_HEADER, "secret".to_string()),
        ]);
        let err = ApiUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();

        assert_eq!(err.message, "Invalid API credentials.");
        Ok(())
    }
}
