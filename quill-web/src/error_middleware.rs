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
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;

use crate::{
    auth::load_session_user,
    endpoint::Surface,
    error::AppError,
    template_context::{base_context, render_page},
    AppState,
};

/// Turn `AppError` responses into their final form.
///
/// Page requests whose error names a template get that page re-rendered
/// with the error; in development mode JSON errors carry their details.
pub async fn error_enhancer_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Response {
    let surface = Surface::from_path(request.uri().path());
    let mut response = next.run(request).await;

    let Some(error) = response.extensions_mut().remove::<AppError>() else {
        return response;
    };

    if surface == Surface::Page {
        if let Some(template) = error.page {
            match render_error_page(&state, &jar, &error, template).await {
                Ok(page) => return (error.status, page).into_response(),
                Err(e) => {
                    tracing::error!("Failed to render error page {}: {}", template, e);
                }
            }
        }
    }

    if state.config.development_mode && error.details.is_some() {
        return (error.status, Json(error.body(true))).into_response();
    }

    response
}

async fn render_error_page(
    state: &AppState,
    jar: &CookieJar,
    error: &AppError,
    template: &str,
) -> Result<axum::response::Html<String>, AppError> {
    let user = load_session_user(state, jar).await?.map(|(user, _)| user);

    let mut context = base_context(user.as_ref());
    context.insert("error", &error.message);
    context.insert("validation_errors", &error.validation_errors);
    context.insert("form", &error.form);

    render_page(state, template, &context)
}
