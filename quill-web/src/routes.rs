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

use crate::{
    auth::{API_KEY_HEADER, API_SECRET_HEADER},
    endpoint::Surface,
    error::AppError,
    error_middleware::error_enhancer_middleware,
    handlers,
    rate_limit::login_rate_limit_middleware,
    request_logging::request_logging_middleware,
    security_headers::{create_security_headers_middleware, SecurityHeaders},
    setup_gate::setup_gate_middleware,
    AppState,
};
use axum::http::{header, HeaderName, Method, Uri};
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let headers_middleware =
        create_security_headers_middleware(SecurityHeaders::new(state.config.secure_cookies));

    let api = Router::new()
        .route("/api/list-posts", get(handlers::api::list_posts))
        .route("/api/post/{id}", get(handlers::api::get_post))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(API_KEY_HEADER),
                    HeaderName::from_static(API_SECRET_HEADER),
                ]),
        );

    Router::new()
        .route("/setup", get(handlers::setup_form).post(handlers::setup))
        .route(
            "/login",
            get(handlers::login_form)
                .post(handlers::login)
                .layer(middleware::from_fn_with_state(
                    state.login_rate_limiter.clone(),
                    login_rate_limit_middleware,
                )),
        )
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/", get(handlers::dashboard))
        .route("/api-key", get(handlers::api_key))
        // Accounts
        .route(
            "/create-user",
            get(handlers::create_user_form).post(handlers::create_user),
        )
        .route("/list-users", get(handlers::list_users))
        .route(
            "/update-user",
            get(handlers::update_user_form).post(handlers::update_user),
        )
        .route(
            "/delete-user",
            get(handlers::delete_user_form).post(handlers::delete_user),
        )
        // Posts
        .route(
            "/create-post",
            get(handlers::create_post_form).post(handlers::create_post),
        )
        .route("/list-posts", get(handlers::list_posts))
        .route("/post/{id}", get(handlers::fetch_post))
        .route("/edit-post/{id}", axum::routing::post(handlers::edit_post))
        .route("/delete-post/{id}", axum::routing::post(handlers::delete_post))
        .merge(api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            setup_gate_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_enhancer_middleware,
        ))
        // Outside the setup gate
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .layer(middleware::from_fn(headers_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Health check handler
async fn health() -> &'static str {
    "OK"
}

async fn not_found(uri: Uri) -> AppError {
    let surface = Surface::from_path(uri.path());
    let target = uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());

    AppError::not_found(format!(
        "{} not found - '{}'",
        surface.resource_name(),
        target
    ))
}
