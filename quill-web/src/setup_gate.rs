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
    response::{IntoResponse, Redirect, Response},
};
use quill_db::repositories::UserRepository;

use crate::{endpoint::Surface, error::AppError, AppState};

/// Hold every route behind setup until an administrator account exists,
/// and close `/setup` once one does.
pub async fn setup_gate_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let on_setup = path == "/setup";
    let surface = Surface::from_path(path);

    let admin_exists = match UserRepository::new(state.db.clone()).admin_exists().await {
        Ok(exists) => exists,
        Err(e) => return AppError::from(e).into_response(),
    };

    match surface {
        Surface::Api if !admin_exists => AppError::not_found(
            "No admin account found. The CMS likely has not been set up, yet.",
        )
        .into_response(),
        Surface::Page if !admin_exists && !on_setup => Redirect::to("/setup").into_response(),
        Surface::Page if admin_exists && on_setup => Redirect::to("/").into_response(),
        _ => next.run(request).await,
    }
}
