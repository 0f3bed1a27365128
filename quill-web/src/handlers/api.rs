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

//! JSON API authenticated by API key and secret.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::posts::{find_visible_post, load_listing, ListPostsQuery};
use crate::{
    auth::ApiUser,
    endpoint::Surface,
    error::AppError,
    views::{PostSummary, PublishedPost},
    AppState,
};

/// `GET /api/list-posts?username=&page=`
pub async fn list_posts(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Value>, AppError> {
    let (_, page) = load_listing(&state, &user, &query).await?;
    let posts: Vec<PostSummary> = page.posts.iter().map(PostSummary::from).collect();

    Ok(Json(json!({ "posts": posts })))
}

/// `GET /api/post/{id}` with the body rendered to sanitised HTML.
/// Only the caller's own posts are reachable, administrators included.
pub async fn get_post(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let Some(post) = find_visible_post(&state, &user, &raw_id, Surface::Api).await? else {
        return Err(AppError::not_found("Post Not Found"));
    };

    Ok(Json(json!({ "post": PublishedPost::from(&post) })))
}
