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

use anyhow::Context as _;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use quill_core::models::{post::Post, user::User};
use quill_core::policy::{listing_username, PostScope};
use quill_core::validation::validate_blog_post;
use quill_db::repositories::{PostPage, PostRepository};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::CurrentUser,
    endpoint::Surface,
    error::AppError,
    template_context::{base_context, render_page},
    views::PostSummary,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Query string of post listings, shared with the API
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub username: Option<String>,
    pub page: Option<String>,
}

impl ListPostsQuery {
    /// Requested page, 1 when missing or unparseable
    pub fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|page| page.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

fn parse_post_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Load the page of posts the actor asked for, returning whose posts they are
pub(crate) async fn load_listing(
    state: &AppState,
    actor: &User,
    query: &ListPostsQuery,
) -> anyhow::Result<(String, PostPage)> {
    let username = listing_username(&actor.actor(), query.username.as_deref());
    let page = PostRepository::new(state.db.clone())
        .list_by_author_name(&username, query.page_number())
        .await?;

    Ok((username, page))
}

/// Posts an actor may reach on a surface.
///
/// Administrators reach every post from the pages only; API callers are
/// always limited to their own posts.
pub(crate) fn post_scope(actor: &User, surface: Surface) -> PostScope {
    let actor = actor.actor();
    match surface {
        Surface::Page => PostScope::for_actor(&actor),
        Surface::Api => PostScope::OwnedBy(actor.id),
    }
}

/// Find a post by its raw path id, limited to what the actor may see
pub(crate) async fn find_visible_post(
    state: &AppState,
    actor: &User,
    raw_id: &str,
    surface: Surface,
) -> anyhow::Result<Option<Post>> {
    let Some(id) = parse_post_id(raw_id) else {
        return Ok(None);
    };

    PostRepository::new(state.db.clone())
        .find_in_scope(id, post_scope(actor, surface))
        .await
}

pub async fn create_post_form(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Html<String>, AppError> {
    render_page(&state, "post-editor", &base_context(Some(&user)))
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = validate_blog_post(&form.title, &form.body) {
        return Err(
            AppError::bad_request("There were issues validating your submission")
                .on_page("post-editor")
                .with_validation_errors(errors)
                .with_form_value("title", &form.title)
                .with_form_value("body", &form.body),
        );
    }

    let post = Post::new(&user, form.title, form.body)?;
    let id = PostRepository::new(state.db.clone()).create(&post).await?;

    tracing::info!(post_id = id, author = %user.username, "Post created");

    Ok(Redirect::to("/").into_response())
}

pub async fn list_posts(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<Html<String>, AppError> {
    let (username, page) = load_listing(&state, &user, &query).await?;
    let posts: Vec<PostSummary> = page.posts.iter().map(PostSummary::from).collect();

    let mut context = base_context(Some(&user));
    context.insert("username", &username);
    context.insert("posts", &posts);
    context.insert("page", &page.page);
    context.insert("first_page", &page.is_first_page);
    context.insert("last_page", &page.is_last_page);

    render_page(&state, "list-posts", &context)
}

/// Open a post in the editor
pub async fn fetch_post(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let Some(post) = find_visible_post(&state, &user, &raw_id, Surface::Page).await? else {
        return Err(AppError::not_found("Post Not Found").on_page("dashboard"));
    };

    let mut context = base_context(Some(&user));
    context.insert(
        "form",
        &json!({
            "id": post.id,
            "title": post.title,
            "body": post.body,
        }),
    );
    context.insert("post", &PostSummary::from(&post));

    render_page(&state, "post-editor", &context)
}

pub async fn edit_post(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(raw_id): Path<String>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let rejected = |err: AppError| {
        err.on_page("post-editor")
            .with_form_value("id", &raw_id)
            .with_form_value("title", &form.title)
            .with_form_value("body", &form.body)
    };

    if let Err(errors) = validate_blog_post(&form.title, &form.body) {
        return Err(rejected(AppError::bad_request(
            "There were issues validating your edits",
        ))
        .with_validation_errors(errors));
    }

    let Some(mut post) = find_visible_post(&state, &user, &raw_id, Surface::Page).await? else {
        return Err(rejected(AppError::not_found("Post not found.")));
    };

    post.apply_edit(
        form.title.clone(),
        form.body.clone(),
        &user.username,
        chrono::Utc::now(),
    );
    PostRepository::new(state.db.clone()).update(&post).await?;

    tracing::info!(post_id = ?post.id, editor = %user.username, "Post updated");

    Ok(Redirect::to("/").into_response())
}

/// Delete a post, then show what is left of its author's listing
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let post = find_visible_post(&state, &user, &raw_id, Surface::Page).await?;
    let Some((post, id)) = post.and_then(|post| post.id.map(|id| (post, id))) else {
        return Err(AppError::not_found("Post not found.").on_page("dashboard"));
    };

    PostRepository::new(state.db.clone()).delete(id).await?;

    tracing::info!(post_id = id, deleted_by = %user.username, "Post deleted");

    let query = serde_urlencoded::to_string(&[("username", post.author_name.as_str())])
        .context("Failed to encode listing query")?;
    Ok(Redirect::to(&format!("/list-posts?{}", query)).into_response())
}
