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

//! Serialisable shapes of posts and users shared by pages and the API.

use quill_core::models::{post::Post, user::User};
use quill_core::utils::{format_optional_timestamp, format_timestamp};
use serde::Serialize;

use crate::markdown::markdown_to_html;
use crate::safe_html::strip_html;

/// One row of a post listing
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub posted_on: String,
    /// Empty when the post was never edited
    pub updated_on: String,
    pub updated_by: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.unwrap_or_default(),
            title: post.title.clone(),
            author: post.author_name.clone(),
            posted_on: format_timestamp(&post.posted_on),
            updated_on: format_optional_timestamp(post.updated_on.as_ref()),
            updated_by: post.last_updated_by.clone(),
        }
    }
}

/// A single post as served by the API: plain-text title and sanitised HTML
/// body rendered from Markdown
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPost {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub last_updated_by: String,
    pub posted_on: String,
    pub updated_on: String,
    pub body: String,
}

impl From<&Post> for PublishedPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.unwrap_or_default(),
            title: strip_html(&post.title),
            author: post.author_name.clone(),
            last_updated_by: post.last_updated_by.clone(),
            posted_on: format_timestamp(&post.posted_on),
            updated_on: format_optional_timestamp(post.updated_on.as_ref()),
            body: markdown_to_html(&post.body),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            name: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}
