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

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub author_id: i64,
    /// Username of the author at creation time
    pub author_name: String,
    pub title: String,
    /// Markdown source
    pub body: String,
    pub posted_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    /// Username of the last editor, empty if the post was never edited
    pub last_updated_by: String,
}

impl Post {
    pub fn new(author: &User, title: String, body: String) -> Result<Self> {
        let author_id = author
            .id
            .ok_or_else(|| anyhow!("Post author must be a saved user"))?;

        Ok(Self {
            id: None,
            author_id,
            author_name: author.username.clone(),
            title,
            body,
            posted_on: Utc::now(),
            updated_on: None,
            last_updated_by: String::new(),
        })
    }

    pub fn apply_edit(&mut self, title: String, body: String, editor: &str, now: DateTime<Utc>) {
        self.title = title;
        self.body = body;
        self.updated_on = Some(now);
        self.last_updated_by = editor.to_string();
    }
}
