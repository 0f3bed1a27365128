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

use anyhow::{Context, Result};
use quill_core::models::post::Post;
use quill_core::policy::PostScope;
use sqlx::SqlitePool;

use crate::timestamps::{parse_optional_timestamp, parse_timestamp};

/// Posts shown per listing page
pub const PAGE_SIZE: i64 = 20;

type PostRow = (i64, i64, String, String, String, String, Option<String>, String);

const POST_COLUMNS: &str =
    "id, author_id, author_name, title, body, posted_on, updated_on, last_updated_by";

fn post_from_row(row: PostRow) -> Result<Post> {
    let (id, author_id, author_name, title, body, posted_on_str, updated_on_str, last_updated_by) =
        row;

    Ok(Post {
        id: Some(id),
        author_id,
        author_name,
        title,
        body,
        posted_on: parse_timestamp(&posted_on_str, "posted_on")?,
        updated_on: parse_optional_timestamp(updated_on_str, "updated_on")?,
        last_updated_by,
    })
}

/// One page of an author's posts, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: i64,
    pub is_first_page: bool,
    pub is_last_page: bool,
}

pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, post: &Post) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (author_id, author_name, title, body, posted_on, updated_on, last_updated_by)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.author_id)
        .bind(&post.author_name)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.posted_on)
        .bind(post.updated_on)
        .bind(&post.last_updated_by)
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find post by id")?;

        row.map(post_from_row).transpose()
    }

    /// Find a post only if it belongs to the given author
    pub async fn find_for_author(&self, id: i64, author_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = ? AND author_id = ?",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find post for author")?;

        row.map(post_from_row).transpose()
    }

    pub async fn find_in_scope(&self, id: i64, scope: PostScope) -> Result<Option<Post>> {
        match scope {
            PostScope::Any => self.find_by_id(id).await,
            PostScope::OwnedBy(author_id) => self.find_for_author(id, author_id).await,
        }
    }

    /// List an author's posts by the name recorded at posting time.
    ///
    /// One row beyond the page size is fetched to tell whether a further
    /// page exists. Pages below 1 are treated as the first page.
    pub async fn list_by_author_name(&self, author_name: &str, page: i64) -> Result<PostPage> {
        let page = page.max(1);
        let offset = (page - 1) * PAGE_SIZE;

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE author_name = ? ORDER BY posted_on DESC, id DESC LIMIT ? OFFSET ?",
            POST_COLUMNS
        ))
        .bind(author_name)
        .bind(PAGE_SIZE + 1)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts by author")?;

        let has_more = rows.len() as i64 > PAGE_SIZE;
        let posts = rows
            .into_iter()
            .take(PAGE_SIZE as usize)
            .map(post_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(PostPage {
            posts,
            page,
            is_first_page: page == 1,
            is_last_page: !has_more,
        })
    }

    pub async fn update(&self, post: &Post) -> Result<()> {
        let id = post
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot update post without ID"))?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, body = ?, updated_on = ?, last_updated_by = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.updated_on)
        .bind(&post.last_updated_by)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?
        .rows_affected();

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Post with id {} not found", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?
            .rows_affected();

        if rows_affected == 0 {
            return Err(anyhow::anyhow!("Post with id {} not found", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_memory_database;
    use crate::repositories::UserRepository;
    use chrono::{Duration, Utc};
    use quill_core::models::user::User;
    use quill_core::SecretCipher;

    async fn setup() -> Result<(PostRepository, User)> {
        let pool = init_memory_database().await?;
        let cipher = SecretCipher::new(&[3u8; 32])?;
        let mut author = User::new("author1".to_string(), "Passw0rd!", false, &cipher)?;
        author.id = Some(UserRepository::new(pool.clone()).create(&author).await?);
        Ok((PostRepository::new(pool), author))
    }

    fn post_for(author: &User, n: i64) -> Post {
        let mut post = Post::new(
            author,
            format!("Post number {}", n),
            "A body that is long enough to pass".to_string(),
        )
        .unwrap();
        post.posted_on = Utc::now() - Duration::minutes(100 - n);
        post
    }

    #[tokio::test]
    async fn test_create_and_find_post() -> Result<()> {
        let (repo, author) = setup().await?;

        let id = repo.create(&post_for(&author, 1)).await?;
        let post = repo.find_by_id(id).await?.expect("post should exist");

        assert_eq!(post.id, Some(id));
        assert_eq!(post.title, "Post number 1");
        assert_eq!(post.author_name, "author1");
        assert!(post.updated_on.is_none());
        assert_eq!(post.last_updated_by, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_find_for_author() -> Result<()> {
        let (repo, author) = setup().await?;
        let author_id = author.id.unwrap();

        let id = repo.create(&post_for(&author, 1)).await?;

        assert!(repo.find_for_author(id, author_id).await?.is_some());
        assert!(repo.find_for_author(id, author_id + 1).await?.is_none());
        assert!(repo.find_in_scope(id, PostScope::Any).await?.is_some());
        assert!(repo
            .find_in_scope(id, PostScope::OwnedBy(author_id + 1))
            .await?
            .is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_post() -> Result<()> {
        let (repo, author) = setup().await?;

        let id = repo.create(&post_for(&author, 1)).await?;
        let mut post = repo.find_by_id(id).await?.expect("post");
        post.apply_edit(
            "Edited title".to_string(),
            "Edited body that is long enough".to_string(),
            "admin1",
            Utc::now(),
        );
        repo.update(&post).await?;

        let reloaded = repo.find_by_id(id).await?.expect("post");
        assert_eq!(reloaded.title, "Edited title");
        assert_eq!(reloaded.last_updated_by, "admin1");
        assert!(reloaded.updated_on.is_some());
        assert_eq!(reloaded.author_name, "author1");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_post() -> Result<()> {
        let (repo, author) = setup().await?;

        let id = repo.create(&post_for(&author, 1)).await?;
        repo.delete(id).await?;

        assert!(repo.find_by_id(id).await?.is_none());
        assert!(repo.delete(id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_pages() -> Result<()> {
        let (repo, author) = setup().await?;

        for n in 1..=25 {
            repo.create(&post_for(&author, n)).await?;
        }

        let first = repo.list_by_author_name("author1", 1).await?;
        assert_eq!(first.posts.len(), 20);
        assert!(first.is_first_page);
        assert!(!first.is_last_page);
        // Newest first
        assert_eq!(first.posts[0].title, "Post number 25");

        let second = repo.list_by_author_name("author1", 2).await?;
        assert_eq!(second.posts.len(), 5);
        assert!(!second.is_first_page);
        assert!(second.is_last_page);
        assert_eq!(second.posts[4].title, "Post number 1");
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_exact_page_is_last() -> Result<()> {
        let (repo, author) = setup().await?;

        for n in 1..=20 {
            repo.create(&post_for(&author, n)).await?;
        }

        let page = repo.list_by_author_name("author1", 1).await?;
        assert_eq!(page.posts.len(), 20);
        assert!(page.is_last_page);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_clamps_page() -> Result<()> {
        let (repo, author) = setup().await?;
        repo.create(&post_for(&author, 1)).await?;

        let page = repo.list_by_author_name("author1", -3).await?;
        assert_eq!(page.page, 1);
        assert_eq!(page.posts.len(), 1);
        assert!(page.is_first_page);
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_unknown_author_is_empty() -> Result<()> {
        let (repo, author) = setup().await?;
        repo.create(&post_for(&author, 1)).await?;

        let page = repo.list_by_author_name("someone", 1).await?;
        assert!(page.posts.is_empty());
        assert!(page.is_first_page);
        assert!(page.is_last_page);
        Ok(())
    }

    #[tokio::test]
    async fn test_posts_survive_author_deletion() -> Result<()> {
        let pool = init_memory_database().await?;
        let users = UserRepository::new(pool.clone());
        let posts = PostRepository::new(pool);
        let cipher = SecretCipher::new(&[3u8; 32])?;

        let mut author = User::new("author1".to_string(), "Passw0rd!", false, &cipher)?;
        let author_id = users.create(&author).await?;
        author.id = Some(author_id);
        let post_id = posts.create(&post_for(&author, 1)).await?;

        users.delete(author_id).await?;

        assert!(posts.find_by_id(post_id).await?.is_some());
        Ok(())
    }
}
