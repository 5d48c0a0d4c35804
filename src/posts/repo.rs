use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{NewPost, Post, PostTitle, PostView, PostViewRow};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Newest first, with the total number of posts.
    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<PostView>, i64), StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, StoreError>;
    async fn create(&self, new_post: NewPost) -> Result<PostView, StoreError>;
    /// Persists title, description and body of `post`.
    async fn save(&self, post: &Post) -> Result<Option<PostView>, StoreError>;
    /// Removes the post and every comment on it.
    async fn delete_with_comments(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list_titles_by_author(&self, author_id: Uuid) -> Result<Vec<PostTitle>, StoreError>;
}

macro_rules! post_view_columns {
    () => {
        "p.id, p.title, p.description, p.body, p.author_id, p.created_at, p.updated_at, \
         u.name AS author_name, u.avatar AS author_avatar"
    };
}

#[async_trait]
impl PostRepo for PgStore {
    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<PostView>, i64), StoreError> {
        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM posts"#)
            .fetch_one(&self.db)
            .await?;
        let rows = sqlx::query_as::<_, PostViewRow>(concat!(
            "SELECT ",
            post_view_columns!(),
            r#"
              FROM posts p
              JOIN users u ON u.id = p.author_id
             ORDER BY p.created_at DESC
             LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok((rows.into_iter().map(PostView::from).collect(), total))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, body, author_id, created_at, updated_at
              FROM posts
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(post)
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, StoreError> {
        let row = sqlx::query_as::<_, PostViewRow>(concat!(
            "SELECT ",
            post_view_columns!(),
            " FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(PostView::from))
    }

    async fn create(&self, new_post: NewPost) -> Result<PostView, StoreError> {
        let row = sqlx::query_as::<_, PostViewRow>(concat!(
            r#"
            WITH p AS (
                INSERT INTO posts (id, title, description, body, author_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT "#,
            post_view_columns!(),
            " FROM p JOIN users u ON u.id = p.author_id"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_post.title)
        .bind(&new_post.description)
        .bind(&new_post.body)
        .bind(new_post.author_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn save(&self, post: &Post) -> Result<Option<PostView>, StoreError> {
        let row = sqlx::query_as::<_, PostViewRow>(concat!(
            r#"
            WITH p AS (
                UPDATE posts
                   SET title = $2, description = $3, body = $4, updated_at = now()
                 WHERE id = $1
                RETURNING *
            )
            SELECT "#,
            post_view_columns!(),
            " FROM p JOIN users u ON u.id = p.author_id"
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.body)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(PostView::from))
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        sqlx::query(r#"DELETE FROM comments WHERE post_id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_titles_by_author(&self, author_id: Uuid) -> Result<Vec<PostTitle>, StoreError> {
        let rows = sqlx::query_as::<_, PostTitle>(
            r#"
            SELECT id, title, created_at
              FROM posts
             WHERE author_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
