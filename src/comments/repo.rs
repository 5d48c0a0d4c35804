use async_trait::async_trait;
use uuid::Uuid;

use super::repo_types::{Comment, CommentView, CommentViewRow, NewComment};
use crate::db::{PgStore, StoreError};

#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    async fn create(&self, new_comment: NewComment) -> Result<CommentView, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

macro_rules! comment_view_columns {
    () => {
        "c.id, c.body, c.author_id, c.post_id, c.created_at, c.updated_at, \
         u.name AS author_name, u.avatar AS author_avatar"
    };
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, StoreError> {
        let rows = sqlx::query_as::<_, CommentViewRow>(concat!(
            "SELECT ",
            comment_view_columns!(),
            r#"
              FROM comments c
              JOIN users u ON u.id = c.author_id
             WHERE c.post_id = $1
             ORDER BY c.created_at ASC
            "#
        ))
        .bind(post_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(CommentView::from).collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, body, author_id, post_id, created_at, updated_at
              FROM comments
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(comment)
    }

    async fn create(&self, new_comment: NewComment) -> Result<CommentView, StoreError> {
        let row = sqlx::query_as::<_, CommentViewRow>(concat!(
            r#"
            WITH c AS (
                INSERT INTO comments (id, body, author_id, post_id)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT "#,
            comment_view_columns!(),
            " FROM c JOIN users u ON u.id = c.author_id"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_comment.body)
        .bind(new_comment.author_id)
        .bind(new_comment.post_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM comments WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
