use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::AuthorSummary;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub body: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub body: String,
    pub author: AuthorSummary,
    pub post: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorSummary) -> Self {
        Self {
            id: comment.id,
            body: comment.body,
            author,
            post: comment.post_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct CommentViewRow {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_avatar: String,
}

impl From<CommentViewRow> for CommentView {
    fn from(row: CommentViewRow) -> Self {
        let author = AuthorSummary {
            id: row.comment.author_id,
            name: row.author_name,
            avatar: row.author_avatar,
        };
        CommentView::new(row.comment, author)
    }
}
