use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::AuthorSummary;

/// Post record in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub body: String,
    pub author_id: Uuid,
}

/// Post with its author populated, as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub body: String,
    pub author: AuthorSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PostView {
    pub fn new(post: Post, author: AuthorSummary) -> Self {
        Self {
            id: post.id,
            title: post.title,
            description: post.description,
            body: post.body,
            author,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Joined row: post columns plus the author's name and avatar.
#[derive(Debug, FromRow)]
pub struct PostViewRow {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_name: String,
    pub author_avatar: String,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let author = AuthorSummary {
            id: row.post.author_id,
            name: row.author_name,
            avatar: row.author_avatar,
        };
        PostView::new(row.post, author)
    }
}

/// Entry of the post list on a profile page.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostTitle {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
