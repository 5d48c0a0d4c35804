//! In-process store used by tests and by local runs without `DATABASE_URL`.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{password::HashedPassword, reset::ResetDigest},
    comments::{
        repo::CommentRepo,
        repo_types::{Comment, CommentView, NewComment},
    },
    db::StoreError,
    posts::{
        repo::PostRepo,
        repo_types::{NewPost, Post, PostTitle, PostView},
    },
    users::{
        repo::UserRepo,
        repo_types::{AuthorSummary, NewUser, User},
    },
};

struct UserRecord {
    user: User,
    password: HashedPassword,
    reset: Option<(ResetDigest, OffsetDateTime)>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Inner {
    fn author(&self, id: Uuid) -> Result<AuthorSummary, StoreError> {
        self.users
            .get(&id)
            .map(|r| AuthorSummary::from(&r.user))
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("dangling author reference {id}")))
    }

    fn post_view(&self, post: &Post) -> Result<PostView, StoreError> {
        Ok(PostView::new(post.clone(), self.author(post.author_id)?))
    }

    fn comment_view(&self, comment: &Comment) -> Result<CommentView, StoreError> {
        Ok(CommentView::new(comment.clone(), self.author(comment.author_id)?))
    }

    fn record_mut(&mut self, id: Uuid) -> Option<&mut UserRecord> {
        self.users.get_mut(&id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|r| r.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, HashedPassword)>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| (r.user.clone(), r.password.clone())))
    }

    async fn find_password_hash(&self, id: Uuid) -> Result<Option<HashedPassword>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|r| r.password.clone()))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|r| r.user.email == new_user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            firstname: String::new(),
            lastname: String::new(),
            age: String::new(),
            gender: String::new(),
            address: String::new(),
            website: String::new(),
            bio: String::new(),
            avatar: String::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password: new_user.password,
                reset: None,
            },
        );
        Ok(user)
    }

    async fn save_profile(&self, user: &User) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.record_mut(user.id) else {
            return Ok(None);
        };
        let stored = &mut record.user;
        stored.name = user.name.clone();
        stored.firstname = user.firstname.clone();
        stored.lastname = user.lastname.clone();
        stored.age = user.age.clone();
        stored.gender = user.gender.clone();
        stored.address = user.address.clone();
        stored.website = user.website.clone();
        stored.bio = user.bio.clone();
        stored.avatar = user.avatar.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn update_password(&self, id: Uuid, hash: &HashedPassword) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.record_mut(id) {
            record.password = hash.clone();
            record.user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.record_mut(id) {
            record.reset = Some((digest.clone(), expires_at));
        }
        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.record_mut(id) {
            record.reset = None;
        }
        Ok(())
    }

    async fn find_by_reset_digest(
        &self,
        digest: &ResetDigest,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|r| matches!(&r.reset, Some((d, exp)) if d == digest && *exp > now))
            .map(|r| r.user.clone()))
    }

    async fn reset_password(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        now: OffsetDateTime,
        hash: &HashedPassword,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.record_mut(id) else {
            return Ok(false);
        };
        if !matches!(&record.reset, Some((d, exp)) if d == digest && *exp > now) {
            return Ok(false);
        }
        record.password = hash.clone();
        record.reset = None;
        record.user.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<PostView>, i64), StoreError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<&Post> = inner.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let page = posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|p| inner.post_view(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((page, inner.posts.len() as i64))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).cloned())
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, StoreError> {
        let inner = self.inner.read().await;
        inner.posts.get(&id).map(|p| inner.post_view(p)).transpose()
    }

    async fn create(&self, new_post: NewPost) -> Result<PostView, StoreError> {
        let mut inner = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title,
            description: new_post.description,
            body: new_post.body,
            author_id: new_post.author_id,
            created_at: now,
            updated_at: now,
        };
        let view = inner.post_view(&post)?;
        inner.posts.insert(post.id, post);
        Ok(view)
    }

    async fn save(&self, post: &Post) -> Result<Option<PostView>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.posts.get_mut(&post.id) else {
            return Ok(None);
        };
        stored.title = post.title.clone();
        stored.description = post.description.clone();
        stored.body = post.body.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        let stored = stored.clone();
        inner.post_view(&stored).map(Some)
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.comments.retain(|_, c| c.post_id != id);
        inner.posts.remove(&id);
        Ok(())
    }

    async fn list_titles_by_author(&self, author_id: Uuid) -> Result<Vec<PostTitle>, StoreError> {
        let inner = self.inner.read().await;
        let mut titles: Vec<PostTitle> = inner
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .map(|p| PostTitle {
                id: p.id,
                title: p.title.clone(),
                created_at: p.created_at,
            })
            .collect();
        titles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(titles)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, StoreError> {
        let inner = self.inner.read().await;
        let mut comments: Vec<&Comment> =
            inner.comments.values().filter(|c| c.post_id == post_id).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments.into_iter().map(|c| inner.comment_view(c)).collect()
    }

    async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.comments.get(&id).cloned())
    }

    async fn create(&self, new_comment: NewComment) -> Result<CommentView, StoreError> {
        let mut inner = self.inner.write().await;
        let now = OffsetDateTime::now_utc();
        let comment = Comment {
            id: Uuid::new_v4(),
            body: new_comment.body,
            author_id: new_comment.author_id,
            post_id: new_comment.post_id,
            created_at: now,
            updated_at: now,
        };
        let view = inner.comment_view(&comment)?;
        inner.comments.insert(comment.id, comment);
        Ok(view)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.comments.remove(&id);
        Ok(())
    }
}
