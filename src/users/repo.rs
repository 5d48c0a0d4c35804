use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewUser, User};
use crate::{
    auth::{password::HashedPassword, reset::ResetDigest},
    db::{PgStore, StoreError},
};

/// Credential store. Default reads never carry the password hash or reset-token fields;
/// those are reachable only through the dedicated methods below.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, HashedPassword)>, StoreError>;
    async fn find_password_hash(&self, id: Uuid) -> Result<Option<HashedPassword>, StoreError>;
    /// Fails with `StoreError::Duplicate("email")` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Persists the editable profile fields of `user`.
    async fn save_profile(&self, user: &User) -> Result<Option<User>, StoreError>;
    async fn update_password(&self, id: Uuid, hash: &HashedPassword) -> Result<(), StoreError>;

    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;
    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError>;
    /// Finds the user holding `digest` whose expiry is strictly after `now`.
    async fn find_by_reset_digest(
        &self,
        digest: &ResetDigest,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError>;
    /// Stores a new password and clears the reset-token fields in one write, but only
    /// while `digest` is still the live token of user `id`. Returns whether it applied.
    async fn reset_password(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        now: OffsetDateTime,
        hash: &HashedPassword,
    ) -> Result<bool, StoreError>;
}

macro_rules! user_columns {
    () => {
        "id, name, email, firstname, lastname, age, gender, address, website, bio, avatar, \
         created_at, updated_at"
    };
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, HashedPassword)>, StoreError> {
        let row = sqlx::query_as::<_, CredentialRow>(concat!(
            "SELECT ",
            user_columns!(),
            ", password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| (r.user, HashedPassword::from_stored(r.password_hash))))
    }

    async fn find_password_hash(&self, id: Uuid) -> Result<Option<HashedPassword>, StoreError> {
        let hash: Option<String> =
            sqlx::query_scalar(r#"SELECT password_hash FROM users WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(hash.map(HashedPassword::from_stored))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING ",
            user_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(new_user.password.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn save_profile(&self, user: &User) -> Result<Option<User>, StoreError> {
        let saved = sqlx::query_as::<_, User>(concat!(
            r#"
            UPDATE users
               SET name = $2, firstname = $3, lastname = $4, age = $5, gender = $6,
                   address = $7, website = $8, bio = $9, avatar = $10, updated_at = now()
             WHERE id = $1
            RETURNING "#,
            user_columns!()
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.age)
        .bind(&user.gender)
        .bind(&user.address)
        .bind(&user.website)
        .bind(&user.bio)
        .bind(&user.avatar)
        .fetch_optional(&self.db)
        .await?;
        Ok(saved)
    }

    async fn update_password(&self, id: Uuid, hash: &HashedPassword) -> Result<(), StoreError> {
        sqlx::query(r#"UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1"#)
            .bind(id)
            .bind(hash.as_str())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token_digest = $2, reset_token_expires_at = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(digest.as_str())
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
               SET reset_token_digest = NULL, reset_token_expires_at = NULL
             WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_by_reset_digest(
        &self,
        digest: &ResetDigest,
        now: OffsetDateTime,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE reset_token_digest = $1 AND reset_token_expires_at > $2"
        ))
        .bind(digest.as_str())
        .bind(now)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn reset_password(
        &self,
        id: Uuid,
        digest: &ResetDigest,
        now: OffsetDateTime,
        hash: &HashedPassword,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2,
                   reset_token_digest = NULL,
                   reset_token_expires_at = NULL,
                   updated_at = now()
             WHERE id = $1
               AND reset_token_digest = $3
               AND reset_token_expires_at > $4
            "#,
        )
        .bind(id)
        .bind(hash.as_str())
        .bind(digest.as_str())
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
