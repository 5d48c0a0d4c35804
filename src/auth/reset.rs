//! Password-reset tokens.
//!
//! A reset token lives in two forms. [`RawResetToken`] is the secret handed to
//! the requester and never persisted; [`ResetDigest`] is its SHA-256 digest,
//! the only form the store ever sees. Conversion goes one way: raw to digest.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use super::password;
use crate::{db::StoreError, error::AppError, users::repo::UserRepo, users::repo_types::User};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);
const RAW_TOKEN_BYTES: usize = 32;

pub struct RawResetToken(String);

impl RawResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; RAW_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a token presented by a client, e.g. from a reset link.
    pub fn from_presented(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> ResetDigest {
        ResetDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }
}

impl fmt::Debug for RawResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawResetToken(..)")
    }
}

/// Hex-encoded SHA-256 of a raw reset token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResetDigest(String);

impl ResetDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues a fresh token for `user`, superseding any earlier one.
///
/// Returns the raw token and its absolute expiry.
pub async fn issue(
    users: &dyn UserRepo,
    user: &User,
    now: OffsetDateTime,
) -> Result<(RawResetToken, OffsetDateTime), StoreError> {
    let raw = RawResetToken::generate();
    let expires_at = now + RESET_TOKEN_TTL;
    users
        .set_reset_token(user.id, &raw.digest(), expires_at)
        .await?;
    info!(user_id = %user.id, %expires_at, "password reset token issued");
    Ok((raw, expires_at))
}

/// Returns the owner of a live token. Unknown and expired tokens are indistinguishable.
pub async fn validate(
    users: &dyn UserRepo,
    raw: &RawResetToken,
    now: OffsetDateTime,
) -> Result<Option<User>, StoreError> {
    let user = users.find_by_reset_digest(&raw.digest(), now).await?;
    if user.is_none() {
        debug!("reset token did not match a live digest");
    }
    Ok(user)
}

/// Sets the new password and clears the token in one write.
///
/// Returns `false` when `raw` stopped being the live token of `user` since it was
/// validated (already consumed, superseded or expired); nothing is written then.
pub async fn consume(
    users: &dyn UserRepo,
    user: &User,
    raw: &RawResetToken,
    now: OffsetDateTime,
    new_password: &str,
) -> Result<bool, AppError> {
    let hash = password::hash(new_password).await?;
    let applied = users
        .reset_password(user.id, &raw.digest(), now, &hash)
        .await?;
    if applied {
        info!(user_id = %user.id, "password reset token consumed");
    } else {
        debug!(user_id = %user.id, "reset token no longer live at consume");
    }
    Ok(applied)
}

/// Clears a token whose delivery failed so it can never validate.
pub async fn revoke(users: &dyn UserRepo, user_id: Uuid) -> Result<(), StoreError> {
    users.clear_reset_token(user_id).await?;
    info!(user_id = %user_id, "password reset token revoked");
    Ok(())
}
