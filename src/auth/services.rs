use time::OffsetDateTime;
use tracing::{error, instrument};

use super::{
    dto::{AuthResponse, PublicUser},
    reset,
};
use crate::{error::AppError, state::AppState, users::repo_types::User};

pub(crate) fn auth_response(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let token = state.jwt.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;
    Ok(AuthResponse {
        token,
        user: PublicUser::from(user),
    })
}

pub(crate) fn reset_url(client_url: &str, raw: &reset::RawResetToken) -> String {
    format!("{}/reset-password/{}", client_url, raw.as_str())
}

/// Issues a reset token, mails the link and returns it.
///
/// If delivery fails the freshly written token is revoked before the error is returned.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub(crate) async fn request_password_reset(
    state: &AppState,
    user: &User,
) -> Result<String, AppError> {
    let (raw, _expires_at) =
        reset::issue(state.users.as_ref(), user, OffsetDateTime::now_utc()).await?;
    let url = reset_url(&state.config.client_url, &raw);

    if let Err(e) = state.mailer.send_password_reset(&user.email, &url).await {
        error!(error = ?e, "reset email delivery failed");
        reset::revoke(state.users.as_ref(), user.id).await?;
        return Err(AppError::DeliveryFailure("Failed to send reset email"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_embeds_raw_token_as_path_segment() {
        let raw = reset::RawResetToken::from_presented("deadbeef");
        assert_eq!(
            reset_url("http://localhost:5173", &raw),
            "http://localhost:5173/reset-password/deadbeef"
        );
    }
}
