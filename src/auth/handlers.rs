use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{
        normalize_email, AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse,
        LoginRequest, PublicUser, RegisterRequest, ResetPasswordRequest, ValidResetToken,
    },
    extractors::CurrentUser,
    password,
    reset::{self, RawResetToken},
    services::{auth_response, request_password_reset},
};
use crate::{
    error::AppError,
    extract::Json,
    state::AppState,
    users::repo_types::NewUser,
    validation::{non_empty, present, Validator},
};

const MIN_PASSWORD_CHARS: usize = 6;
const MAX_NAME_CHARS: usize = 60;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/validate-reset-token/:token", get(validate_reset_token))
        .route("/auth/reset-password/:token", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (Some(name), Some(email), Some(plain)) = (
        present(&payload.name),
        present(&payload.email),
        non_empty(&payload.password),
    ) else {
        return Err(AppError::bad_request("All fields are required"));
    };
    let name = name.trim();
    let email = normalize_email(email);

    Validator::new()
        .max_chars("name", name, MAX_NAME_CHARS, "Name cannot exceed 60 characters")
        .email("email", &email)
        .min_chars(
            "password",
            plain,
            MIN_PASSWORD_CHARS,
            "Password must be at least 6 characters",
        )
        .finish()?;

    // Ensure email is not taken; the unique constraint still guards the race.
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            email,
            password: password::hash(plain).await?,
        })
        .await?;
    info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let (Some(email), Some(plain)) = (
        present(&payload.email),
        non_empty(&payload.password),
    ) else {
        return Err(AppError::bad_request("Email and password are required"));
    };
    let email = normalize_email(email);

    let invalid = || AppError::Unauthenticated("Invalid email or password");
    let (user, hash) = state
        .users
        .find_credentials_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(plain, &hash).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(&state, user)?))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let email = present(&payload.email)
        .map(normalize_email)
        .ok_or_else(|| AppError::bad_request("Email is required"))?;

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::NotFound("No account with that email address exists."))?;

    let url = request_password_reset(&state, &user).await?;

    Ok(Json(ForgotPasswordResponse {
        message: "If that email exists, a reset link has been sent.",
        reset_url: state.config.expose_reset_url().then_some(url),
    }))
}

#[instrument(skip(state, token))]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ValidResetToken>, AppError> {
    let raw = RawResetToken::from_presented(token);
    reset::validate(state.users.as_ref(), &raw, OffsetDateTime::now_utc())
        .await?
        .ok_or_else(|| AppError::bad_request("Password reset token is invalid or has expired."))?;
    Ok(Json(ValidResetToken { valid: true }))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let plain = payload
        .password
        .as_deref()
        .filter(|p| p.chars().count() >= MIN_PASSWORD_CHARS)
        .ok_or_else(|| AppError::bad_request("Password must be at least 6 characters"))?;

    let invalid = || AppError::bad_request("Token is invalid or has expired");
    let raw = RawResetToken::from_presented(token);
    let now = OffsetDateTime::now_utc();
    let user = reset::validate(state.users.as_ref(), &raw, now)
        .await?
        .ok_or_else(invalid)?;

    if !reset::consume(state.users.as_ref(), &user, &raw, now, plain).await? {
        return Err(invalid());
    }
    Ok(Json(auth_response(&state, user)?))
}
